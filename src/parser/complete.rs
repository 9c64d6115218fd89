//! The complete-call shape: `NAME(ARGS) = RETVAL[ ERRCODE (MSG)][ <DUR>][ (annotation)]`.

use crate::record::Record;

use super::common::{match_parens, parse_return_value, parse_tail};

/// `rest` is the line with the timestamp already stripped. Returns `None`
/// for anything that isn't a complete call, including lines that should
/// be deferred to the unfinished branch.
pub fn try_complete<'a>(timestamp: &'a str, rest: &'a str) -> Option<Record<'a>> {
    if rest.contains("<unfinished ...>") {
        return None;
    }

    let paren = rest.find('(')?;
    let name = &rest[..paren];
    if name.is_empty() {
        return None;
    }

    let (args, after_args) = match_parens(&rest[paren + 1..])?;

    let after_eq = after_args.trim_start().strip_prefix('=')?;
    let (return_value, after_ret) = parse_return_value(after_eq.trim_start())?;

    let (error_code, error_message, duration_seconds) = parse_tail(after_ret, return_value)?;

    Some(Record::new_complete(
        timestamp,
        name,
        args,
        return_value,
        error_code,
        error_message,
        duration_seconds,
    ))
}
