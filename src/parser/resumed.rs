//! The resumed-call shape: `<... NAME resumed>ARGS_TAIL) = RETVAL[ ERR (MSG)][ <D>]`.

use crate::record::Record;

use super::common::{match_parens, parse_return_value, parse_tail};

const RESUMED_MARKER: &str = " resumed>";

/// `rest` is the line with the timestamp already stripped.
pub fn try_resumed<'a>(timestamp: &'a str, rest: &'a str) -> Option<Record<'a>> {
    let after_prefix = rest.strip_prefix("<... ")?;
    let marker_pos = after_prefix.find(RESUMED_MARKER)?;
    let name = &after_prefix[..marker_pos];
    if name.is_empty() {
        return None;
    }
    let tail = &after_prefix[marker_pos + RESUMED_MARKER.len()..];

    let (args, after_args) = match_parens(tail)?;
    let after_eq = after_args.trim_start().strip_prefix('=')?;
    let (return_value, after_ret) = parse_return_value(after_eq.trim_start())?;
    let (error_code, error_message, duration_seconds) = parse_tail(after_ret, return_value)?;

    Some(Record::new_resumed(
        timestamp,
        name,
        args,
        return_value,
        error_code,
        error_message,
        duration_seconds,
    ))
}
