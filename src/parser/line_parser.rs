//! Top-level dispatch across the three recognised line shapes.
//!
//! Pattern order is significant: a complete call is tried first, then
//! unfinished, then resumed, each an early-exit on first match. The
//! timestamp is extracted exactly once per line regardless of which
//! branch eventually matches — historical variants of this parser
//! re-extracted it per branch, which this design deliberately avoids.

use super::{complete, resumed, timestamp, unfinished};
use crate::error::ParseError;
use crate::record::Record;

/// Recognise a single strace line.
///
/// Returns `Ok(None)` for blank lines, comments, or any text that doesn't
/// match one of the three known shapes. Malformed strace syntax (e.g. an
/// unparseable integer in a return-value position) is not an error either
/// — it also yields `Ok(None)` so the caller counts it as an unrecognised
/// line rather than a failure. `Err` is reserved for a record that matched
/// a shape but violates its own invariants, which should never happen
/// barring a bug in one of the branch parsers.
pub fn parse_line(line: &str) -> Result<Option<Record<'_>>, ParseError> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let Some((ts, rest)) = timestamp::extract_timestamp(line) else {
        return Ok(None);
    };

    let record = complete::try_complete(ts, rest)
        .or_else(|| unfinished::try_unfinished(ts, rest))
        .or_else(|| resumed::try_resumed(ts, rest));

    let Some(record) = record else {
        return Ok(None);
    };

    if let Some(reason) = record.invariant_violation() {
        return Err(ParseError::InvariantViolation(reason));
    }

    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_complete_call() {
        let r = parse_line("22:21:11.675122 set_robust_list(0x7fa8e531c4a0, 24) = 0 <0.000009>")
            .unwrap()
            .unwrap();
        assert_eq!(r.syscall_name, "set_robust_list");
        assert!(!r.unfinished && !r.resumed);
    }

    #[test]
    fn dispatches_unfinished_call() {
        let r = parse_line("22:21:24.927885 poll([{fd=8, events=POLLIN}], 2, -1 <unfinished ...>) = ?")
            .unwrap()
            .unwrap();
        assert!(r.unfinished);
    }

    #[test]
    fn dispatches_resumed_call() {
        let r = parse_line("10:23:45.123458 <... read resumed>\"data\", 100) = 4 <0.000042>")
            .unwrap()
            .unwrap();
        assert!(r.resumed);
        assert_eq!(r.return_value, Some(4));
    }

    #[test]
    fn blank_line_is_none() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   \t  ").unwrap().is_none());
    }

    #[test]
    fn garbage_line_without_timestamp_is_none() {
        assert!(parse_line("this is not a trace line").unwrap().is_none());
    }

    #[test]
    fn unrecognised_shape_after_timestamp_is_none() {
        assert!(parse_line("10:00:00.000000 not a syscall at all").unwrap().is_none());
    }

    #[test]
    fn malformed_integer_is_none_not_error() {
        assert!(parse_line("10:00:00.000000 foo(1) = notanumber").unwrap().is_none());
    }
}
