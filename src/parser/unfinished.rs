//! The unfinished-call shape: `NAME(PARTIAL_ARGS <unfinished ...>[) = ?]`.

use crate::record::Record;

/// `rest` is the line with the timestamp already stripped.
pub fn try_unfinished<'a>(timestamp: &'a str, rest: &'a str) -> Option<Record<'a>> {
    let marker = rest.find("<unfinished ...>")?;

    let paren = rest.find('(')?;
    if paren >= marker {
        return None;
    }
    let name = &rest[..paren];
    if name.is_empty() {
        return None;
    }

    let args = &rest[paren + 1..marker];

    Some(Record::new_unfinished(timestamp, name, args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unfinished_poll() {
        let r = try_unfinished(
            "22:21:24.927885",
            "poll([{fd=8, events=POLLIN}], 2, -1 <unfinished ...>) = ?",
        )
        .unwrap();
        assert_eq!(r.syscall_name, "poll");
        assert!(r.unfinished);
        assert!(!r.resumed);
        assert_eq!(r.args, "[{fd=8, events=POLLIN}], 2, -1 ");
        assert_eq!(r.return_value, None);
        assert_eq!(r.duration_seconds, None);
    }

    #[test]
    fn parses_unfinished_clone3_without_trailing_close() {
        let r = try_unfinished(
            "12:59:24.000000",
            "clone3({flags=CLONE_VM|CLONE_VFORK, stack=0x7fc52c21f000}, 88 <unfinished ...>",
        )
        .unwrap();
        assert_eq!(r.syscall_name, "clone3");
        assert!(r.args.contains("CLONE_VM"));
    }

    #[test]
    fn missing_marker_returns_none() {
        assert!(try_unfinished("10:00:00.000000", "read(3, buf, 4) = 4").is_none());
    }
}
