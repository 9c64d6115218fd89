//! Derives a PID from a trace file's basename.
//!
//! strace is conventionally invoked with `-o trace.%p` (or similar),
//! producing filenames like `trace.12345`. We recover the PID from the
//! trailing `.<digits>` suffix so it can be persisted alongside every row
//! without requiring the caller to track it separately.

use std::path::Path;

/// Extract the trailing decimal suffix of a basename as a PID.
///
/// Returns `None` when there is no `.`, when the suffix is empty, or when
/// it contains anything other than ASCII digits (a leading `-` is also
/// rejected, even though `i32::from_str_radix` would accept it, since
/// strace never emits negative PIDs).
pub fn extract_pid(path: &Path) -> Option<i32> {
    let basename = path.file_name()?.to_str()?;
    let dot = basename.rfind('.')?;
    let suffix = &basename[dot + 1..];
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse::<i32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn simple_pid_suffix() {
        assert_eq!(extract_pid(Path::new("trace.12345")), Some(12345));
    }

    #[test]
    fn multiple_dots_uses_last_segment() {
        assert_eq!(extract_pid(Path::new("my.trace.file.99")), Some(99));
    }

    #[test]
    fn no_extension_is_absent() {
        assert_eq!(extract_pid(Path::new("noextension")), None);
    }

    #[test]
    fn trailing_dot_with_nothing_after_is_absent() {
        assert_eq!(extract_pid(Path::new("trace.")), None);
    }

    #[test]
    fn non_decimal_suffix_is_absent() {
        assert_eq!(extract_pid(Path::new("trace.abc")), None);
    }

    #[test]
    fn negative_looking_suffix_is_absent() {
        assert_eq!(extract_pid(Path::new("trace.-1")), None);
    }

    #[test]
    fn path_with_directories_uses_basename_only() {
        assert_eq!(extract_pid(Path::new("/var/log/traces/trace.42")), Some(42));
    }
}
