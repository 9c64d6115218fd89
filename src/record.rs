//! The parsed-syscall value type.
//!
//! A [`Record`] borrows every string field from the line it was parsed out
//! of. It must be consumed (appended to the database) before the line
//! buffer it borrows from is overwritten — the lifetime parameter is the
//! compiler's enforcement of that single-line contract.

/// One decoded strace line.
///
/// `unfinished` and `resumed` are mutually exclusive; see the invariants
/// checked by [`Record::new_complete`], [`Record::new_unfinished`] and
/// [`Record::new_resumed`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record<'a> {
    pub timestamp: &'a str,
    pub syscall_name: &'a str,
    pub args: &'a str,
    pub return_value: Option<i64>,
    pub error_code: Option<&'a str>,
    pub error_message: Option<&'a str>,
    pub duration_seconds: Option<f64>,
    pub unfinished: bool,
    pub resumed: bool,
}

impl<'a> Record<'a> {
    /// Build a complete-call record, asserting the invariants that relate
    /// `return_value`, `error_code` and `error_message`.
    pub fn new_complete(
        timestamp: &'a str,
        syscall_name: &'a str,
        args: &'a str,
        return_value: Option<i64>,
        error_code: Option<&'a str>,
        error_message: Option<&'a str>,
        duration_seconds: Option<f64>,
    ) -> Self {
        debug_assert!(
            error_code.is_none() || matches!(return_value, Some(v) if v < 0),
            "error_code present implies a negative return_value"
        );
        debug_assert!(
            error_message.is_none() || error_code.is_some(),
            "error_message present implies error_code present"
        );
        Record {
            timestamp,
            syscall_name,
            args,
            return_value,
            error_code,
            error_message,
            duration_seconds,
            unfinished: false,
            resumed: false,
        }
    }

    /// Build an unfinished-call record. All numeric/error fields are absent.
    pub fn new_unfinished(timestamp: &'a str, syscall_name: &'a str, args: &'a str) -> Self {
        Record {
            timestamp,
            syscall_name,
            args,
            return_value: None,
            error_code: None,
            error_message: None,
            duration_seconds: None,
            unfinished: true,
            resumed: false,
        }
    }

    /// Build a resumed-call record, with the same field layout as a
    /// complete call but `resumed = true`.
    #[allow(clippy::too_many_arguments)]
    pub fn new_resumed(
        timestamp: &'a str,
        syscall_name: &'a str,
        args: &'a str,
        return_value: Option<i64>,
        error_code: Option<&'a str>,
        error_message: Option<&'a str>,
        duration_seconds: Option<f64>,
    ) -> Self {
        let mut r = Record::new_complete(
            timestamp,
            syscall_name,
            args,
            return_value,
            error_code,
            error_message,
            duration_seconds,
        );
        r.resumed = true;
        r
    }

    /// Check the invariants relating `unfinished`, `resumed`, `return_value`,
    /// `error_code` and `error_message` at runtime.
    ///
    /// `debug_assert!` in the constructors above catches these during
    /// development; this is the release-mode counterpart the line parser
    /// consults before handing a record back to its caller, so a
    /// structurally impossible record surfaces as [`crate::error::ParseError`]
    /// instead of silently reaching the database.
    pub fn invariant_violation(&self) -> Option<&'static str> {
        if self.unfinished && self.resumed {
            return Some("unfinished and resumed are mutually exclusive");
        }
        if self.unfinished
            && (self.return_value.is_some()
                || self.error_code.is_some()
                || self.error_message.is_some()
                || self.duration_seconds.is_some())
        {
            return Some("unfinished record carries return/error/duration fields");
        }
        if self.error_code.is_some() && !matches!(self.return_value, Some(v) if v < 0) {
            return Some("error_code present without a strictly negative return_value");
        }
        if self.error_message.is_some() && self.error_code.is_none() {
            return Some("error_message present without error_code");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_record_has_no_unfinished_or_resumed_flag() {
        let r = Record::new_complete("10:00:00.000001", "read", "3, buf, 4", Some(4), None, None, None);
        assert!(!r.unfinished);
        assert!(!r.resumed);
    }

    #[test]
    fn unfinished_record_has_no_return_fields() {
        let r = Record::new_unfinished("10:00:00.000001", "poll", "[{fd=8}], 2, -1 ");
        assert!(r.unfinished);
        assert!(!r.resumed);
        assert!(r.return_value.is_none());
        assert!(r.error_code.is_none());
        assert!(r.duration_seconds.is_none());
    }

    #[test]
    fn resumed_record_carries_return_fields() {
        let r = Record::new_resumed("10:00:00.000001", "read", "\"data\", 100", Some(4), None, None, Some(0.000042));
        assert!(r.resumed);
        assert!(!r.unfinished);
        assert_eq!(r.return_value, Some(4));
        assert_eq!(r.duration_seconds, Some(0.000042));
    }
}
