//! Low-level scanning primitives shared by the complete-call and
//! resumed-call branches: matching parentheses, the `= RETVAL` token, the
//! optional `ERRCODE (MSG)` trailer and the optional `<DURATION>` trailer.
//!
//! These are deliberately hand-rolled depth counters rather than a `nom`
//! grammar: strace arguments nest parentheses, braces and brackets to
//! arbitrary depth (`fstat`'s `{st_rdev=makedev(0x88, 0), ...}`,
//! `wait4`'s `[{WIFEXITED(s) && WEXITSTATUS(s) == 0}]`), and a depth
//! counter is the only correct way to find the matching close paren in a
//! single pass with no allocation.

/// Given the text immediately after an opening `(` (so paren depth starts
/// at 1), find the matching close paren and split the input there.
///
/// Returns `(inside, after)` where `inside` is everything up to (but not
/// including) the matching `)`, and `after` is everything following it.
/// Returns `None` if depth never returns to zero.
pub fn match_parens(input: &str) -> Option<(&str, &str)> {
    let mut depth = 1i32;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&input[..i], &input[i + c.len_utf8()..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the `= RETVAL` token. `input` must already have `=` and
/// surrounding whitespace stripped, i.e. start right at the token.
///
/// Returns `(value, rest)` where `rest` starts right after the token
/// (unstripped). Returns `None` only on a malformed numeric token — a
/// plain `?` always succeeds with `value = None`.
pub fn parse_return_value(input: &str) -> Option<(Option<i64>, &str)> {
    let end = input
        .find(|c: char| c == ' ' || c == '<')
        .unwrap_or(input.len());
    let token = &input[..end];
    let rest = &input[end..];

    if token == "?" {
        return Some((None, rest));
    }
    if let Some(hex) = token.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(|v| (Some(v), rest));
    }
    token.parse::<i64>().ok().map(|v| (Some(v), rest))
}

/// Parse the optional `ERRCODE (MSG)` trailer. Only called when the
/// return value is known to be strictly negative. `input` is the text
/// right after the return-value token (unstripped).
///
/// Returns `(error_code, error_message, rest)`. `error_code` is always
/// `Some` if any non-whitespace token was found; `error_message` is
/// `Some` only if a parenthesised message directly follows.
pub fn parse_error_trailer(input: &str) -> (Option<&str>, Option<&str>, &str) {
    let trimmed = input.trim_start();
    let consumed = input.len() - trimmed.len();

    let end = trimmed
        .find(char::is_whitespace)
        .unwrap_or(trimmed.len());
    if end == 0 {
        return (None, None, input);
    }
    let code = &trimmed[..end];
    let mut rest = &trimmed[end..];

    let after_code_trimmed = rest.trim_start();
    if let Some(paren_body) = after_code_trimmed.strip_prefix('(') {
        // Error messages do not nest; the first `)` closes it.
        if let Some(close) = paren_body.find(')') {
            let message = &paren_body[..close];
            rest = &paren_body[close + 1..];
            return (Some(code), Some(message), rest);
        }
    }

    let _ = consumed;
    (Some(code), None, rest)
}

/// Skip an optional trailing parenthesised annotation (e.g. `poll`'s
/// `([{fd=3, revents=POLLIN}])`) that strace appends after a non-negative
/// return value. The annotation is discarded; only the remaining input is
/// returned.
pub fn skip_annotation(input: &str) -> &str {
    let trimmed = input.trim_start();
    match trimmed.strip_prefix('(').and_then(match_parens) {
        Some((_, rest)) => rest,
        None => input,
    }
}

/// Parse the optional `<DURATION>` trailer. `input` is not required to be
/// pre-trimmed. Returns `None` if the input (after trimming) does not
/// start with `<`, or if the float inside fails to parse.
pub fn parse_duration(input: &str) -> Option<(f64, &str)> {
    let trimmed = input.trim_start();
    let body = trimmed.strip_prefix('<')?;
    let close = body.find('>')?;
    let value: f64 = body[..close].parse().ok()?;
    Some((value, &body[close + 1..]))
}

/// Parse the shared tail of the complete-call and resumed-call shapes:
/// the optional error trailer (only consulted for negative return
/// values), the optional non-negative annotation, and the optional
/// `<duration>`.
///
/// Returns `None` if a `<...>` duration marker is present but its
/// contents fail to parse as a float, making the whole line unrecognised
/// rather than merely durationless.
pub fn parse_tail<'a>(
    after_ret: &'a str,
    return_value: Option<i64>,
) -> Option<(Option<&'a str>, Option<&'a str>, Option<f64>)> {
    let mut error_code = None;
    let mut error_message = None;

    let r = if after_ret.trim_start().starts_with('<') {
        after_ret
    } else if matches!(return_value, Some(v) if v < 0) {
        let (code, msg, rest) = parse_error_trailer(after_ret);
        error_code = code;
        error_message = msg;
        rest
    } else {
        skip_annotation(after_ret)
    };

    let duration = if r.trim_start().starts_with('<') {
        Some(parse_duration(r)?.0)
    } else {
        None
    };

    Some((error_code, error_message, duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_nested_parens() {
        let (inside, after) = match_parens("3, {st_rdev=makedev(0x88, 0), ...}) = 0").unwrap();
        assert_eq!(inside, "3, {st_rdev=makedev(0x88, 0), ...}");
        assert_eq!(after, " = 0");
    }

    #[test]
    fn unmatched_parens_return_none() {
        assert!(match_parens("3, {incomplete").is_none());
    }

    #[test]
    fn return_value_hex() {
        let (v, rest) = parse_return_value("0x5602312ea000").unwrap();
        assert_eq!(v, Some(0x5602312ea000));
        assert_eq!(rest, "");
    }

    #[test]
    fn return_value_question_mark() {
        let (v, rest) = parse_return_value("? <0.01>").unwrap();
        assert_eq!(v, None);
        assert_eq!(rest, " <0.01>");
    }

    #[test]
    fn return_value_negative_decimal() {
        let (v, rest) = parse_return_value("-1 ENOENT (No such file or directory)").unwrap();
        assert_eq!(v, Some(-1));
        assert_eq!(rest, " ENOENT (No such file or directory)");
    }

    #[test]
    fn error_trailer_with_message() {
        let (code, msg, rest) = parse_error_trailer(" ENOENT (No such file or directory) <0.000006>");
        assert_eq!(code, Some("ENOENT"));
        assert_eq!(msg, Some("No such file or directory"));
        assert_eq!(rest, " <0.000006>");
    }

    #[test]
    fn duration_parses_and_splits() {
        let (d, rest) = parse_duration(" <0.000042>tail").unwrap();
        assert_eq!(d, 0.000042);
        assert_eq!(rest, "tail");
    }

    #[test]
    fn skip_annotation_drops_trailing_paren_group() {
        let rest = skip_annotation(" ([{fd=3, revents=POLLIN}]) <0.000100>");
        assert_eq!(rest, " <0.000100>");
    }
}
