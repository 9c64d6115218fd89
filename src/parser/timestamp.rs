//! Timestamp extraction, done once per line regardless of which of the
//! three call shapes eventually matches.

/// Find the timestamp at the start of a line and split it off.
///
/// The timestamp is everything up to the first space that is preceded, on
/// the line so far, by at least two `:` and one `.` — i.e. the first space
/// after something that looks like `HH:MM:SS.micros`. Returns
/// `(timestamp, rest)` with `rest` trimmed of leading whitespace.
pub fn extract_timestamp(line: &str) -> Option<(&str, &str)> {
    let bytes = line.as_bytes();
    let mut colons = 0u32;
    let mut dots = 0u32;

    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b':' => colons += 1,
            b'.' => dots += 1,
            b' ' if colons >= 2 && dots >= 1 => {
                let timestamp = &line[..i];
                let rest = line[i + 1..].trim_start();
                return Some((timestamp, rest));
            }
            _ => {}
        }
    }
    None
}
