use snmp_monitor_model::{RawSnapshot, RawValue};

/// Parse a raw reading into a number.
///
/// Text is stripped of every character other than ASCII digits, `-` and `.`, after which the
/// longest numeric prefix is parsed. Missing, empty and unparsable input is unavailable, which is
/// an ordinary outcome rather than an error.
pub fn normalize(raw: Option<&RawValue>) -> Option<f64> {
    match raw? {
        RawValue::Number(n) => n.is_finite().then_some(*n),
        RawValue::Text(text) => parse_text(text),
    }
}

/// Normalized value of the reading at `key`.
pub fn number(snapshot: &RawSnapshot, key: &str) -> Option<f64> {
    normalize(snapshot.value(key))
}

fn parse_text(text: &str) -> Option<f64> {
    let cleaned = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '.')
        .collect::<String>();

    let prefix = numeric_prefix(&cleaned);
    if !prefix.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// `-?digits*(.digits*)?` at the start of `s`.
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    &s[..end]
}
