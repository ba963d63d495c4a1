//! Logging utilities for sanitizing player-supplied text so logs stay
//! single-line. Raw command text can contain control characters that would
//! otherwise break log readability.

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
///   Truncates very long strings (over `MAX_PREVIEW` chars) with an ellipsis
///   to cap log noise from paste-bombed commands.
pub fn escape_log(s: &str) -> String {
    const MAX_PREVIEW: usize = 200;
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_log;

    #[test]
    fn escapes_newlines_and_tabs() {
        let s = "go north\nsay hi\r\tend";
        assert_eq!(escape_log(s), "go north\\nsay hi\\r\\tend");
    }

    #[test]
    fn truncates_long_input() {
        let s = "x".repeat(500);
        let esc = escape_log(&s);
        assert!(esc.chars().count() <= 201);
        assert!(esc.ends_with('…'));
    }
}
