//! ANSI-aware width calculation and clipping.

use unicode_width::UnicodeWidthChar;

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Keep at most `width` display columns of `text`.
///
/// Escape sequences are dropped from clipped lines; a wide character that
/// would straddle the limit is left out.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }

    let clean = String::from_utf8_lossy(&strip_ansi_escapes::strip(text)).into_owned();
    let mut used = 0;
    let mut out = String::new();
    for ch in clean.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > width {
            break;
        }
        used += ch_width;
        out.push(ch);
    }
    out
}

/// Drop the first `columns` display columns of `text`, returning the rest and
/// the number of columns actually skipped.
pub fn skip_columns(text: &str, columns: usize) -> (String, usize) {
    if columns == 0 {
        return (text.to_string(), 0);
    }

    let clean = String::from_utf8_lossy(&strip_ansi_escapes::strip(text)).into_owned();
    let mut skipped = 0;
    let mut rest = clean.as_str();
    for (idx, ch) in clean.char_indices() {
        if skipped >= columns {
            rest = &clean[idx..];
            break;
        }
        skipped += ch.width().unwrap_or(0);
        rest = &clean[idx + ch.len_utf8()..];
    }
    (rest.to_string(), skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_ignores_escape_sequences() {
        assert_eq!(display_width("\x1b[1mbold\x1b[0m"), 4);
        assert_eq!(display_width("日本"), 4);
    }

    #[test]
    fn truncation_respects_wide_characters() {
        assert_eq!(truncate_to_width("hello world", 5), "hello");
        assert_eq!(truncate_to_width("日本語", 5), "日本");
        assert_eq!(truncate_to_width("short", 10), "short");
    }

    #[test]
    fn skipping_reports_columns_consumed() {
        assert_eq!(skip_columns("abcdef", 2), ("cdef".to_string(), 2));
        assert_eq!(skip_columns("日本語", 1), ("本語".to_string(), 2));
        assert_eq!(skip_columns("ab", 5), (String::new(), 2));
        assert_eq!(skip_columns("ab", 0), ("ab".to_string(), 0));
    }
}
