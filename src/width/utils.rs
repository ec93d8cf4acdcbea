use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Compute the display width of a string in terminal-style cells.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Clip `text` so its display width does not exceed `max_width`, appending an
/// ellipsis when anything was dropped.
pub fn clip_to_width(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut used = 0;
    let mut clipped = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        clipped.push(ch);
    }
    clipped.push('…');
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(clip_to_width("Deploy", 10), "Deploy");
    }

    #[test]
    fn long_text_gets_ellipsis() {
        assert_eq!(clip_to_width("Deploy pipeline", 7), "Deploy…");
        assert_eq!(display_width(&clip_to_width("Deploy pipeline", 7)), 7);
    }

    #[test]
    fn wide_chars_count_double() {
        assert_eq!(display_width("日本"), 4);
        assert_eq!(clip_to_width("日本語", 4), "日…");
    }
}
