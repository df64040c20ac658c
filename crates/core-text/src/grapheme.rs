//! Grapheme cluster utilities operating on a single line of text.

use crate::egc_width;
use unicode_segmentation::UnicodeSegmentation;

/// Iterate grapheme clusters in a line.
pub fn iter(line: &str) -> impl Iterator<Item = &str> {
    line.graphemes(true)
}

/// Previous grapheme boundary (returns 0 if already at or below the first boundary).
pub fn prev_boundary(line: &str, byte: usize) -> usize {
    if byte == 0 || byte > line.len() {
        return 0;
    }
    let mut last = 0;
    for (idx, _) in line.grapheme_indices(true) {
        if idx >= byte {
            break;
        }
        last = idx;
    }
    last
}

/// Next grapheme boundary (returns `line.len()` if at or beyond the end).
pub fn next_boundary(line: &str, byte: usize) -> usize {
    if byte >= line.len() {
        return line.len();
    }
    for (idx, _) in line.grapheme_indices(true) {
        if idx > byte {
            return idx;
        }
    }
    line.len()
}

/// Visual column (terminal cells) up to, but not including, `byte`.
pub fn visual_col(line: &str, byte: usize) -> usize {
    let mut col = 0;
    for (idx, g) in line.grapheme_indices(true) {
        if idx >= byte {
            break;
        }
        col += egc_width(g) as usize;
    }
    col
}

/// Width in terminal cells of this grapheme cluster.
pub fn cluster_width(g: &str) -> usize {
    egc_width(g) as usize
}

/// Naive word classification: alphanumeric or underscore start.
pub fn is_word(g: &str) -> bool {
    g.chars()
        .next()
        .map(|c| c == '_' || c.is_alphanumeric())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grapheme_basic_emoji() {
        let s = "a😀b";
        let after_a = next_boundary(s, 0);
        let after_emoji = next_boundary(s, after_a);
        assert_eq!(prev_boundary(s, after_emoji), after_a);
        assert!(visual_col(s, after_emoji) >= 1);
    }

    #[test]
    fn grapheme_family_emoji() {
        let s = "👨\u{200d}👩\u{200d}👧\u{200d}👦X";
        let next = next_boundary(s, 0);
        assert!(next <= s.len());
        assert!(visual_col(s, next) >= 1);
    }

    #[test]
    fn grapheme_combining_mark() {
        let s = "e\u{0301}";
        let nb = next_boundary(s, 0);
        assert_eq!(nb, s.len());
        assert_eq!(prev_boundary(s, nb), 0);
    }

    #[test]
    fn grapheme_cjk() {
        let s = "汉字";
        let first = next_boundary(s, 0);
        let second = next_boundary(s, first);
        assert!(second <= s.len());
        assert_eq!(prev_boundary(s, second), first);
    }

    #[test]
    fn visual_col_is_non_decreasing() {
        let s = "a😀e\u{0301}汉字👨\u{200d}👩\u{200d}👧\u{200d}👦Z";
        let mut b = 0;
        let mut last_col = 0;
        while b < s.len() {
            let next = next_boundary(s, b);
            let col = visual_col(s, next);
            assert!(col >= last_col, "visual column must be non-decreasing");
            last_col = col;
            b = next;
        }
        let clusters = s.graphemes(true).count();
        assert!(last_col + 1 >= clusters);
    }

    #[test]
    fn is_word_classification() {
        assert!(is_word("a"));
        assert!(is_word("_"));
        assert!(!is_word(" "));
        assert!(!is_word("."));
    }
}
