//! Centralized normalization + segmentation adapter.
//!
//! Contract:
//! - Input: `&str` raw input (may come from a keypress, paste, or a file read).
//! - Output: `(normalized NFC String, Vec<Segment>)` where each segment is a
//!   grapheme cluster with absolute byte offsets into the normalized string
//!   and a display width (terminal cells).
//! - Guarantees: clusters are in order, non-overlapping, and cover the
//!   entire string when concatenated.

use crate::egc_width;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub cluster: String,
    pub start: usize, // byte offset in the normalized string (inclusive)
    pub end: usize,   // byte offset in the normalized string (exclusive)
    pub width: u16,   // terminal cell width
}

impl Segment {
    /// Whether this cluster is entirely whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.cluster.chars().all(char::is_whitespace)
    }

    /// Whether this cluster is (or contains) a line break.
    pub fn is_newline(&self) -> bool {
        self.cluster == "\n" || self.cluster == "\r\n" || self.cluster == "\r"
    }
}

/// Normalize to NFC and segment into grapheme clusters with widths and byte ranges.
pub fn normalize_and_segment(input: &str) -> (String, Vec<Segment>) {
    let normalized: String = input.nfc().collect();
    let mut out = Vec::new();
    let mut byte = 0usize;
    for g in normalized.graphemes(true) {
        let len = g.len();
        let seg = Segment {
            cluster: g.to_string(),
            start: byte,
            end: byte + len,
            width: egc_width(g),
        };
        out.push(seg);
        byte += len;
    }
    (normalized, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nfc_equivalence_and_segmentation_single_cluster() {
        let decomposed = "e\u{0301}"; // e + combining acute
        let composed = "\u{00E9}"; // precomposed é
        let (n1, s1) = normalize_and_segment(decomposed);
        let (n2, s2) = normalize_and_segment(composed);
        assert_eq!(n1, n2);
        assert_eq!(s1.len(), 1);
        assert_eq!(s2.len(), 1);
        assert_eq!(s1[0].cluster, "é");
        assert_eq!(s2[0].cluster, "é");
        assert_eq!(s1[0].width, s2[0].width);
    }

    #[test]
    fn segmentation_zwj_family_and_cjk() {
        let s = "汉😀👨‍👩‍👧‍👦a";
        let (_n, segs) = normalize_and_segment(s);
        assert!(segs.len() >= 4);
        let mut prev_end = 0usize;
        let mut join = String::new();
        for seg in &segs {
            assert!(seg.start == prev_end);
            assert!(seg.end >= seg.start);
            prev_end = seg.end;
            join.push_str(&seg.cluster);
        }
        assert_eq!(join, s.nfc().collect::<String>());
    }

    #[test]
    fn gear_with_variation_selector_is_wide() {
        let s = "a⚙️b";
        let (_n, segs) = normalize_and_segment(s);
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[1].cluster, "⚙️");
        assert_eq!(segs[1].width, 2);
    }

    #[test]
    fn whitespace_and_newline_predicates() {
        let (_n, segs) = normalize_and_segment("a \n");
        assert!(!segs[0].is_whitespace());
        assert!(segs[1].is_whitespace());
        assert!(!segs[1].is_newline());
        assert!(segs[2].is_newline());
    }
}
