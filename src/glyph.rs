//! Brightness to glyph mapping over a caller-supplied character ramp.

use image::GrayImage;

/// Built-in ramp, darkest glyph first.
pub const DEFAULT_RAMP: &str = "@%#*+=-:. ";

/// Fewest code points a ramp may contain.
pub const MIN_RAMP_LEN: usize = 2;
/// Most code points a ramp may contain.
pub const MAX_RAMP_LEN: usize = 32;

/// An ordered, validated set of glyphs from darkest to lightest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ramp {
    chars: Vec<char>,
}

impl Ramp {
    /// Parse a ramp, counting code points rather than bytes.
    ///
    /// Returns `None` when the ramp has fewer than [`MIN_RAMP_LEN`] or more
    /// than [`MAX_RAMP_LEN`] characters, or contains a control character
    /// (which would break the one-line-per-row layout).
    pub fn parse(ramp: &str) -> Option<Self> {
        let chars: Vec<char> = ramp.chars().collect();
        if !(MIN_RAMP_LEN..=MAX_RAMP_LEN).contains(&chars.len()) {
            return None;
        }
        if chars.iter().any(|c| c.is_control()) {
            return None;
        }
        Some(Self { chars })
    }

    /// Parse a ramp, falling back to [`DEFAULT_RAMP`] when it is invalid.
    pub fn parse_or_default(ramp: &str) -> Self {
        Self::parse(ramp).unwrap_or_default()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    /// Select the glyph for a brightness sample.
    ///
    /// Index is `floor(b * (N-1) / 255)` in integer arithmetic, so 0 always
    /// lands on the first glyph and 255 on the last.
    #[inline]
    pub fn glyph(&self, brightness: u8) -> char {
        let last = self.chars.len() - 1;
        let idx = (brightness as usize * last) / 255;
        self.chars[idx.min(last)]
    }

    /// Render a brightness grid row by row, one newline-terminated line per row.
    pub fn render(&self, gray: &GrayImage) -> String {
        let (width, height) = gray.dimensions();
        // Capacity assumes single-byte glyphs; multi-byte ramps just grow once.
        let mut text = String::with_capacity((width as usize + 1) * height as usize);
        for row in gray.rows() {
            for pixel in row {
                text.push(self.glyph(pixel.0[0]));
            }
            text.push('\n');
        }
        text
    }
}

impl Default for Ramp {
    fn default() -> Self {
        Self {
            chars: DEFAULT_RAMP.chars().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_extremes_hit_first_and_last_glyph() {
        for len in MIN_RAMP_LEN..=MAX_RAMP_LEN {
            let source: String = ('a'..='z').chain('A'..='Z').take(len).collect();
            let ramp = Ramp::parse(&source).unwrap();
            assert_eq!(ramp.glyph(0), ramp.chars()[0]);
            assert_eq!(ramp.glyph(255), ramp.chars()[len - 1]);
        }
    }

    #[test]
    fn test_default_ramp_mapping() {
        let ramp = Ramp::default();
        assert_eq!(ramp.len(), 10);
        assert_eq!(ramp.glyph(0), '@');
        assert_eq!(ramp.glyph(127), '+'); // 127 * 9 / 255 = 4
        assert_eq!(ramp.glyph(254), '.'); // 254 * 9 / 255 = 8
        assert_eq!(ramp.glyph(255), ' ');
    }

    #[test]
    fn test_two_glyph_ramp_splits_at_top() {
        let ramp = Ramp::parse("#.").unwrap();
        assert_eq!(ramp.glyph(128), '#');
        assert_eq!(ramp.glyph(254), '#');
        assert_eq!(ramp.glyph(255), '.');
    }

    #[test]
    fn test_length_bounds() {
        assert!(Ramp::parse("").is_none());
        assert!(Ramp::parse("@").is_none());
        assert!(Ramp::parse(&"x".repeat(32)).is_some());
        assert!(Ramp::parse(&"x".repeat(33)).is_none());
    }

    #[test]
    fn test_counts_code_points_not_bytes() {
        // 16 block glyphs are 48 bytes but only 16 characters.
        let blocks = "█▓▒░".repeat(4);
        assert!(blocks.len() > MAX_RAMP_LEN);
        let ramp = Ramp::parse(&blocks).unwrap();
        assert_eq!(ramp.len(), 16);
        assert_eq!(ramp.glyph(255), '░');

        // A single multi-byte character is still only one character.
        assert!(Ramp::parse("█").is_none());
    }

    #[test]
    fn test_control_characters_rejected() {
        assert!(Ramp::parse("@\n ").is_none());
        assert!(Ramp::parse("@\t ").is_none());
    }

    #[test]
    fn test_invalid_falls_back_to_default() {
        assert_eq!(Ramp::parse_or_default("@"), Ramp::default());
        assert_eq!(Ramp::parse_or_default(&"x".repeat(40)), Ramp::default());
        assert_eq!(Ramp::parse_or_default("ab").chars(), &['a', 'b']);
    }

    #[test]
    fn test_render_layout() {
        let mut gray = GrayImage::from_pixel(3, 2, Luma([0]));
        gray.put_pixel(2, 1, Luma([255]));
        let ramp = Ramp::parse("#.").unwrap();
        assert_eq!(ramp.render(&gray), "###\n##.\n");
    }
}
