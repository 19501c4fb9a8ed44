//! Caption text handling: greedy wrapping, ffmpeg filter escaping, font choice.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Greedy line packing against a character budget.
///
/// Counts characters, not bytes, so Devanagari and Latin text wrap alike.
/// A single word longer than the budget gets a line of its own.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_len > 0 && current_len + 1 + word_len > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

fn escape_with(value: &str, specials: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || specials.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape a value for a filter option inside a `-filter_complex` graph.
///
/// Two levels: the option parser splits on `:` and the graph parser splits
/// on `[],;`; both treat `'` as a quote.
pub fn escape_filter_value(value: &str) -> String {
    let option_level = escape_with(value, &['\'', ':']);
    escape_with(&option_level, &['\'', '[', ']', ',', ';'])
}

/// Escape caption text for drawtext's `text=` option.
///
/// drawtext expands `%{...}` sequences and backslash escapes on top of the
/// filter graph escaping, so `%` is escaped first.
pub fn escape_drawtext(text: &str) -> String {
    let expansion_level = escape_with(text, &['%']);
    escape_filter_value(&expansion_level)
}

/// Wrapped caption lines joined and escaped, ready for `text=`.
pub fn drawtext_text(lines: &[String]) -> String {
    escape_drawtext(&lines.join("\n"))
}

/// The font handed to drawtext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSelection {
    /// A font file known to cover Latin and Devanagari
    File(PathBuf),
    /// Fontconfig family resolved by the backend
    Family(String),
}

impl FontSelection {
    /// First existing candidate, else the generic family.
    pub fn resolve(candidates: &[PathBuf], fallback_family: &str) -> Self {
        for candidate in candidates {
            if candidate.is_file() {
                debug!("Using caption font {}", candidate.display());
                return FontSelection::File(candidate.clone());
            }
        }

        warn!(
            "None of {} caption font candidates exist, falling back to '{}'",
            candidates.len(),
            fallback_family
        );
        FontSelection::Family(fallback_family.to_string())
    }

    /// drawtext option selecting this font.
    pub fn filter_option(&self) -> String {
        match self {
            FontSelection::File(path) => format!("fontfile={}", escape_filter_value(&font_path_arg(path))),
            FontSelection::Family(family) => format!("font={}", escape_filter_value(family)),
        }
    }
}

// ffmpeg accepts forward slashes on every platform
fn font_path_arg(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_greedy() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps over", "the lazy", "dog"]);
    }

    #[test]
    fn test_wrap_is_deterministic() {
        let text = "India is a land of vibrant culture and ancient history.";
        assert_eq!(wrap_text(text, 29), wrap_text(text, 29));
    }

    #[test]
    fn test_wrap_long_word_gets_own_line() {
        let lines = wrap_text("a supercalifragilistic word", 8);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "word"]);
    }

    #[test]
    fn test_wrap_counts_devanagari_chars() {
        // Each word is 4 chars but 12 bytes
        let lines = wrap_text("भारत भारत भारत", 9);
        assert_eq!(lines, vec!["भारत भारत", "भारत"]);
    }

    #[test]
    fn test_wrap_empty_text() {
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn test_escape_drawtext_specials() {
        assert_eq!(escape_drawtext("plain text"), "plain text");
        assert_eq!(escape_drawtext("a:b"), "a\\\\:b");
        assert_eq!(escape_drawtext("100%"), "100\\\\\\\\%");
        assert_eq!(escape_drawtext("it's"), "it\\\\\\'s");
        assert_eq!(escape_drawtext("x,y"), "x\\,y");
    }

    #[test]
    fn test_font_fallback_to_family() {
        let font = FontSelection::resolve(&[PathBuf::from("/nonexistent/font.ttf")], "Sans");
        assert_eq!(font, FontSelection::Family("Sans".to_string()));
        assert_eq!(font.filter_option(), "font=Sans");
    }

    #[test]
    fn test_font_prefers_first_existing_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let second = dir.path().join("noto.ttf");
        let third = dir.path().join("arial.ttf");
        std::fs::write(&second, b"font").unwrap();
        std::fs::write(&third, b"font").unwrap();

        let font = FontSelection::resolve(
            &[dir.path().join("mangal.ttf"), second.clone(), third],
            "Sans",
        );
        assert_eq!(font, FontSelection::File(second));
    }

    #[test]
    fn test_font_path_escapes_drive_colon() {
        let font = FontSelection::File(PathBuf::from("C:/Windows/Fonts/arial.ttf"));
        assert_eq!(font.filter_option(), "fontfile=C\\\\:/Windows/Fonts/arial.ttf");
    }
}
