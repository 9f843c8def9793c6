//! Line-level view of generated Markdown.
//!
//! The converters only need a flat classification of each line; nothing
//! here builds a tree.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```(?:markdown|md)?[ \t]*\n(.*?)\n```\s*$").unwrap());

static RE_NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s+(.*)$").unwrap());

/// Classification of one trimmed Markdown line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkdownLine<'a> {
    /// Empty or whitespace-only
    Blank,
    /// ATX heading; `text` has the '#' characters stripped
    Heading { level: u8, text: &'a str },
    /// `- item` or `* item`; the bullet token is stripped
    Bullet(&'a str),
    /// `1. item`; `text` excludes the number, `raw` keeps it
    Numbered { text: &'a str, raw: &'a str },
    /// Anything else
    Text(&'a str),
}

impl<'a> MarkdownLine<'a> {
    /// Classify a single line.
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return MarkdownLine::Blank;
        }

        let hashes = line.bytes().take_while(|b| *b == b'#').count();
        if (1..=6).contains(&hashes) {
            let rest = &line[hashes..];
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return MarkdownLine::Heading {
                    level: hashes as u8,
                    text: rest.trim(),
                };
            }
        }

        if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            return MarkdownLine::Bullet(item.trim());
        }

        if let Some(caps) = RE_NUMBERED.captures(line) {
            if let Some(text) = caps.get(2) {
                return MarkdownLine::Numbered {
                    text: text.as_str().trim(),
                    raw: line,
                };
            }
        }

        MarkdownLine::Text(line)
    }
}

/// Iterate over the classified lines of a document.
pub fn lines(markdown: &str) -> impl Iterator<Item = MarkdownLine<'_>> {
    markdown.lines().map(MarkdownLine::classify)
}

/// Normalize generator output before conversion.
///
/// Models sometimes wrap the whole answer in a ```markdown fence despite
/// being asked for plain Markdown; the fence is removed and line endings are
/// normalized to `\n`.
pub fn clean_generated(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let unfenced = match RE_OUTER_FENCES.captures(&normalized) {
        Some(caps) => caps.get(1).map(|m| m.as_str().to_string()),
        None => None,
    };
    let mut out = unfenced.unwrap_or(normalized);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings() {
        assert_eq!(
            MarkdownLine::classify("# Title"),
            MarkdownLine::Heading { level: 1, text: "Title" }
        );
        assert_eq!(
            MarkdownLine::classify("  ##   Section two  "),
            MarkdownLine::Heading { level: 2, text: "Section two" }
        );
        assert_eq!(
            MarkdownLine::classify("### Deep"),
            MarkdownLine::Heading { level: 3, text: "Deep" }
        );
        assert_eq!(MarkdownLine::classify("#hashtag"), MarkdownLine::Text("#hashtag"));
        assert_eq!(
            MarkdownLine::classify("####### seven"),
            MarkdownLine::Text("####### seven")
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(MarkdownLine::classify("- point one"), MarkdownLine::Bullet("point one"));
        assert_eq!(MarkdownLine::classify("* star"), MarkdownLine::Bullet("star"));
        assert_eq!(
            MarkdownLine::classify("12. twelfth"),
            MarkdownLine::Numbered { text: "twelfth", raw: "12. twelfth" }
        );
        assert_eq!(MarkdownLine::classify("-nospace"), MarkdownLine::Text("-nospace"));
    }

    #[test]
    fn test_blank_and_trimmed_lines() {
        assert_eq!(MarkdownLine::classify("   \t"), MarkdownLine::Blank);
        assert_eq!(MarkdownLine::classify(""), MarkdownLine::Blank);
        assert_eq!(
            MarkdownLine::classify("  ## 標題  "),
            MarkdownLine::Heading { level: 2, text: "標題" }
        );
    }

    #[test]
    fn test_clean_generated_strips_fences() {
        let raw = "```markdown\r\n# Title\r\n- a\r\n```\r\n";
        assert_eq!(clean_generated(raw), "# Title\n- a\n");
    }

    #[test]
    fn test_clean_generated_keeps_inner_code() {
        let raw = "# T\n```rust\nfn main() {}\n```\ntext";
        assert_eq!(clean_generated(raw), "# T\n```rust\nfn main() {}\n```\ntext\n");
    }

    #[test]
    fn test_lines_iterator() {
        let kinds: Vec<_> = lines("# A\n\n- b\nc").collect();
        assert_eq!(kinds.len(), 4);
        assert_eq!(kinds[1], MarkdownLine::Blank);
    }
}
