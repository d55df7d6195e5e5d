//! Lightly-formatted rendering of assistant replies
//!
//! Exactly four rules are applied, in order:
//! 1. `**text**` becomes bold
//! 2. `*text*` becomes italic
//! 3. a line starting with `- ` gets a bullet glyph instead of the marker
//! 4. every newline is a line break
//!
//! Nothing is escaped. [`to_html`] output is only safe for trusted
//! (assistant-authored) text.

use std::sync::OnceLock;

use regex::Regex;

use crate::state::{ChatMessage, Rendering};

pub const BULLET: &str = "• ";

// Private-use markers standing in for emphasis tags between passes.
const BOLD_OPEN: char = '\u{E000}';
const BOLD_CLOSE: char = '\u{E001}';
const EM_OPEN: char = '\u{E002}';
const EM_CLOSE: char = '\u{E003}';

static BOLD_RE: OnceLock<Regex> = OnceLock::new();
static ITALIC_RE: OnceLock<Regex> = OnceLock::new();
static BULLET_RE: OnceLock<Regex> = OnceLock::new();

fn bold_re() -> &'static Regex {
    BOLD_RE.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold pattern"))
}

fn italic_re() -> &'static Regex {
    ITALIC_RE.get_or_init(|| Regex::new(r"\*(.*?)\*").expect("valid italic pattern"))
}

fn bullet_re() -> &'static Regex {
    BULLET_RE.get_or_init(|| Regex::new(r"(?m)^- ").expect("valid bullet pattern"))
}

/// A run of text sharing the same emphasis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
        }
    }
}

/// One display line of a formatted message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormattedLine {
    pub segments: Vec<Segment>,
}

impl FormattedLine {
    /// The line's text with emphasis dropped
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Run the first three rules, leaving emphasis as marker characters.
fn apply_rules(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(*c, BOLD_OPEN | BOLD_CLOSE | EM_OPEN | EM_CLOSE))
        .collect();

    let bold_sub = format!("{}${{1}}{}", BOLD_OPEN, BOLD_CLOSE);
    let em_sub = format!("{}${{1}}{}", EM_OPEN, EM_CLOSE);

    let step = bold_re().replace_all(&cleaned, bold_sub.as_str());
    let step = italic_re().replace_all(&step, em_sub.as_str());
    bullet_re().replace_all(&step, BULLET).into_owned()
}

/// Format assistant text into styled lines
pub fn format_light(text: &str) -> Vec<FormattedLine> {
    let marked = apply_rules(text);
    let mut bold = false;
    let mut italic = false;

    marked
        .split('\n')
        .map(|line| {
            let mut segments = Vec::new();
            let mut current = String::new();

            for c in line.chars() {
                let (next_bold, next_italic) = match c {
                    BOLD_OPEN => (true, italic),
                    BOLD_CLOSE => (false, italic),
                    EM_OPEN => (bold, true),
                    EM_CLOSE => (bold, false),
                    _ => {
                        current.push(c);
                        continue;
                    }
                };
                if !current.is_empty() {
                    segments.push(Segment {
                        text: std::mem::take(&mut current),
                        bold,
                        italic,
                    });
                }
                bold = next_bold;
                italic = next_italic;
            }

            if !current.is_empty() {
                segments.push(Segment { text: current, bold, italic });
            }

            FormattedLine { segments }
        })
        .collect()
}

/// Plain text split into lines, no rules applied
pub fn format_plain(text: &str) -> Vec<FormattedLine> {
    text.split('\n')
        .map(|line| FormattedLine {
            segments: if line.is_empty() {
                Vec::new()
            } else {
                vec![Segment::plain(line)]
            },
        })
        .collect()
}

pub fn format_message(message: &ChatMessage) -> Vec<FormattedLine> {
    match message.rendering {
        Rendering::Plain => format_plain(&message.text),
        Rendering::LightlyFormatted => format_light(&message.text),
    }
}

/// Markup form of the same four rules (`<strong>`, `<em>`, bullet, `<br>`).
///
/// HTML special characters in `text` pass through unescaped.
pub fn to_html(text: &str) -> String {
    apply_rules(text)
        .replace(BOLD_OPEN, "<strong>")
        .replace(BOLD_CLOSE, "</strong>")
        .replace(EM_OPEN, "<em>")
        .replace(EM_CLOSE, "</em>")
        .replace('\n', "<br>")
}
