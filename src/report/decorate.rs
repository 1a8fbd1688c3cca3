//! Color emphasis for report fragments.
//!
//! GitHub renders `$\textcolor{..}{..}$` math spans in markdown, which is the
//! only way to get colored text into comments and check summaries.

use crate::severity::Color;

/// Wraps text in color markup, or passes it through when colors are off.
#[derive(Debug, Clone, Copy)]
pub struct Decorator {
    colors: bool,
}

impl Decorator {
    pub fn new(colors: bool) -> Self {
        Self { colors }
    }

    /// Empty text stays empty so callers can filter it out.
    pub fn text(&self, text: &str, color: Color) -> String {
        if text.is_empty() {
            return String::new();
        }
        if !self.colors {
            return text.to_string();
        }
        format!(
            r"$\small\textcolor{{{}}}{{\textbf{{\textsf{{{}}}}}}}$",
            color.as_str(),
            escape_latex(text)
        )
    }
}

/// Escape characters that are special inside a math span. The backslash is
/// doubled because markdown consumes one level of escaping first.
fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '&' | '#' | '$' | '{' | '}') {
            out.push_str(r"\\");
        }
        out.push(c);
    }
    out
}

/// Join the non-empty fragments with a single space.
pub fn join_words<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .filter(|p| !p.as_ref().is_empty())
        .map(|p| p.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
