//! Terminal highlighting for rendered markdown.

use once_cell::sync::Lazy;
use syntect::{
    easy::HighlightLines,
    highlighting::{Style, Theme, ThemeSet},
    parsing::{SyntaxReference, SyntaxSet},
    util::{LinesWithEndings, as_24_bit_terminal_escaped},
};

use crate::error::{ApiDocError, Result};

/// Lazily loaded syntect syntax definitions including newline handling.
static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
/// Shared theme catalog for syntax highlighting.
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);
/// Cached lookup for the Markdown syntax definition.
static MARKDOWN_SYNTAX: Lazy<Option<&'static SyntaxReference>> =
    Lazy::new(|| SYNTAX_SET.find_syntax_by_extension("md"));
/// The Solarized (dark) theme, if the catalog carries it.
static SOLARIZED_THEME: Lazy<Option<&'static Theme>> =
    Lazy::new(|| THEME_SET.themes.get("Solarized (dark)"));

/// Highlights rendered markdown with ANSI escapes for terminal output.
pub fn highlight_markdown(text: &str) -> Result<String> {
    let syntax = (*MARKDOWN_SYNTAX)
        .ok_or_else(|| ApiDocError::Highlight("Markdown syntax not found".to_string()))?;
    let theme = (*SOLARIZED_THEME)
        .ok_or_else(|| ApiDocError::Highlight("Solarized (dark) theme not found".to_string()))?;
    let mut h = HighlightLines::new(syntax, theme);

    let mut output = String::new();
    for line in LinesWithEndings::from(text) {
        let ranges: Vec<(Style, &str)> = h.highlight_line(line, &SYNTAX_SET)?;
        output.push_str(&as_24_bit_terminal_escaped(&ranges[..], false));
    }
    // Reset terminal attributes.
    output.push_str("\x1b[0m");
    Ok(output)
}
