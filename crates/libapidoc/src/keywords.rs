//! Identifier helpers used while classifying and rendering declarations.

/// Whether `name` carries exactly one leading underscore.
pub fn is_private(name: &str) -> bool {
    name.starts_with('_') && !name.starts_with("__")
}

/// Whether `name` carries a double-underscore prefix.
pub fn is_dunder(name: &str) -> bool {
    name.starts_with("__")
}

/// Escape underscores so identifiers do not turn into markdown emphasis.
pub fn escape_markdown_name(name: &str) -> String {
    name.replace('_', r"\_")
}
