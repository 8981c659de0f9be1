//! Dotted-path lookup of declarations.

use crate::{
    error::{ApiDocError, Result},
    index::{Declaration, DeclarationIndex},
};

/// Resolves a dotted path such as `pkg.mod.func` to a declaration.
pub trait NameResolver {
    /// Look up the declaration named by `path`.
    fn resolve(&self, path: &str) -> Result<&Declaration>;
}

impl NameResolver for DeclarationIndex {
    fn resolve(&self, path: &str) -> Result<&Declaration> {
        let mut segments = path.split('.');
        let not_found = |segment: &str| ApiDocError::Resolution {
            path: path.to_string(),
            segment: segment.to_string(),
        };

        let first = segments.next().unwrap_or_default();
        if first.is_empty() {
            return Err(not_found(first));
        }
        let mut current = self.root(first).ok_or_else(|| not_found(first))?;
        for segment in segments {
            if segment.is_empty() {
                return Err(not_found(segment));
            }
            current = current.member(segment).ok_or_else(|| not_found(segment))?;
        }
        tracing::debug!(path, kind = current.type_label(), "resolved declaration");
        Ok(current)
    }
}
