//! Member classification for class-like declarations.

use std::fmt;

use serde::Serialize;

use crate::{
    index::{Declaration, DeclarationKind, MethodBinding},
    keywords::{is_dunder, is_private},
};

/// How a class member is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// An instance method.
    Normal,
    /// A procedure without a receiver.
    Static,
    /// A procedure bound to the type.
    Class,
    /// A computed accessor.
    Property,
    /// A double-underscore member.
    Dunder,
    /// A placeholder for an abstract accessor contract.
    AbstractProperty,
}

impl MethodKind {
    /// Human-friendly label for the kind.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "method",
            Self::Static => "static method",
            Self::Class => "class method",
            Self::Property => "property",
            Self::Dunder => "dunder method",
            Self::AbstractProperty => "abstract property",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a member passes the visibility rules.
///
/// Single-underscore names are never documented. Double-underscore names
/// need an explicit opt-in, and an explicit opt-out hides any member.
pub fn is_documented(member: &Declaration) -> bool {
    let name = member.name.as_str();
    if is_private(name) {
        return false;
    }
    if is_dunder(name) && member.include_in_docs != Some(true) {
        return false;
    }
    member.include_in_docs != Some(false)
}

/// Assign a kind to a member that passed the visibility rules.
///
/// Returns `None` for plain values, which are attributes rather than
/// methods unless they are marked as abstract accessors.
pub fn classify_member(member: &Declaration) -> Option<MethodKind> {
    if is_dunder(&member.name) {
        return Some(MethodKind::Dunder);
    }
    let kind = match &member.kind {
        DeclarationKind::Method { binding, .. } => match binding {
            MethodBinding::Static => MethodKind::Static,
            MethodBinding::Accessor => MethodKind::Property,
            MethodBinding::Type => MethodKind::Class,
            MethodBinding::Instance => MethodKind::Normal,
        },
        DeclarationKind::Value {
            abstract_accessor: true,
            ..
        } => MethodKind::AbstractProperty,
        DeclarationKind::Value { .. } => return None,
        _ => MethodKind::Normal,
    };
    Some(kind)
}

/// Classify every documented member of `class`, ordered by name.
pub fn classify_members(class: &Declaration) -> Vec<(&Declaration, MethodKind)> {
    let mut members: Vec<_> = class
        .members
        .iter()
        .filter(|m| is_documented(m))
        .filter_map(|m| classify_member(m).map(|kind| (m, kind)))
        .collect();
    members.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));
    members
}
