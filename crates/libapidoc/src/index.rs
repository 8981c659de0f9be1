//! The declaration index: a static description of a program's API surface.
//!
//! Documentation is produced in two phases. An external indexer walks the
//! documented program ahead of time and emits a [`DeclarationIndex`] as JSON;
//! the rest of this crate only ever reads that index. Nothing here inspects a
//! live program.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A set of top-level declarations, usually one per package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclarationIndex {
    /// Top-level declarations. The first segment of a dotted path names one of these.
    #[serde(default)]
    pub roots: Vec<Declaration>,
}

impl DeclarationIndex {
    /// Create an index from a list of root declarations.
    pub fn new(roots: Vec<Declaration>) -> Self {
        Self { roots }
    }

    /// Parse an index from its JSON form.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse an index file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Serialize the index as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up a root declaration by name.
    pub fn root(&self, name: &str) -> Option<&Declaration> {
        self.roots.iter().find(|d| d.name == name)
    }
}

/// A named, inspectable unit of program structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Declared name, without any module prefix.
    pub name: String,
    /// Attached comment text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Explicit opt-in (`true`) or opt-out (`false`) of documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_in_docs: Option<bool>,
    /// Nested declarations: module contents or class members.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Declaration>,
    /// What sort of declaration this is.
    #[serde(flatten)]
    pub kind: DeclarationKind,
}

/// Kind-specific data carried by a [`Declaration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclarationKind {
    /// A module or package.
    Module {
        /// The explicit export list, when the module declares one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exports: Option<Vec<String>>,
    },
    /// A constructible type.
    Class {
        /// The constructor signature, including the receiver parameter.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        constructor: Option<CallableSignature>,
        /// Declared record fields. `Some` marks a structured-record type.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        record_fields: Option<Vec<RecordField>>,
    },
    /// A free function.
    Function {
        /// `None` when the indexer could not introspect the signature.
        #[serde(default)]
        signature: Option<CallableSignature>,
    },
    /// A procedure declared inside a class body.
    Method {
        /// How the procedure is bound to its class.
        #[serde(default)]
        binding: MethodBinding,
        /// `None` when the indexer could not introspect the signature.
        #[serde(default)]
        signature: Option<CallableSignature>,
    },
    /// A type whose members are a closed set of named constants.
    Enumeration {
        /// Level names, in declaration order.
        #[serde(default)]
        levels: Vec<String>,
    },
    /// Any other named value: constants, class attributes, instances.
    Value {
        /// Name of the value's type.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_name: Option<String>,
        /// Display form of the value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        /// Marks a placeholder for an abstract accessor contract.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        abstract_accessor: bool,
        /// Markdown the value renders itself as, if it provides one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        markdown: Option<String>,
    },
}

/// How a method is bound to its class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodBinding {
    /// Takes an instance receiver.
    #[default]
    Instance,
    /// Takes no receiver.
    Static,
    /// Bound to the type rather than an instance.
    Type,
    /// A computed, argument-less getter.
    Accessor,
}

/// A field declared on a structured-record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordField {
    /// Field name.
    pub name: String,
    /// Field type, if declared.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<Annotation>,
}

/// Parameter list and return annotation of a callable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallableSignature {
    /// Parameters in declaration order.
    #[serde(default)]
    pub params: Vec<Param>,
    /// Return annotation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<Annotation>,
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Type annotation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Annotation>,
    /// Display form of the default value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// How the parameter binds arguments.
    #[serde(default)]
    pub kind: ParamKind,
}

/// Argument binding style of a parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// An ordinary positional-or-keyword parameter.
    #[default]
    Positional,
    /// Collects surplus positional arguments.
    VarPositional,
    /// Can only be passed by keyword.
    KeywordOnly,
    /// Collects surplus keyword arguments.
    VarKeyword,
}

/// A type annotation as recorded by the indexer.
///
/// In JSON an annotation is either a plain string (its textual form) or an
/// object with an optional resolved short `name` and an optional `repr`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAnnotation")]
pub struct Annotation {
    /// Fully-resolved short type name, when the indexer could resolve one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Textual form of the annotation as written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repr: Option<String>,
}

/// Wire form accepted for [`Annotation`].
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnnotation {
    /// A bare string.
    Text(String),
    /// The structured form.
    Full {
        /// Resolved short name.
        #[serde(default)]
        name: Option<String>,
        /// Textual form.
        #[serde(default)]
        repr: Option<String>,
    },
}

impl From<RawAnnotation> for Annotation {
    fn from(raw: RawAnnotation) -> Self {
        match raw {
            RawAnnotation::Text(repr) => Self {
                name: None,
                repr: Some(repr),
            },
            RawAnnotation::Full { name, repr } => Self { name, repr },
        }
    }
}

impl Annotation {
    /// An annotation with a resolved short name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            repr: None,
        }
    }

    /// An annotation known only by its textual form.
    pub fn text(repr: impl Into<String>) -> Self {
        Self {
            name: None,
            repr: Some(repr.into()),
        }
    }

    /// Display text: the short name if resolvable, else the textual form, else empty.
    pub fn display(&self) -> String {
        self.name
            .as_deref()
            .or(self.repr.as_deref())
            .unwrap_or_default()
            .to_string()
    }
}

impl Param {
    /// A positional parameter without annotation or default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            default: None,
            kind: ParamKind::Positional,
        }
    }

    /// Attach a type annotation.
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    /// Attach a default value.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the binding style.
    pub fn with_kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }
}

impl CallableSignature {
    /// A signature with the given parameters and no return annotation.
    pub fn new(params: Vec<Param>) -> Self {
        Self {
            params,
            returns: None,
        }
    }

    /// Attach a return annotation.
    pub fn with_returns(mut self, returns: Annotation) -> Self {
        self.returns = Some(returns);
        self
    }
}

impl RecordField {
    /// A record field with an optional type.
    pub fn new(name: impl Into<String>, type_: Option<Annotation>) -> Self {
        Self {
            name: name.into(),
            type_,
        }
    }
}

impl Declaration {
    /// Construct a declaration of the given kind with no doc and no members.
    pub fn new(name: impl Into<String>, kind: DeclarationKind) -> Self {
        Self {
            name: name.into(),
            doc: None,
            include_in_docs: None,
            members: Vec::new(),
            kind,
        }
    }

    /// A module without an export list.
    pub fn module(name: impl Into<String>) -> Self {
        Self::new(name, DeclarationKind::Module { exports: None })
    }

    /// A plain class with the given constructor.
    pub fn class(name: impl Into<String>, constructor: Option<CallableSignature>) -> Self {
        Self::new(
            name,
            DeclarationKind::Class {
                constructor,
                record_fields: None,
            },
        )
    }

    /// A structured-record class with the given fields.
    pub fn record(name: impl Into<String>, fields: Vec<RecordField>) -> Self {
        Self::new(
            name,
            DeclarationKind::Class {
                constructor: None,
                record_fields: Some(fields),
            },
        )
    }

    /// A free function.
    pub fn function(name: impl Into<String>, signature: Option<CallableSignature>) -> Self {
        Self::new(name, DeclarationKind::Function { signature })
    }

    /// A method with the given binding.
    pub fn method(
        name: impl Into<String>,
        binding: MethodBinding,
        signature: Option<CallableSignature>,
    ) -> Self {
        Self::new(name, DeclarationKind::Method { binding, signature })
    }

    /// An enumeration with the given levels.
    pub fn enumeration(name: impl Into<String>, levels: &[&str]) -> Self {
        Self::new(
            name,
            DeclarationKind::Enumeration {
                levels: levels.iter().map(|l| l.to_string()).collect(),
            },
        )
    }

    /// A plain value of the given type.
    pub fn value(name: impl Into<String>, type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            name,
            DeclarationKind::Value {
                type_name: Some(type_name.into()),
                value: Some(value.into()),
                abstract_accessor: false,
                markdown: None,
            },
        )
    }

    /// Attach comment text.
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Set the documentation capability flag.
    pub fn with_include_in_docs(mut self, include: bool) -> Self {
        self.include_in_docs = Some(include);
        self
    }

    /// Append a member declaration.
    pub fn with_member(mut self, member: Self) -> Self {
        self.members.push(member);
        self
    }

    /// Set a module's export list. Has no effect on other kinds.
    pub fn with_exports(mut self, names: &[&str]) -> Self {
        if let DeclarationKind::Module { exports } = &mut self.kind {
            *exports = Some(names.iter().map(|n| n.to_string()).collect());
        }
        self
    }

    /// Mark a value as an abstract accessor placeholder. Has no effect on other kinds.
    pub fn with_abstract_accessor(mut self) -> Self {
        if let DeclarationKind::Value {
            abstract_accessor, ..
        } = &mut self.kind
        {
            *abstract_accessor = true;
        }
        self
    }

    /// Attach a self-rendered markdown form to a value. Has no effect on other kinds.
    pub fn with_markdown(mut self, text: impl Into<String>) -> Self {
        if let DeclarationKind::Value { markdown, .. } = &mut self.kind {
            *markdown = Some(text.into());
        }
        self
    }

    /// Attached comment text, or the empty string.
    pub fn doc_text(&self) -> &str {
        self.doc.as_deref().unwrap_or_default()
    }

    /// Find a direct member by name.
    pub fn member(&self, name: &str) -> Option<&Self> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Whether this declaration is a constructible type.
    pub fn is_class(&self) -> bool {
        matches!(self.kind, DeclarationKind::Class { .. })
    }

    /// Whether this declaration is a structured-record type.
    pub fn is_record(&self) -> bool {
        matches!(
            self.kind,
            DeclarationKind::Class {
                record_fields: Some(_),
                ..
            }
        )
    }

    /// A short label for the declaration's type, as reported by `typeof`.
    pub fn type_label(&self) -> &str {
        match &self.kind {
            DeclarationKind::Module { .. } => "module",
            DeclarationKind::Class { .. } => "type",
            DeclarationKind::Function { .. } => "function",
            DeclarationKind::Method { .. } => "method",
            DeclarationKind::Enumeration { .. } => "enum",
            DeclarationKind::Value { type_name, .. } => type_name.as_deref().unwrap_or("value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_index() -> Result<()> {
        let json = r#"{
            "roots": [{
                "name": "pkg",
                "kind": "module",
                "exports": ["add"],
                "doc": "A package.",
                "members": [
                    {
                        "name": "add",
                        "kind": "function",
                        "signature": {
                            "params": [
                                {"name": "x", "annotation": {"name": "int"}},
                                {"name": "y", "annotation": "Optional[int]", "default": "None"},
                                {"name": "kwargs", "kind": "var_keyword"}
                            ],
                            "returns": {"name": "int", "repr": "builtins.int"}
                        }
                    },
                    {"name": "Color", "kind": "enumeration", "levels": ["RED", "GREEN"]},
                    {"name": "Point", "kind": "class", "record_fields": [{"name": "x", "type": "float"}]}
                ]
            }]
        }"#;
        let index = DeclarationIndex::from_json_str(json)?;
        let pkg = index.root("pkg").expect("missing root");
        assert_eq!(pkg.doc_text(), "A package.");
        assert_eq!(
            pkg.kind,
            DeclarationKind::Module {
                exports: Some(vec!["add".to_string()])
            }
        );

        let add = pkg.member("add").expect("missing add");
        let DeclarationKind::Function {
            signature: Some(sig),
        } = &add.kind
        else {
            panic!("add should be a function with a signature");
        };
        assert_eq!(sig.params.len(), 3);
        assert_eq!(sig.params[1].annotation, Some(Annotation::text("Optional[int]")));
        assert_eq!(sig.params[2].kind, ParamKind::VarKeyword);
        assert_eq!(sig.returns.as_ref().map(Annotation::display), Some("int".into()));

        assert!(pkg.member("Point").is_some_and(Declaration::is_record));
        assert_eq!(pkg.member("Color").map(Declaration::type_label), Some("enum"));
        Ok(())
    }

    #[test]
    fn test_function_signature_may_be_missing() -> Result<()> {
        let index = DeclarationIndex::from_json_str(
            r#"{"roots": [{"name": "native", "kind": "function"}]}"#,
        )?;
        assert_eq!(
            index.roots[0].kind,
            DeclarationKind::Function { signature: None }
        );
        Ok(())
    }

    #[test]
    fn test_json_roundtrip_preserves_builders() -> Result<()> {
        let index = DeclarationIndex::new(vec![
            Declaration::module("pkg")
                .with_exports(&["Shape"])
                .with_member(
                    Declaration::class("Shape", Some(CallableSignature::new(vec![Param::new("self")])))
                        .with_member(Declaration::value("sides", "int", "0").with_abstract_accessor()),
                ),
        ]);
        let json = index.to_json_pretty()?;
        assert_eq!(DeclarationIndex::from_json_str(&json)?, index);
        Ok(())
    }

    #[test]
    fn test_annotation_display() {
        assert_eq!(Annotation::named("int").display(), "int");
        assert_eq!(Annotation::text("List[int]").display(), "List[int]");
        assert_eq!(Annotation::default().display(), "");
        let both = Annotation {
            name: Some("Widget".into()),
            repr: Some("pkg.Widget".into()),
        };
        assert_eq!(both.display(), "Widget");
    }
}
