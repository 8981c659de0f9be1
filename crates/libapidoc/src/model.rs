//! The renderable document tree and the builder that produces it.
//!
//! Entities are built bottom-up from resolved declarations: signatures, then
//! functions and methods, then classes and enumerations, then modules. They
//! are plain values, rebuilt on every render and never cached.

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    classify::{MethodKind, classify_members, is_documented},
    error::{ApiDocError, Result},
    index::{CallableSignature, Declaration, DeclarationKind, Param, ParamKind},
};

/// Display form of a callable's parameters and return annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Signature {
    /// Name the signature is displayed under.
    pub name: String,
    /// Parameter display text, in order.
    pub params: Vec<String>,
    /// Return annotation display text, possibly empty.
    pub return_val: String,
}

/// A documented class member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Method {
    /// Member name.
    pub name: String,
    /// How the member is exposed.
    pub kind: MethodKind,
    /// The member's signature.
    pub signature: Signature,
    /// Attached docstring, possibly empty.
    pub docstring: String,
}

/// A field of a structured-record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Field type display text, possibly empty.
    #[serde(rename = "type")]
    pub type_: String,
}

/// Whether a class is a plain class or a structured record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    /// A plain class.
    Normal,
    /// A type with an introspectable field schema.
    StructuredRecord,
}

/// A documented class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Class {
    /// Class name.
    pub name: String,
    /// Attached docstring, possibly empty.
    pub docstring: String,
    /// Plain class or structured record.
    pub kind: ClassKind,
    /// Constructor signature with the receiver stripped.
    pub signature: Signature,
    /// Record fields; empty unless the class is a structured record.
    pub fields: Vec<Field>,
    /// Documented members, ordered by name.
    pub methods: Vec<Method>,
}

/// A documented free function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    /// Function name.
    pub name: String,
    /// The function's signature.
    pub signature: Signature,
    /// Attached docstring, possibly empty.
    pub docstring: String,
}

/// A documented enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enumeration {
    /// Enumeration name.
    pub name: String,
    /// Level names, in declaration order.
    pub levels: Vec<String>,
    /// Attached docstring, possibly empty.
    pub docstring: String,
}

/// A documented module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    /// Module name.
    pub name: String,
    /// Attached docstring, possibly empty.
    pub docstring: String,
    /// Documented functions, ordered by name.
    pub functions: Vec<Function>,
    /// Documented classes, ordered by name.
    pub classes: Vec<Class>,
    /// Documented enumerations, ordered by name.
    pub enums: Vec<Enumeration>,
}

/// Builds document entities from declarations.
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    /// Whether a module without an export list is an error.
    strict_exports: bool,
}

impl ModelBuilder {
    /// Creates a builder that tolerates modules without export lists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the export-list requirement.
    pub fn with_strict_exports(mut self, strict: bool) -> Self {
        self.strict_exports = strict;
        self
    }

    /// Extract the signature of a callable declaration.
    ///
    /// For a class this is its constructor's signature, with the receiver
    /// parameter removed.
    pub fn signature(&self, decl: &Declaration, name: Option<&str>) -> Result<Signature> {
        let name = name.unwrap_or(&decl.name).to_string();
        let unavailable = |reason: &str| ApiDocError::SignatureExtraction {
            name: decl.name.clone(),
            reason: reason.to_string(),
        };

        match &decl.kind {
            DeclarationKind::Class { constructor, .. } => {
                let mut params: &[Param] = match constructor {
                    Some(constructor) => &constructor.params,
                    None => &[],
                };
                if params.first().is_some_and(|p| p.kind == ParamKind::Positional) {
                    params = &params[1..];
                }
                Ok(Signature {
                    name,
                    params: format_params(params),
                    return_val: String::new(),
                })
            }
            DeclarationKind::Function { signature }
            | DeclarationKind::Method { signature, .. } => {
                let signature = signature
                    .as_ref()
                    .ok_or_else(|| unavailable("signature is not introspectable"))?;
                Ok(callable_signature(name, signature))
            }
            _ => Err(unavailable("declaration is not callable")),
        }
    }

    /// Build a class member of the given kind.
    pub fn method(&self, decl: &Declaration, kind: MethodKind, name: Option<&str>) -> Result<Method> {
        let signature = match (&decl.kind, kind) {
            (DeclarationKind::Value { type_name, .. }, MethodKind::AbstractProperty) => Signature {
                name: name.unwrap_or(&decl.name).to_string(),
                params: Vec::new(),
                return_val: type_name.clone().unwrap_or_default(),
            },
            _ => self.signature(decl, name)?,
        };
        Ok(Method {
            name: name.unwrap_or(&decl.name).to_string(),
            kind,
            signature,
            docstring: decl.doc_text().to_string(),
        })
    }

    /// Build a free function.
    pub fn function(&self, decl: &Declaration) -> Result<Function> {
        let function = Function {
            name: decl.name.clone(),
            signature: self.signature(decl, None)?,
            docstring: decl.doc_text().to_string(),
        };
        debug!(name = %function.name, "built function");
        Ok(function)
    }

    /// Build a class, classifying and building each documented member.
    pub fn class(&self, decl: &Declaration) -> Result<Class> {
        let DeclarationKind::Class { record_fields, .. } = &decl.kind else {
            return Err(ApiDocError::MissingCapability {
                name: decl.name.clone(),
                capability: "a class body".to_string(),
            });
        };

        let methods = classify_members(decl)
            .into_iter()
            .map(|(member, kind)| self.method(member, kind, None))
            .collect::<Result<Vec<_>>>()?;

        let (kind, fields) = match record_fields {
            Some(fields) => (
                ClassKind::StructuredRecord,
                fields
                    .iter()
                    .map(|f| Field {
                        name: f.name.clone(),
                        type_: f.type_.as_ref().map(|t| t.display()).unwrap_or_default(),
                    })
                    .collect(),
            ),
            None => (ClassKind::Normal, Vec::new()),
        };

        let class = Class {
            name: decl.name.clone(),
            docstring: decl.doc_text().to_string(),
            kind,
            signature: self.signature(decl, None)?,
            fields,
            methods,
        };
        debug!(name = %class.name, methods = class.methods.len(), "built class");
        Ok(class)
    }

    /// Build an enumeration.
    pub fn enumeration(&self, decl: &Declaration) -> Result<Enumeration> {
        match &decl.kind {
            DeclarationKind::Enumeration { levels } => Ok(Enumeration {
                name: decl.name.clone(),
                levels: levels.clone(),
                docstring: decl.doc_text().to_string(),
            }),
            _ => Err(ApiDocError::MissingCapability {
                name: decl.name.clone(),
                capability: "enumeration levels".to_string(),
            }),
        }
    }

    /// Build a module from its exported (or, lacking an export list, all
    /// documented) functions, classes and enumerations.
    ///
    /// A function whose signature cannot be extracted is logged and left out
    /// of the module. Classes and enumerations propagate their errors.
    pub fn module(&self, decl: &Declaration) -> Result<Module> {
        let DeclarationKind::Module { exports } = &decl.kind else {
            return Err(ApiDocError::MissingCapability {
                name: decl.name.clone(),
                capability: "module members".to_string(),
            });
        };

        let mut candidates: Vec<&Declaration> = match exports {
            Some(exports) => decl
                .members
                .iter()
                .filter(|m| exports.iter().any(|e| *e == m.name))
                .collect(),
            None if self.strict_exports => {
                return Err(ApiDocError::MissingExports {
                    module: decl.name.clone(),
                });
            }
            None => {
                warn!(
                    module = %decl.name,
                    "module has no export list; documenting every public member. \
                     Declare an export list to control what is documented"
                );
                decl.members.iter().filter(|m| is_documented(m)).collect()
            }
        };
        candidates.sort_by(|a, b| a.name.cmp(&b.name));

        let mut functions = Vec::new();
        let mut classes = Vec::new();
        let mut enums = Vec::new();
        for member in candidates {
            match &member.kind {
                DeclarationKind::Function { .. } => match self.function(member) {
                    Ok(function) => functions.push(function),
                    Err(err) => warn!(
                        module = %decl.name,
                        function = %member.name,
                        error = %err,
                        "omitting function"
                    ),
                },
                DeclarationKind::Class { .. } => classes.push(self.class(member)?),
                DeclarationKind::Enumeration { levels } if !levels.is_empty() => {
                    enums.push(self.enumeration(member)?)
                }
                _ => {}
            }
        }

        Ok(Module {
            name: decl.name.rsplit('.').next().unwrap_or(&decl.name).to_string(),
            docstring: decl.doc_text().to_string(),
            functions,
            classes,
            enums,
        })
    }
}

/// Format a full callable signature.
fn callable_signature(name: String, signature: &CallableSignature) -> Signature {
    Signature {
        name,
        params: format_params(&signature.params),
        return_val: signature
            .returns
            .as_ref()
            .map(|r| r.display())
            .unwrap_or_default(),
    }
}

/// Format parameters the way they are written in a declaration.
///
/// A bare `*` separator precedes the first keyword-only parameter unless a
/// variadic positional parameter already marks the boundary.
fn format_params(params: &[Param]) -> Vec<String> {
    let mut out = Vec::with_capacity(params.len());
    let mut seen_var_positional = false;
    let mut seen_keyword_only = false;
    for param in params {
        match param.kind {
            ParamKind::VarPositional => seen_var_positional = true,
            ParamKind::KeywordOnly if !seen_keyword_only && !seen_var_positional => {
                out.push("*".to_string());
            }
            _ => {}
        }
        if param.kind == ParamKind::KeywordOnly {
            seen_keyword_only = true;
        }
        out.push(format_param(param));
    }
    out
}

/// Format a single parameter.
fn format_param(param: &Param) -> String {
    let prefix = match param.kind {
        ParamKind::VarPositional => "*",
        ParamKind::VarKeyword => "**",
        ParamKind::Positional | ParamKind::KeywordOnly => "",
    };
    let annotation = param
        .annotation
        .as_ref()
        .map(|a| a.display())
        .filter(|a| !a.is_empty());
    let mut text = format!("{prefix}{}", param.name);
    if let Some(annotation) = &annotation {
        text.push_str(": ");
        text.push_str(annotation);
    }
    if let Some(default) = &param.default {
        if annotation.is_some() {
            text.push_str(" = ");
        } else {
            text.push('=');
        }
        text.push_str(default);
    }
    text
}
