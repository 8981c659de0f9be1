//! Page rendering: templates that call converter functions by dotted path.
//!
//! A page is itself a template. Each converter is registered as a template
//! function taking the path of a declaration:
//!
//! ```text
//! # Reference
//!
//! {{ auto_module(path="pkg.shapes") }}
//!
//! The type of `pkg.VERSION` is {{ typeof("pkg.VERSION") }}.
//! ```
//!
//! Single-argument calls without a parameter name are accepted and rewritten
//! before parsing.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tera::{Context, Tera, Value};
use tracing::debug;

use crate::{
    docstring::StructuredDocstring,
    error::{ApiDocError, Result},
    index::{Declaration, DeclarationKind},
    model::ModelBuilder,
    render::{Renderer, describe},
    resolver::NameResolver,
};

/// Name the page template is registered under.
const PAGE_TEMPLATE: &str = "page";

/// Expression blocks of a page.
static EXPRESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{.*?\}\}").expect("valid regex"));

/// Converter calls whose only argument is an unnamed string literal.
static POSITIONAL_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\b(?P<func>auto_module|auto_object|raw_object|markdown|typeof|auto_dataclass)\(\s*(?P<arg>"[^"]*"|'[^']*')\s*\)"#,
    )
    .expect("valid regex")
});

/// A page-level conversion from a declaration to markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Converter {
    /// A module with all of its documented members.
    AutoModule,
    /// The structured docstring of any declaration.
    AutoObject,
    /// The raw docstring text of any declaration.
    RawObject,
    /// The markdown a value declares for itself.
    Markdown,
    /// The type name of any declaration.
    TypeOf,
    /// A structured-record class.
    AutoDataclass,
}

impl Converter {
    /// Every converter available to pages.
    pub const ALL: [Self; 6] = [
        Self::AutoModule,
        Self::AutoObject,
        Self::RawObject,
        Self::Markdown,
        Self::TypeOf,
        Self::AutoDataclass,
    ];

    /// The template function name.
    pub fn name(self) -> &'static str {
        match self {
            Self::AutoModule => "auto_module",
            Self::AutoObject => "auto_object",
            Self::RawObject => "raw_object",
            Self::Markdown => "markdown",
            Self::TypeOf => "typeof",
            Self::AutoDataclass => "auto_dataclass",
        }
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a converter needs: lookup, model construction and rendering.
#[derive(Clone)]
pub struct PageContext {
    /// Resolves dotted paths.
    pub resolver: Arc<dyn NameResolver + Send + Sync>,
    /// Builds document entities.
    pub builder: ModelBuilder,
    /// Renders document entities.
    pub renderer: Renderer,
}

impl PageContext {
    /// Resolve `path` and apply `converter` to the declaration.
    pub fn convert(&self, converter: Converter, path: &str) -> Result<String> {
        debug!(converter = converter.name(), path, "converting");
        let decl = self.resolver.resolve(path)?;
        match converter {
            Converter::AutoModule => {
                let module = self.builder.module(decl)?;
                self.renderer.render_module(&module)
            }
            Converter::AutoObject => Ok(object_markdown(decl)),
            Converter::RawObject => Ok(decl.doc_text().to_string()),
            Converter::Markdown => match &decl.kind {
                DeclarationKind::Value {
                    markdown: Some(markdown),
                    ..
                } => Ok(markdown.clone()),
                _ => Err(ApiDocError::MissingCapability {
                    name: decl.name.clone(),
                    capability: "a markdown-rendering contract".to_string(),
                }),
            },
            Converter::TypeOf => Ok(decl.type_label().to_string()),
            Converter::AutoDataclass => {
                if !decl.is_record() {
                    return Err(ApiDocError::MissingCapability {
                        name: decl.name.clone(),
                        capability: "a structured-record field schema".to_string(),
                    });
                }
                let class = self.builder.class(decl)?;
                self.renderer.render_class(&class)
            }
        }
    }

    /// Render a page, expanding every converter call in it.
    ///
    /// When a converter fails, its own error is returned rather than the
    /// template engine's wrapper around it.
    pub fn render_page(self, text: &str) -> Result<String> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(PAGE_TEMPLATE, &name_positional_args(text))
            .map_err(|e| ApiDocError::TemplateSyntax {
                template: PAGE_TEMPLATE.to_string(),
                message: describe(&e),
            })?;

        let context = Arc::new(self);
        let failure: Arc<Mutex<Option<ApiDocError>>> = Arc::default();
        for converter in Converter::ALL {
            let context = Arc::clone(&context);
            let failure = Arc::clone(&failure);
            tera.register_function(
                converter.name(),
                move |args: &HashMap<String, Value>| -> tera::Result<Value> {
                    let path = path_argument(converter, args)?;
                    context
                        .convert(converter, &path)
                        .map(Value::String)
                        .map_err(|err| {
                            let message = err.to_string();
                            if let Ok(mut slot) = failure.lock() {
                                slot.get_or_insert(err);
                            }
                            tera::Error::msg(message)
                        })
                },
            );
        }

        match tera.render(PAGE_TEMPLATE, &Context::new()) {
            Ok(page) => Ok(page),
            Err(err) => {
                let captured = failure.lock().ok().and_then(|mut slot| slot.take());
                Err(captured.unwrap_or_else(|| ApiDocError::TemplateRender {
                    template: PAGE_TEMPLATE.to_string(),
                    message: describe(&err),
                }))
            }
        }
    }
}

/// Pull the declaration path out of a converter's arguments.
///
/// The path is passed as `path`; any single argument is accepted as well.
fn path_argument(converter: Converter, args: &HashMap<String, Value>) -> tera::Result<String> {
    let value = match args.get("path") {
        Some(value) => Some(value),
        None if args.len() == 1 => args.values().next(),
        None => None,
    };
    let Some(value) = value else {
        return Err(tera::Error::msg(format!(
            "{converter} expects a single `path` argument"
        )));
    };
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| tera::Error::msg(format!("{converter} expects a string path, got {value}")))
}

/// Rewrite `func("x")` into `func(path="x")` inside expression blocks.
fn name_positional_args(text: &str) -> String {
    EXPRESSION
        .replace_all(text, |block: &Captures| {
            POSITIONAL_CALL
                .replace_all(&block[0], "${func}(path=${arg})")
                .into_owned()
        })
        .into_owned()
}

/// Markdown for a declaration's structured docstring.
///
/// Classes list only the names of their documented parameters. Everything
/// else gets the summary, the extended description and one heading per
/// documented parameter.
fn object_markdown(decl: &Declaration) -> String {
    let doc = StructuredDocstring::parse(decl.doc_text());
    let header = format!("## {}\n", decl.name);
    if decl.is_class() {
        let listing = doc
            .parameters
            .iter()
            .map(|p| format!("- {}", p.name))
            .collect::<Vec<_>>()
            .join("\n");
        return format!("{header}\n\n{listing}\n\n");
    }
    let params = doc
        .parameters
        .iter()
        .map(|p| format!("### {}\n\n{}", p.name, p.description))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "{header}\n\n{}\n\n{}\n\n{params}\n\n\n\n",
        doc.summary, doc.extended
    )
}
