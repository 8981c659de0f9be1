//! Apidoc generates markdown API documentation from an index of declarations.
//!
//! Documentation is produced in two phases. First, a [`DeclarationIndex`]
//! describing modules, classes, functions, methods, enumerations and values is
//! built ahead of time and stored as JSON. Then [`ApiDoc`] resolves dotted
//! paths against the index, builds a document tree from the declarations it
//! finds, and renders that tree through user-configurable templates.
//!
//! ```no_run
//! use libapidoc::{ApiDoc, DeclarationIndex, RenderConfig};
//!
//! # fn main() -> libapidoc::Result<()> {
//! let index = DeclarationIndex::load("index.json")?;
//! let config = RenderConfig::load("apidoc.toml")?;
//! let docs = ApiDoc::new(index).with_config(config);
//! println!("{}", docs.render_page("{{ auto_module(\"pkg.shapes\") }}")?);
//! # Ok(())
//! # }
//! ```
//!
//! Docstrings may carry fenced code examples. When example execution is
//! enabled, each docstring's examples run in a fresh interpreter and their
//! output is inserted after them.

mod apidoc;
pub mod classify;
pub mod config;
pub mod docstring;
mod error;
pub mod examples;
mod highlight;
pub mod index;
mod keywords;
pub mod model;
mod page;
mod render;
mod resolver;

pub use crate::{
    apidoc::ApiDoc,
    classify::MethodKind,
    config::{ExampleConfig, RenderConfig, TemplateKind},
    docstring::StructuredDocstring,
    error::{ApiDocError, Result},
    examples::{ExampleExecutor, ExampleRunner, ProcessRunner},
    highlight::highlight_markdown,
    index::{Declaration, DeclarationIndex, DeclarationKind},
    keywords::escape_markdown_name,
    page::Converter,
    render::{Node, Renderer},
    resolver::NameResolver,
};
