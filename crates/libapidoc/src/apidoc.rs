use std::{fmt, sync::Arc};

use super::{
    config::RenderConfig,
    error::Result,
    examples::{ExampleExecutor, ExampleRunner},
    page::{Converter, PageContext},
    model::ModelBuilder,
    render::Renderer,
    resolver::NameResolver,
};

/// ApiDoc renders markdown documentation for declarations in an index.
///
/// Declarations are named by dotted paths such as `pkg.shapes.Circle`. Every
/// call resolves its declarations afresh and builds a new document tree, so
/// output always reflects the current index.
///
/// # Pages
///
/// A page is a template that calls converter functions:
///
/// - `auto_module(path)`: a module with its classes, enumerations and functions
/// - `auto_object(path)`: the structured docstring of any declaration
/// - `raw_object(path)`: the raw docstring of any declaration
/// - `markdown(path)`: the markdown a value declares for itself
/// - `typeof(path)`: the type name of any declaration
/// - `auto_dataclass(path)`: a structured-record class with its fields
#[derive(Clone)]
pub struct ApiDoc {
    /// Resolves dotted paths to declarations.
    resolver: Arc<dyn NameResolver + Send + Sync>,

    /// Templates and rendering options.
    config: RenderConfig,

    /// Overrides how examples are run when example execution is enabled.
    example_runner: Option<Arc<dyn ExampleRunner>>,
}

impl fmt::Debug for ApiDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiDoc")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiDoc {
    /// Creates an ApiDoc over `resolver` with the default configuration.
    pub fn new<R>(resolver: R) -> Self
    where
        R: NameResolver + Send + Sync + 'static,
    {
        Self {
            resolver: Arc::new(resolver),
            config: RenderConfig::default(),
            example_runner: None,
        }
    }

    /// Replaces the render configuration.
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs embedded examples with `runner` instead of the configured
    /// interpreter. Has no effect unless example execution is enabled.
    pub fn with_example_runner(mut self, runner: Arc<dyn ExampleRunner>) -> Self {
        self.example_runner = Some(runner);
        self
    }

    /// The active render configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Renders a module with all of its documented members.
    pub fn auto_module(&self, path: &str) -> Result<String> {
        self.convert(Converter::AutoModule, path)
    }

    /// Renders the structured docstring of any declaration.
    pub fn auto_object(&self, path: &str) -> Result<String> {
        self.convert(Converter::AutoObject, path)
    }

    /// Returns the raw docstring of any declaration.
    pub fn raw_object(&self, path: &str) -> Result<String> {
        self.convert(Converter::RawObject, path)
    }

    /// Returns the markdown a value declares for itself.
    pub fn markdown(&self, path: &str) -> Result<String> {
        self.convert(Converter::Markdown, path)
    }

    /// Returns the type name of any declaration.
    pub fn type_of(&self, path: &str) -> Result<String> {
        self.convert(Converter::TypeOf, path)
    }

    /// Renders a structured-record class with the dataclass template.
    pub fn auto_dataclass(&self, path: &str) -> Result<String> {
        self.convert(Converter::AutoDataclass, path)
    }

    /// Renders a page, expanding every converter call in it.
    ///
    /// The first failure aborts the page and is returned as is.
    pub fn render_page(&self, page: &str) -> Result<String> {
        self.context()?.render_page(page)
    }

    /// Apply a single converter to the declaration at `path`.
    pub fn convert(&self, converter: Converter, path: &str) -> Result<String> {
        self.context()?.convert(converter, path)
    }

    /// Build the per-render state. Templates are parsed here, so template
    /// errors surface before any declaration is resolved.
    fn context(&self) -> Result<PageContext> {
        let mut renderer = Renderer::new(&self.config)?;
        if self.config.execute_and_insert_examples
            && let Some(runner) = &self.example_runner
        {
            renderer = renderer.with_examples(Some(ExampleExecutor::with_runner(
                self.config.examples.language.clone(),
                Arc::clone(runner),
            )));
        }
        Ok(PageContext {
            resolver: Arc::clone(&self.resolver),
            builder: ModelBuilder::new().with_strict_exports(self.config.strict_exports),
            renderer,
        })
    }
}
