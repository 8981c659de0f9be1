use thiserror::Error;

/// Errors raised while resolving, building, rendering or expanding documentation.
#[derive(Error, Debug)]
pub enum ApiDocError {
    /// A dotted path did not resolve to a declaration.
    #[error("Could not resolve {path}: no declaration named '{segment}'")]
    Resolution {
        /// The full dotted path that was requested.
        path: String,
        /// The first segment that could not be located.
        segment: String,
    },

    /// A callable signature could not be extracted from a declaration.
    #[error("Cannot extract a signature from {name}: {reason}")]
    SignatureExtraction {
        /// Name of the offending declaration.
        name: String,
        /// Why extraction failed.
        reason: String,
    },

    /// A configured template could not be parsed.
    #[error("Malformed {template} template: {message}")]
    TemplateSyntax {
        /// Which template failed to parse.
        template: String,
        /// Parser diagnostics.
        message: String,
    },

    /// A template parsed, but failed while being rendered.
    #[error("Failed to render {template} template: {message}")]
    TemplateRender {
        /// Which template failed to render.
        template: String,
        /// Renderer diagnostics.
        message: String,
    },

    /// A declaration lacks the capability a converter requires.
    #[error("Could not convert {name}: declaration must expose {capability}")]
    MissingCapability {
        /// Name of the declaration passed to the converter.
        name: String,
        /// The capability the converter needed.
        capability: String,
    },

    /// An embedded example raised while executing.
    #[error("Example execution failed: {message}")]
    ExampleExecution {
        /// Interpreter diagnostics.
        message: String,
    },

    /// An embedded example did not finish in time.
    #[error("Example execution timed out after {seconds}s")]
    ExampleTimeout {
        /// The configured timeout.
        seconds: u64,
    },

    /// A module has no explicit export list while strict exports are required.
    #[error("Module {module} does not declare an export list")]
    MissingExports {
        /// Name of the module.
        module: String,
    },

    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a declaration index.
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse a configuration file.
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Syntax highlighting failed.
    #[error("Highlighting error: {0}")]
    Highlight(String),
}

impl From<syntect::Error> for ApiDocError {
    fn from(err: syntect::Error) -> Self {
        Self::Highlight(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiDocError>;
