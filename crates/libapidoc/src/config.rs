//! Render configuration and the built-in template family.
//!
//! Templates use Tera syntax. Each template receives a fixed set of slots; see
//! [`crate::render`] for the full schema.

use std::{env, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable consulted for the default log level.
pub const LOG_LEVEL_ENV: &str = "APIDOC_LOG_LEVEL";

/// Built-in signature template.
pub const SIGNATURE_TEMPLATE: &str =
    r#"({{ params | join(sep=", ") }}){% if returnval %} -> {{ returnval }}{% endif %}"#;

/// Built-in function template.
pub const FUNCTION_TEMPLATE: &str = r#"

### {{ name }}

```python
def {{ raw_name }}{{ signature }}:
```

{{ docstring }}


"#;

/// Built-in method template.
pub const METHOD_TEMPLATE: &str = r#"

##### {{ name }}

```python
{{ raw_name }}{{ signature }}
```

{{ docstring }}


"#;

/// Built-in class template.
pub const CLASS_TEMPLATE: &str = r#"
### {{ name }}

{{ docstring }}

-----------------
{% if normal_methods %}
#### Methods
{% for m in normal_methods %}
{{ m }}
{% endfor %}
{% endif %}
{% if properties or abstractprops %}
#### Properties
{% for m in properties %}
{{ m }}
{% endfor %}
{% for m in abstractprops %}
{{ m }}
{% endfor %}
{% endif %}
{% if staticmethods %}
#### Staticmethods
{% for m in staticmethods %}
{{ m }}
{% endfor %}
{% endif %}
{% if classmethods %}
#### ClassMethods
{% for m in classmethods %}
{{ m }}
{% endfor %}
{% endif %}
{% if dunder_methods %}
#### Dunder Methods
{% for m in dunder_methods %}
{{ m }}
{% endfor %}
{% endif %}
"#;

/// Built-in template for structured-record classes.
pub const DATACLASS_TEMPLATE: &str = r#"

### {{ name }}

{{ docstring }}
{% if fields %}
#### Fields
{% for f in fields %}
- {{ f.name }}: {{ f.type }}
{%- endfor %}
{% endif %}
{% if methods %}
#### Methods
{% for m in methods %}
{{ m }}
{% endfor %}
{% endif %}
"#;

/// Built-in enumeration template.
pub const ENUM_TEMPLATE: &str = r#"

### {{ name }}

{{ docstring }}
{% for level in levels %}
- `{{ level }}`
{%- endfor %}

"#;

/// Built-in module template.
pub const MODULE_TEMPLATE: &str = r#"

# {{ name }}

{{ docstring }}
{% if classes %}
## Classes
-----------
{% for c in classes %}
{{ c }}
{% endfor %}
{% endif %}
{% if enums %}
## Enumerations
----------------
{% for e in enums %}
{{ e }}
{% endfor %}
{% endif %}
{% if functions %}
## Functions
-------------
{% for f in functions %}
{{ f }}
{% endfor %}
{% endif %}

"#;

/// The entity kinds that bind to a configurable template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// Parameter list and return annotation.
    Signature,
    /// Free functions.
    Function,
    /// Class members.
    Method,
    /// Plain classes.
    Class,
    /// Structured-record classes.
    Dataclass,
    /// Enumerations.
    Enum,
    /// Modules.
    Module,
}

impl TemplateKind {
    /// Every template kind, in bottom-up rendering order.
    pub const ALL: [Self; 7] = [
        Self::Signature,
        Self::Function,
        Self::Method,
        Self::Class,
        Self::Dataclass,
        Self::Enum,
        Self::Module,
    ];

    /// Name of the configuration option holding this template.
    pub fn option_name(self) -> &'static str {
        match self {
            Self::Signature => "signature_template",
            Self::Function => "function_template",
            Self::Method => "method_template",
            Self::Class => "class_template",
            Self::Dataclass => "dataclass_template",
            Self::Enum => "enum_template",
            Self::Module => "module_template",
        }
    }

    /// The built-in template text.
    pub fn default_template(self) -> &'static str {
        match self {
            Self::Signature => SIGNATURE_TEMPLATE,
            Self::Function => FUNCTION_TEMPLATE,
            Self::Method => METHOD_TEMPLATE,
            Self::Class => CLASS_TEMPLATE,
            Self::Dataclass => DATACLASS_TEMPLATE,
            Self::Enum => ENUM_TEMPLATE,
            Self::Module => MODULE_TEMPLATE,
        }
    }
}

/// How embedded examples are executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExampleConfig {
    /// Interpreter command line. The path of the script is appended.
    pub command: Vec<String>,
    /// Fence language tag that marks a code block as executable.
    pub language: String,
    /// Statement printing a marker line; `{marker}` is substituted.
    pub marker_statement: String,
    /// Seconds before a running example is killed.
    pub timeout_secs: u64,
}

impl Default for ExampleConfig {
    fn default() -> Self {
        Self {
            command: vec!["python3".to_string()],
            language: "python".to_string(),
            marker_statement: r#"print("{marker}")"#.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Options read at render time.
///
/// Empty template strings select the built-in default. A configuration is
/// passed explicitly into each render; nothing here is process-global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Template for signatures.
    pub signature_template: String,
    /// Template for free functions.
    pub function_template: String,
    /// Template for methods.
    pub method_template: String,
    /// Template for plain classes.
    pub class_template: String,
    /// Template for structured-record classes.
    pub dataclass_template: String,
    /// Template for enumerations.
    pub enum_template: String,
    /// Template for modules.
    pub module_template: String,
    /// Log filter directive for the host's subscriber.
    pub log_level: String,
    /// Whether code blocks in docstrings are executed and their output inserted.
    pub execute_and_insert_examples: bool,
    /// Whether modules without an export list are an error.
    pub strict_exports: bool,
    /// Example execution settings.
    pub examples: ExampleConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            signature_template: String::new(),
            function_template: String::new(),
            method_template: String::new(),
            class_template: String::new(),
            dataclass_template: String::new(),
            enum_template: String::new(),
            module_template: String::new(),
            log_level: env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "warn".to_string()),
            execute_and_insert_examples: false,
            strict_exports: false,
            examples: ExampleConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Parse a configuration from TOML.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// The effective template text for `kind`.
    pub fn template(&self, kind: TemplateKind) -> &str {
        let configured = match kind {
            TemplateKind::Signature => &self.signature_template,
            TemplateKind::Function => &self.function_template,
            TemplateKind::Method => &self.method_template,
            TemplateKind::Class => &self.class_template,
            TemplateKind::Dataclass => &self.dataclass_template,
            TemplateKind::Enum => &self.enum_template,
            TemplateKind::Module => &self.module_template,
        };
        if configured.trim().is_empty() {
            kind.default_template()
        } else {
            configured
        }
    }

    /// Override the template for `kind`.
    pub fn with_template(mut self, kind: TemplateKind, text: impl Into<String>) -> Self {
        let slot = match kind {
            TemplateKind::Signature => &mut self.signature_template,
            TemplateKind::Function => &mut self.function_template,
            TemplateKind::Method => &mut self.method_template,
            TemplateKind::Class => &mut self.class_template,
            TemplateKind::Dataclass => &mut self.dataclass_template,
            TemplateKind::Enum => &mut self.enum_template,
            TemplateKind::Module => &mut self.module_template,
        };
        *slot = text.into();
        self
    }

    /// Enables or disables execution of embedded examples.
    pub fn with_execute_examples(mut self, execute: bool) -> Self {
        self.execute_and_insert_examples = execute;
        self
    }

    /// Enables or disables the export-list requirement for modules.
    pub fn with_strict_exports(mut self, strict: bool) -> Self {
        self.strict_exports = strict;
        self
    }

    /// Replaces the example execution settings.
    pub fn with_examples(mut self, examples: ExampleConfig) -> Self {
        self.examples = examples;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_templates_use_defaults() {
        let config = RenderConfig::default();
        for kind in TemplateKind::ALL {
            assert_eq!(config.template(kind), kind.default_template());
        }
        let config = config.with_template(TemplateKind::Function, "  \n");
        assert_eq!(config.template(TemplateKind::Function), FUNCTION_TEMPLATE);
    }

    #[test]
    fn test_from_toml() -> Result<()> {
        let config = RenderConfig::from_toml_str(
            r#"
            function_template = "{{ name }}"
            execute_and_insert_examples = true
            log_level = "debug"

            [examples]
            command = ["sh"]
            timeout_secs = 5
            "#,
        )?;
        assert_eq!(config.template(TemplateKind::Function), "{{ name }}");
        assert_eq!(config.template(TemplateKind::Method), METHOD_TEMPLATE);
        assert!(config.execute_and_insert_examples);
        assert!(!config.strict_exports);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.examples.command, vec!["sh".to_string()]);
        assert_eq!(config.examples.language, "python");
        assert_eq!(config.examples.timeout_secs, 5);
        Ok(())
    }

    #[test]
    fn test_from_toml_rejects_bad_types() {
        assert!(RenderConfig::from_toml_str("execute_and_insert_examples = \"yes\"").is_err());
    }
}
