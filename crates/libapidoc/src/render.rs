//! Template rendering of document entities.
//!
//! Every entity kind binds to one configured template. Rendering runs
//! bottom-up: a parent template receives its children as already-rendered
//! strings and never walks them itself.
//!
//! Slots available to every template:
//!
//! | slot | content |
//! |------|---------|
//! | `name` | entity name with underscores escaped for markdown |
//! | `raw_name` | entity name as declared |
//! | `docstring` | docstring, with example output spliced in when enabled |
//! | `summary`, `extended`, `parameters` | the structured docstring |
//! | `signature` | rendered signature (functions, methods, classes) |
//! | `params`, `returnval` | signature parts (signature template) |
//! | `kind` | method kind label (method template) |
//! | `fields` | `{name, type}` records (class templates) |
//! | `methods`, `normal_methods`, `staticmethods`, `classmethods`, `properties`, `dunder_methods`, `abstractprops` | rendered members (class templates) |
//! | `levels` | level names (enum template) |
//! | `classes`, `functions`, `enums` | rendered children (module template) |
//!
//! Slots that do not apply to an entity are bound to empty values, so a
//! template may reference any of them. Any other top-level name renders as
//! empty text; attribute lookups on bound values stay strict.

use std::error::Error as _;

use once_cell::sync::Lazy;
use regex::Regex;
use tera::{Context, Tera};
use tracing::debug;

use crate::{
    classify::MethodKind,
    config::{RenderConfig, TemplateKind},
    docstring::StructuredDocstring,
    error::{ApiDocError, Result},
    examples::ExampleExecutor,
    keywords::escape_markdown_name,
    model::{Class, ClassKind, Enumeration, Function, Method, Module, Signature},
};

/// Slots bound to an empty string unless the entity provides them.
const TEXT_SLOTS: &[&str] = &[
    "name",
    "raw_name",
    "docstring",
    "summary",
    "extended",
    "signature",
    "returnval",
    "kind",
];

/// Slots bound to an empty list unless the entity provides them.
const LIST_SLOTS: &[&str] = &[
    "params",
    "parameters",
    "fields",
    "levels",
    "methods",
    "normal_methods",
    "staticmethods",
    "classmethods",
    "properties",
    "dunder_methods",
    "abstractprops",
    "classes",
    "functions",
    "enums",
];

/// A renderable entity.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// A signature.
    Signature(&'a Signature),
    /// A free function.
    Function(&'a Function),
    /// A class member.
    Method(&'a Method),
    /// A class or structured record.
    Class(&'a Class),
    /// An enumeration.
    Enumeration(&'a Enumeration),
    /// A module.
    Module(&'a Module),
}

/// Renders document entities through the configured templates.
#[derive(Debug, Clone)]
pub struct Renderer {
    /// Parsed templates, registered under their option names.
    tera: Tera,
    /// Expands docstring examples, when enabled.
    examples: Option<ExampleExecutor>,
}

impl Renderer {
    /// Parse every configured template.
    ///
    /// Fails with [`ApiDocError::TemplateSyntax`] naming the first template
    /// that does not parse.
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        for kind in TemplateKind::ALL {
            let name = kind.option_name();
            tera.add_raw_template(name, config.template(kind))
                .map_err(|e| ApiDocError::TemplateSyntax {
                    template: name.to_string(),
                    message: describe(&e),
                })?;
        }
        let examples = config
            .execute_and_insert_examples
            .then(|| ExampleExecutor::new(&config.examples));
        Ok(Self { tera, examples })
    }

    /// Replace the example executor. `None` disables example expansion.
    pub fn with_examples(mut self, examples: Option<ExampleExecutor>) -> Self {
        self.examples = examples;
        self
    }

    /// Render any entity.
    pub fn render(&self, node: Node<'_>) -> Result<String> {
        match node {
            Node::Signature(signature) => self.render_signature(signature),
            Node::Function(function) => self.render_function(function),
            Node::Method(method) => self.render_method(method),
            Node::Class(class) => self.render_class(class),
            Node::Enumeration(enumeration) => self.render_enum(enumeration),
            Node::Module(module) => self.render_module(module),
        }
    }

    /// Docstring text as it appears in output, with example output spliced in
    /// when example execution is enabled.
    pub fn docstring(&self, text: &str) -> Result<String> {
        match &self.examples {
            Some(executor) => executor.expand(text),
            None => Ok(text.to_string()),
        }
    }

    /// Render a signature.
    pub fn render_signature(&self, signature: &Signature) -> Result<String> {
        let mut context = slot_defaults();
        bind_name(&mut context, &signature.name);
        context.insert("params", &signature.params);
        context.insert("returnval", &signature.return_val);
        self.render_template(TemplateKind::Signature, &context)
    }

    /// Render a free function.
    pub fn render_function(&self, function: &Function) -> Result<String> {
        let mut context = slot_defaults();
        bind_name(&mut context, &function.name);
        self.bind_docstring(&mut context, &function.docstring)?;
        context.insert("signature", &self.render_signature(&function.signature)?);
        self.render_template(TemplateKind::Function, &context)
    }

    /// Render a class member.
    pub fn render_method(&self, method: &Method) -> Result<String> {
        let mut context = slot_defaults();
        bind_name(&mut context, &method.name);
        self.bind_docstring(&mut context, &method.docstring)?;
        context.insert("signature", &self.render_signature(&method.signature)?);
        context.insert("kind", method.kind.label());
        self.render_template(TemplateKind::Method, &context)
    }

    /// Render a class, using the dataclass template for structured records.
    pub fn render_class(&self, class: &Class) -> Result<String> {
        let mut context = slot_defaults();
        bind_name(&mut context, &class.name);
        self.bind_docstring(&mut context, &class.docstring)?;
        context.insert("signature", &self.render_signature(&class.signature)?);
        context.insert("fields", &class.fields);

        let rendered = class
            .methods
            .iter()
            .map(|m| Ok((m.kind, self.render_method(m)?)))
            .collect::<Result<Vec<_>>>()?;
        let of_kind = |kind: MethodKind| -> Vec<&str> {
            rendered
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, text)| text.as_str())
                .collect()
        };
        let all: Vec<&str> = rendered.iter().map(|(_, text)| text.as_str()).collect();
        context.insert("methods", &all);
        context.insert("normal_methods", &of_kind(MethodKind::Normal));
        context.insert("staticmethods", &of_kind(MethodKind::Static));
        context.insert("classmethods", &of_kind(MethodKind::Class));
        context.insert("properties", &of_kind(MethodKind::Property));
        context.insert("dunder_methods", &of_kind(MethodKind::Dunder));
        context.insert("abstractprops", &of_kind(MethodKind::AbstractProperty));

        let kind = match class.kind {
            ClassKind::Normal => TemplateKind::Class,
            ClassKind::StructuredRecord => TemplateKind::Dataclass,
        };
        self.render_template(kind, &context)
    }

    /// Render an enumeration.
    pub fn render_enum(&self, enumeration: &Enumeration) -> Result<String> {
        let mut context = slot_defaults();
        bind_name(&mut context, &enumeration.name);
        self.bind_docstring(&mut context, &enumeration.docstring)?;
        context.insert("levels", &enumeration.levels);
        self.render_template(TemplateKind::Enum, &context)
    }

    /// Render a module and everything it contains.
    pub fn render_module(&self, module: &Module) -> Result<String> {
        let mut context = slot_defaults();
        bind_name(&mut context, &module.name);
        self.bind_docstring(&mut context, &module.docstring)?;

        let classes = module
            .classes
            .iter()
            .map(|c| self.render_class(c))
            .collect::<Result<Vec<_>>>()?;
        let functions = module
            .functions
            .iter()
            .map(|f| self.render_function(f))
            .collect::<Result<Vec<_>>>()?;
        let enums = module
            .enums
            .iter()
            .map(|e| self.render_enum(e))
            .collect::<Result<Vec<_>>>()?;
        context.insert("classes", &classes);
        context.insert("functions", &functions);
        context.insert("enums", &enums);
        self.render_template(TemplateKind::Module, &context)
    }

    /// Bind the docstring and its structured parts.
    fn bind_docstring(&self, context: &mut Context, docstring: &str) -> Result<()> {
        let structured = StructuredDocstring::parse(docstring);
        context.insert("docstring", &self.docstring(docstring)?);
        context.insert("summary", &structured.summary);
        context.insert("extended", &structured.extended);
        context.insert("parameters", &structured.parameters);
        Ok(())
    }

    /// Render one registered template.
    ///
    /// Unknown top-level names are bound to empty text and the render is
    /// retried; each retry binds a new name, so the loop ends.
    fn render_template(&self, kind: TemplateKind, context: &Context) -> Result<String> {
        let name = kind.option_name();
        debug!(template = name, "rendering");
        let mut context = context.clone();
        loop {
            let err = match self.tera.render(name, &context) {
                Ok(rendered) => return Ok(rendered),
                Err(e) => e,
            };
            let message = describe(&err);
            match missing_variable(&message) {
                Some(variable) if !context.contains_key(variable) => {
                    debug!(template = name, variable, "binding unknown slot as empty");
                    context.insert(variable, "");
                }
                _ => {
                    return Err(ApiDocError::TemplateRender {
                        template: name.to_string(),
                        message,
                    });
                }
            }
        }
    }
}

/// Matches the engine's report of an undefined top-level name.
static MISSING_VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Variable `([A-Za-z_][A-Za-z0-9_]*)` not found in context").expect("valid regex")
});

/// The undefined top-level name a render error reports, if any.
fn missing_variable(message: &str) -> Option<&str> {
    MISSING_VARIABLE
        .captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// A context with every slot bound to an empty value.
fn slot_defaults() -> Context {
    let mut context = Context::new();
    for slot in TEXT_SLOTS {
        context.insert(*slot, "");
    }
    for slot in LIST_SLOTS {
        context.insert(*slot, &Vec::<String>::new());
    }
    context
}

/// Bind the escaped and raw forms of a name.
fn bind_name(context: &mut Context, name: &str) {
    context.insert("name", &escape_markdown_name(name));
    context.insert("raw_name", name);
}

/// Flatten a template error and its causes into one message.
pub fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;
    use pretty_assertions::assert_eq;

    fn signature(name: &str, params: &[&str], return_val: &str) -> Signature {
        Signature {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            return_val: return_val.to_string(),
        }
    }

    fn method(name: &str, kind: MethodKind) -> Method {
        Method {
            name: name.to_string(),
            kind,
            signature: signature(name, &["self"], ""),
            docstring: format!("Docs for {name}."),
        }
    }

    fn custom(kind: TemplateKind, text: &str) -> Result<Renderer> {
        Renderer::new(&RenderConfig::default().with_template(kind, text))
    }

    #[test]
    fn test_render_signature() -> Result<()> {
        let renderer = Renderer::new(&RenderConfig::default())?;
        assert_eq!(
            renderer.render_signature(&signature("add", &["x: int", "y=1"], "int"))?,
            "(x: int, y=1) -> int"
        );
        assert_eq!(renderer.render_signature(&signature("noop", &[], ""))?, "()");
        Ok(())
    }

    #[test]
    fn test_method_name_is_escaped() -> Result<()> {
        let renderer = custom(TemplateKind::Method, "{{ name }}|{{ raw_name }}|{{ kind }}")?;
        assert_eq!(
            renderer.render_method(&method("do_thing", MethodKind::Static))?,
            r"do\_thing|do_thing|static method"
        );

        let renderer = Renderer::new(&RenderConfig::default())?;
        let rendered = renderer.render_method(&method("do_thing", MethodKind::Normal))?;
        assert!(rendered.contains(r"##### do\_thing"));
        assert!(rendered.contains("do_thing(self)"));
        Ok(())
    }

    #[test]
    fn test_missing_slots_render_empty() -> Result<()> {
        let renderer = custom(TemplateKind::Signature, "[{{ docstring }}{{ classes | length }}]")?;
        assert_eq!(renderer.render_signature(&signature("f", &[], ""))?, "[0]");
        Ok(())
    }

    #[test]
    fn test_unknown_names_render_empty() -> Result<()> {
        let renderer = custom(
            TemplateKind::Signature,
            "{{ params | join(sep=\", \") }}[{{ source }}][{{ origin }}]",
        )?;
        assert_eq!(
            renderer.render_signature(&signature("f", &["x"], ""))?,
            "x[][]"
        );

        let renderer = custom(TemplateKind::Signature, "{{ returnval.missing }}")?;
        assert!(matches!(
            renderer.render_signature(&signature("f", &[], "")),
            Err(ApiDocError::TemplateRender { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_malformed_template_is_syntax_error() {
        let err = custom(TemplateKind::Class, "{% if name %}unclosed").unwrap_err();
        match err {
            ApiDocError::TemplateSyntax { template, .. } => assert_eq!(template, "class_template"),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_class_groups_members() -> Result<()> {
        let config = RenderConfig::default()
            .with_template(TemplateKind::Method, "{{ raw_name }}")
            .with_template(
                TemplateKind::Class,
                "{{ raw_name }}:n={{ normal_methods | join(sep=\",\") }};s={{ staticmethods | join(sep=\",\") }};d={{ dunder_methods | join(sep=\",\") }};all={{ methods | length }}",
            );
        let renderer = Renderer::new(&config)?;
        let class = Class {
            name: "Widget".into(),
            docstring: String::new(),
            kind: ClassKind::Normal,
            signature: signature("Widget", &[], ""),
            fields: Vec::new(),
            methods: vec![
                method("__call__", MethodKind::Dunder),
                method("draw", MethodKind::Normal),
                method("make", MethodKind::Static),
                method("paint", MethodKind::Normal),
            ],
        };
        assert_eq!(
            renderer.render_class(&class)?,
            "Widget:n=draw,paint;s=make;d=__call__;all=4"
        );
        Ok(())
    }

    #[test]
    fn test_record_uses_dataclass_template() -> Result<()> {
        let renderer = Renderer::new(&RenderConfig::default())?;
        let class = Class {
            name: "Point".into(),
            docstring: "A point.".into(),
            kind: ClassKind::StructuredRecord,
            signature: signature("Point", &["x: float", "y: float"], ""),
            fields: vec![
                Field { name: "x".into(), type_: "float".into() },
                Field { name: "y".into(), type_: "float".into() },
            ],
            methods: Vec::new(),
        };
        let rendered = renderer.render_class(&class)?;
        assert!(rendered.contains("### Point"));
        assert!(rendered.contains("- x: float\n- y: float"));
        assert!(!rendered.contains("#### Methods"));
        Ok(())
    }

    #[test]
    fn test_empty_module_has_no_section_headers() -> Result<()> {
        let renderer = Renderer::new(&RenderConfig::default())?;
        let module = Module {
            name: "empty_mod".into(),
            docstring: "Nothing here.".into(),
            functions: Vec::new(),
            classes: Vec::new(),
            enums: Vec::new(),
        };
        let rendered = renderer.render(Node::Module(&module))?;
        assert!(rendered.contains(r"# empty\_mod"));
        assert!(rendered.contains("Nothing here."));
        assert!(!rendered.contains("## Classes"));
        assert!(!rendered.contains("## Functions"));
        assert!(!rendered.contains("## Enumerations"));
        Ok(())
    }

    #[test]
    fn test_structured_docstring_slots() -> Result<()> {
        let renderer = custom(
            TemplateKind::Function,
            "{{ summary }}|{% for p in parameters %}{{ p.name }}={{ p.description }}{% endfor %}",
        )?;
        let function = Function {
            name: "add_one".into(),
            signature: signature("add_one", &["x"], ""),
            docstring: "Adds one.\n\nParameters\n----------\nx : int\n    value".into(),
        };
        assert_eq!(renderer.render_function(&function)?, "Adds one.|x=value");
        Ok(())
    }

    #[test]
    fn test_render_is_idempotent() -> Result<()> {
        let renderer = Renderer::new(&RenderConfig::default())?;
        let module = Module {
            name: "m".into(),
            docstring: String::new(),
            functions: vec![Function {
                name: "f".into(),
                signature: signature("f", &["a"], "int"),
                docstring: "Doc.".into(),
            }],
            classes: Vec::new(),
            enums: vec![Enumeration {
                name: "Mode".into(),
                levels: vec!["ON".into(), "OFF".into()],
                docstring: String::new(),
            }],
        };
        assert_eq!(
            renderer.render(Node::Module(&module))?,
            renderer.render(Node::Module(&module))?
        );
        Ok(())
    }
}
