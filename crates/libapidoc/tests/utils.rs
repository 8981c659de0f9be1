// Dead code detection breaks here, because the integration test crates all use a disjoint set of
// the pub items.
#![allow(dead_code)]

use libapidoc::{
    ApiDoc, Declaration, DeclarationIndex,
    index::{Annotation, CallableSignature, MethodBinding, Param, RecordField},
};
use pretty_assertions::assert_eq;

pub fn normalize_whitespace(s: &str) -> String {
    let lines: Vec<&str> = s
        .lines()
        .map(|line| line.trim_end()) // Remove trailing whitespace
        .filter(|line| !line.is_empty()) // Remove blank lines
        .collect();

    if lines.is_empty() {
        return String::new();
    }

    // Find the minimum indentation
    let min_indent = lines
        .iter()
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    lines
        .into_iter()
        .map(|line| &line[min_indent..])
        .collect::<Vec<&str>>()
        .join("\n")
}

pub fn sig(params: Vec<Param>) -> Option<CallableSignature> {
    Some(CallableSignature::new(params))
}

fn this() -> Param {
    Param::new("self")
}

/// A small package exercising every declaration kind.
pub fn sample_index() -> DeclarationIndex {
    let widget = Declaration::class(
        "Widget",
        sig(vec![
            this(),
            Param::new("size")
                .with_annotation(Annotation::named("int"))
                .with_default("1"),
        ]),
    )
    .with_doc("A resizable widget.")
    .with_member(
        Declaration::method("draw", MethodBinding::Instance, sig(vec![this()])).with_doc("Draw it."),
    )
    .with_member(Declaration::method("create", MethodBinding::Static, sig(vec![])).with_doc("Make one."))
    .with_member(Declaration::method(
        "from_size",
        MethodBinding::Type,
        sig(vec![Param::new("cls"), Param::new("size")]),
    ))
    .with_member(Declaration::method(
        "area",
        MethodBinding::Accessor,
        Some(CallableSignature::new(vec![this()]).with_returns(Annotation::named("float"))),
    ))
    .with_member(
        Declaration::method("__call__", MethodBinding::Instance, sig(vec![this()]))
            .with_include_in_docs(true)
            .with_doc("Invoke."),
    )
    .with_member(Declaration::method("__repr__", MethodBinding::Instance, sig(vec![this()])))
    .with_member(Declaration::method("_helper", MethodBinding::Instance, sig(vec![this()])))
    .with_member(Declaration::value("kind", "str", "'widget'"));

    let point = Declaration::record(
        "Point",
        vec![
            RecordField::new("x", Some(Annotation::named("float"))),
            RecordField::new("y", Some(Annotation::named("float"))),
        ],
    )
    .with_doc("A point.");

    let area = Declaration::function(
        "area",
        Some(
            CallableSignature::new(vec![
                Param::new("width").with_annotation(Annotation::named("float")),
                Param::new("height")
                    .with_annotation(Annotation::named("float"))
                    .with_default("1.0"),
            ])
            .with_returns(Annotation::named("float")),
        ),
    )
    .with_doc(concat!(
        "Compute an area.\n\n",
        "Multiplies the two sides.\n\n",
        "Parameters\n",
        "----------\n",
        "width : float\n",
        "    The width.\n",
        "height : float\n",
        "    The height.",
    ));

    let loose = Declaration::module("loose")
        .with_doc("No export list here.")
        .with_member(Declaration::function("visible", sig(vec![])))
        .with_member(Declaration::function("_private", sig(vec![])))
        .with_member(Declaration::enumeration("Base", &[]));

    let shapes = Declaration::module("shapes")
        .with_doc("Shapes and helpers.")
        .with_exports(&["Widget", "Point", "Color", "area", "native"])
        .with_member(widget)
        .with_member(point)
        .with_member(Declaration::enumeration("Color", &["RED", "GREEN"]).with_doc("Colors."))
        .with_member(area)
        .with_member(Declaration::function("native", None))
        .with_member(Declaration::function("helper", sig(vec![])))
        .with_member(Declaration::value("VERSION", "str", "'1.0'").with_doc("Package version."))
        .with_member(
            Declaration::value("BANNER", "Banner", "Banner()").with_markdown("**Shapes** for all."),
        )
        .with_member(loose);

    DeclarationIndex::new(vec![shapes])
}

/// An ApiDoc over the sample index with the default configuration.
pub fn docs() -> ApiDoc {
    ApiDoc::new(sample_index())
}

/// Render a page and compare it to the expected markdown, ignoring blank
/// lines and trailing whitespace.
pub fn render(docs: ApiDoc, page: &str, expected_output: &str) {
    let rendered = docs.render_page(page).unwrap();
    assert_eq!(
        normalize_whitespace(&rendered),
        normalize_whitespace(expected_output)
    );
}

/// Render a page with the default configuration.
pub fn rt(page: &str, expected_output: &str) {
    render(docs(), page, expected_output);
}

pub fn render_err(docs: ApiDoc, page: &str, expected_error: &str) {
    let result = docs.render_page(page);

    assert!(
        result.is_err(),
        "Expected an error, but rendering succeeded"
    );
    let error_string = result.unwrap_err().to_string();

    assert_eq!(
        error_string, expected_error,
        "Error mismatch.\nExpected: {}\nGot: {}",
        expected_error, error_string
    );
}

#[macro_export]
macro_rules! gen_tests {
    ($prefix:ident, {
        $(rt {
            $rt_name:ident: {
                input: $rt_input:expr,
                output: $rt_output:expr
            }
        })*
        $(rt_custom {
            $rt_custom_name:ident: {
                docs: $rt_custom_docs:expr,
                input: $rt_custom_input:expr,
                output: $rt_custom_output:expr
            }
        })*
        $(rt_err {
            $rt_err_name:ident: {
                docs: $rt_err_docs:expr,
                input: $rt_err_input:expr,
                error: $rt_err_error:expr
            }
        })*
    }) => {
        mod $prefix {
            use super::*;

            $(
                #[test]
                fn $rt_name() {
                    rt($rt_input, $rt_output);
                }
            )*

            $(
                #[test]
                fn $rt_custom_name() {
                    let custom_docs = $rt_custom_docs;
                    render(custom_docs, $rt_custom_input, $rt_custom_output);
                }
            )*

            $(
                #[test]
                fn $rt_err_name() {
                    let custom_docs = $rt_err_docs;
                    render_err(custom_docs, $rt_err_input, $rt_err_error);
                }
            )*
        }
    };
}
