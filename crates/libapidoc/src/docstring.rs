//! Structuring of semi-structured docstrings.
//!
//! Docstrings follow the numpy convention: a summary paragraph, an optional
//! free-text body, then sections introduced by a title underlined with dashes:
//!
//! ```text
//! Adds one.
//!
//! Parameters
//! ----------
//! x : int
//!     value
//! ```
//!
//! Parsing never fails. Missing sections produce empty fields, and sections
//! with titles outside the recognized set are kept verbatim in
//! [`StructuredDocstring::extended`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// `name : type` entry headers.
static ENTRY_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>[^:]*?)\s*:\s*(?P<ty>.*)$").expect("valid regex"));

/// Section titles whose entries are parameters.
const PARAMETER_SECTIONS: &[&str] = &["Parameters", "Other Parameters"];
/// Section titles whose entries describe returned values.
const RETURN_SECTIONS: &[&str] = &["Returns", "Yields", "Receives"];
/// Other section titles that are recognized and kept as titled sections.
const OTHER_SECTIONS: &[&str] = &[
    "Attributes",
    "Methods",
    "Raises",
    "Warns",
    "Warnings",
    "See Also",
    "Notes",
    "References",
    "Examples",
];

/// A documented parameter or return value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocParameter {
    /// Entry name. Empty for return entries that only give a type.
    pub name: String,
    /// Declared type, if the entry gives one.
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Free-text description.
    pub description: String,
}

/// A recognized section kept in its original form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocSection {
    /// Canonical section title.
    pub title: String,
    /// Dedented section body.
    pub body: String,
}

/// The parsed form of a docstring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructuredDocstring {
    /// The first paragraph, joined onto one line.
    pub summary: String,
    /// The remaining free text, plus any unrecognized sections.
    pub extended: String,
    /// Documented parameters, in order.
    pub parameters: Vec<DocParameter>,
    /// Documented return values, in order.
    pub returns: Vec<DocParameter>,
    /// Other recognized sections, in order.
    pub sections: Vec<DocSection>,
}

impl StructuredDocstring {
    /// Parse raw docstring text.
    pub fn parse(text: &str) -> Self {
        let cleaned = clean_doc(text);
        let lines: Vec<&str> = cleaned.lines().collect();

        let mut headers: Vec<usize> = Vec::new();
        for i in 0..lines.len() {
            // An underline is never the title of the next section.
            if headers.last().is_some_and(|&h| h + 1 == i) {
                continue;
            }
            if is_section_header(&lines, i) {
                headers.push(i);
            }
        }
        let preamble_end = headers.first().copied().unwrap_or(lines.len());

        let mut paragraphs = paragraphs(&lines[..preamble_end]).into_iter();
        let summary = paragraphs
            .next()
            .map(|p| p.iter().map(|l| l.trim()).collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        let mut extended: Vec<String> = paragraphs.map(|p| p.join("\n")).collect();

        let mut doc = Self {
            summary,
            ..Self::default()
        };

        for (n, &start) in headers.iter().enumerate() {
            let end = headers.get(n + 1).copied().unwrap_or(lines.len());
            let title = lines[start].trim();
            let body = lines.get(start + 2..end).unwrap_or_default();

            if let Some(canonical) = recognized(PARAMETER_SECTIONS, title) {
                tracing::trace!(section = canonical, "parsing parameter section");
                doc.parameters.extend(parse_entries(body, false));
            } else if recognized(RETURN_SECTIONS, title).is_some() {
                doc.returns.extend(parse_entries(body, true));
            } else if let Some(canonical) = recognized(OTHER_SECTIONS, title) {
                doc.sections.push(DocSection {
                    title: canonical.to_string(),
                    body: dedent(body).trim().to_string(),
                });
            } else {
                extended.push(lines[start..end].join("\n").trim_end().to_string());
            }
        }

        doc.extended = extended.join("\n\n");
        doc
    }

    /// Names of the documented parameters.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Look up a recognized section by title.
    pub fn section(&self, title: &str) -> Option<&DocSection> {
        self.sections.iter().find(|s| s.title == title)
    }
}

/// Match `title` against a list of section names, ignoring case.
fn recognized(names: &[&'static str], title: &str) -> Option<&'static str> {
    names
        .iter()
        .copied()
        .find(|name| name.eq_ignore_ascii_case(title))
}

/// A section header is a non-blank line underlined by at least as many dashes.
fn is_section_header(lines: &[&str], i: usize) -> bool {
    let Some(underline) = lines.get(i + 1) else {
        return false;
    };
    let title = lines[i].trim();
    let underline = underline.trim();
    !title.is_empty()
        && underline.len() >= title.len().max(3)
        && underline.chars().all(|c| c == '-')
}

/// Split lines into paragraphs separated by blank lines.
fn paragraphs<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(*line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Parse `name : type` entries followed by indented descriptions.
///
/// Return entries without a colon name a type only; parameter entries
/// without a colon name a parameter only.
fn parse_entries(body: &[&str], returns: bool) -> Vec<DocParameter> {
    let body = dedent(body);
    let mut entries: Vec<(DocParameter, Vec<&str>)> = Vec::new();

    for line in body.lines() {
        let indented = line.starts_with(' ') || line.starts_with('\t');
        if !indented && !line.trim().is_empty() {
            let header = line.trim();
            let entry = match ENTRY_HEADER.captures(header) {
                Some(caps) => DocParameter {
                    name: caps["name"].to_string(),
                    type_name: Some(caps["ty"].trim().to_string()).filter(|t| !t.is_empty()),
                    description: String::new(),
                },
                None if returns => DocParameter {
                    name: String::new(),
                    type_name: Some(header.to_string()),
                    description: String::new(),
                },
                None => DocParameter {
                    name: header.to_string(),
                    type_name: None,
                    description: String::new(),
                },
            };
            entries.push((entry, Vec::new()));
        } else if let Some((_, description)) = entries.last_mut() {
            description.push(line);
        }
    }

    entries
        .into_iter()
        .map(|(mut entry, description)| {
            entry.description = join_description(&description);
            entry
        })
        .collect()
}

/// Join description lines, keeping blank-line paragraph breaks.
fn join_description(lines: &[&str]) -> String {
    paragraphs(lines)
        .iter()
        .map(|p| p.iter().map(|l| l.trim()).collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Width of a line's leading whitespace.
fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Remove the common leading whitespace from all non-blank lines.
pub fn dedent(lines: &[&str]) -> String {
    let common = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_width(l))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| l.get(common..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalize docstring indentation.
///
/// The first line is stripped of leading whitespace, the common indentation
/// of the remaining lines is removed, and leading and trailing blank lines
/// are dropped.
pub fn clean_doc(text: &str) -> String {
    let expanded = text.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();
    let Some((first, rest)) = lines.split_first() else {
        return String::new();
    };
    let mut out = vec![first.trim_start().to_string()];
    out.extend(dedent(rest).lines().map(|l| l.trim_end().to_string()));

    while out.first().is_some_and(|l| l.trim().is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|l| l.trim().is_empty()) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parameters_section() {
        let doc = StructuredDocstring::parse("Adds one.\n\nParameters\n----------\nx : int\n    value");
        assert_eq!(doc.summary, "Adds one.");
        assert_eq!(doc.extended, "");
        assert_eq!(
            doc.parameters,
            vec![DocParameter {
                name: "x".into(),
                type_name: Some("int".into()),
                description: "value".into(),
            }]
        );
    }

    #[test]
    fn test_summary_and_extended() {
        let doc = StructuredDocstring::parse(
            "Compute the thing\n    across two lines.\n\n    More detail here.\n    And here.\n\n    A second paragraph.\n    ",
        );
        assert_eq!(doc.summary, "Compute the thing across two lines.");
        assert_eq!(doc.extended, "More detail here.\nAnd here.\n\nA second paragraph.");
        assert!(doc.parameters.is_empty());
    }

    #[test]
    fn test_missing_parameters_is_empty() {
        let doc = StructuredDocstring::parse("Just a summary.");
        assert_eq!(doc.summary, "Just a summary.");
        assert!(doc.parameters.is_empty());
        assert!(doc.returns.is_empty());
        assert_eq!(StructuredDocstring::parse(""), StructuredDocstring::default());
    }

    #[test]
    fn test_multiple_sections() {
        let text = r#"Scale a vector.

        Parameters
        ----------
        v : Vector
            The vector to scale.

            Must be finite.
        factor
            Multiplier.
        *args

        Returns
        -------
        Vector
            The scaled vector.

        Raises
        ------
        ValueError
            If the factor is negative.

        Custom Thing
        ------------
        Kept as written.
        "#;
        let doc = StructuredDocstring::parse(text);
        assert_eq!(doc.summary, "Scale a vector.");
        assert_eq!(doc.parameter_names(), vec!["v", "factor", "*args"]);
        assert_eq!(doc.parameters[0].description, "The vector to scale.\n\nMust be finite.");
        assert_eq!(doc.parameters[1].type_name, None);
        assert_eq!(doc.parameters[2].description, "");
        assert_eq!(
            doc.returns,
            vec![DocParameter {
                name: String::new(),
                type_name: Some("Vector".into()),
                description: "The scaled vector.".into(),
            }]
        );
        assert_eq!(
            doc.section("Raises").map(|s| s.body.as_str()),
            Some("ValueError\n    If the factor is negative.")
        );
        assert_eq!(doc.extended, "Custom Thing\n------------\nKept as written.");
    }

    #[test]
    fn test_other_parameters_are_appended() {
        let doc = StructuredDocstring::parse(
            "Summary.\n\nParameters\n----------\na : int\n    first\n\nOther Parameters\n----------------\nb : str\n    second\n",
        );
        assert_eq!(doc.parameter_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_short_underline_is_not_a_header() {
        let doc = StructuredDocstring::parse("Summary.\n\nParameters\n--\nx : int\n");
        assert!(doc.parameters.is_empty());
        assert_eq!(doc.extended, "Parameters\n--\nx : int");
    }

    #[test]
    fn test_repeated_underline_is_section_body() {
        let doc = StructuredDocstring::parse("Summary.\n\nNotes\n-----\n-----\n");
        assert_eq!(doc.summary, "Summary.");
        assert_eq!(doc.section("Notes").map(|s| s.body.as_str()), Some("-----"));

        let doc = StructuredDocstring::parse("Summary.\n\n-----\n-----\n-----\n");
        assert_eq!(doc.summary, "Summary.");
        assert_eq!(doc.extended, "-----\n-----\n-----");
    }

    #[test]
    fn test_clean_doc() {
        assert_eq!(
            clean_doc("Summary\n    indented\n      nested\n\n"),
            "Summary\nindented\n  nested"
        );
        assert_eq!(clean_doc("\n  First\n    second\n"), "First\n  second");
        assert_eq!(clean_doc(""), "");
    }
}
