use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::error::Error;
use crate::types::{Document, Element, ElementKind};

/// Compiled markup patterns shared across all documents in a scan.
struct Patterns {
    /// Matches one attribute: name, then a quoted or bare value.
    attr: Regex,
    /// Matches the bare HTML5 doctype with no external identifier.
    doctype: Regex,
    /// Matches an opening `a`, `link`, or `source` tag and its attributes.
    tag: Regex,
}

impl Patterns {
    /// # Panics
    ///
    /// Panics if a hardcoded pattern is invalid (compile-time invariant).
    fn new() -> Self {
        Self {
            attr: Regex::new(r#"(?i)([a-zA-Z][a-zA-Z0-9-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#)
                .expect("valid regex"),
            doctype: Regex::new(r"(?i)<!doctype\s+html\s*>").expect("valid regex"),
            tag: Regex::new(r"(?i)<(a|link|source)\b([^>]*)>").expect("valid regex"),
        }
    }
}

/// Scan all HTML documents under `root` and extract candidate elements.
///
/// The scanner works line by line, so element line numbers fall out of the
/// walk directly. Tags split across lines are not matched; the checker only
/// sees what the scanner produces.
///
/// # Errors
///
/// Returns `Error::DocumentUnreadable` if a matched document cannot be read.
pub fn scan(root: &Path) -> Result<Vec<Document>, Error> {
    let patterns = Patterns::new();
    let mut documents = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext == "html" || ext == "htm")
        })
    {
        let doc_path = entry.path();
        let relative = doc_path.strip_prefix(root).unwrap_or(doc_path).to_path_buf();

        let content =
            std::fs::read_to_string(doc_path).map_err(|e| Error::DocumentUnreadable {
                path: doc_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        documents.push(scan_content(&content, relative, &patterns));
    }

    Ok(documents)
}

/// Extract candidate elements and the doctype flag from one document.
fn scan_content(content: &str, path: PathBuf, patterns: &Patterns) -> Document {
    let mut elements = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line_number = u32::try_from(index.saturating_add(1)).unwrap_or(u32::MAX);
        extract_elements_from_line(line, line_number, patterns, &mut elements);
    }

    Document {
        elements,
        html5_doctype: patterns.doctype.is_match(content),
        path,
    }
}

/// Extract candidate elements from a single line of markup.
fn extract_elements_from_line(
    line: &str,
    line_number: u32,
    patterns: &Patterns,
    elements: &mut Vec<Element>,
) {
    for cap in patterns.tag.captures_iter(line) {
        let Some(kind) = element_kind(&cap[1]) else {
            continue;
        };
        let attrs = &cap[2];

        elements.push(Element {
            content: cap[0].to_string(),
            crossorigin: attr_value(attrs, "crossorigin", patterns),
            integrity: attr_value(attrs, "integrity", patterns),
            kind,
            line: line_number,
            raw_href: attr_value(attrs, kind.attr_name(), patterns),
            rel: attr_value(attrs, "rel", patterns),
        });
    }
}

/// Map a matched tag name to its element kind.
fn element_kind(tag: &str) -> Option<ElementKind> {
    match tag.to_ascii_lowercase().as_str() {
        "a" => Some(ElementKind::Anchor),
        "link" => Some(ElementKind::Link),
        "source" => Some(ElementKind::MediaSource),
        _ => None,
    }
}

/// Find the value of a named attribute in a tag's attribute string.
fn attr_value(attrs: &str, name: &str, patterns: &Patterns) -> Option<String> {
    for cap in patterns.attr.captures_iter(attrs) {
        if !cap[1].eq_ignore_ascii_case(name) {
            continue;
        }
        let value = cap
            .get(2)
            .or_else(|| cap.get(3))
            .or_else(|| cap.get(4))
            .map(|m| m.as_str().to_string());
        return value;
    }
    None
}
