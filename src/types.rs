/// Core domain types for hrefcheck elements, diagnostics, and pending checks.
use std::path::PathBuf;

/// One validation finding. The checker appends these, never mutates or
/// removes them; ordering across documents is not a correctness property.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostic {
    /// Raw markup snippet of the offending element.
    pub content: String,
    /// One-based line number in the source document.
    pub line: u32,
    /// Human-readable description of the violation.
    pub message: String,
}

/// A scanned HTML document: its path and every candidate element found in it.
#[derive(Debug, Clone)]
pub struct Document {
    /// Candidate elements in source order.
    pub elements: Vec<Element>,
    /// Whether the doctype is the bare HTML5 form (`<!DOCTYPE html>` with no
    /// external identifier). HTML5 permits anchors without an href attribute.
    pub html5_doctype: bool,
    /// Document path relative to the scan root.
    pub path: PathBuf,
}

/// One link-bearing element occurrence discovered by the scanner.
/// Immutable after construction.
#[derive(Debug, Clone)]
pub struct Element {
    /// Raw markup snippet, kept for diagnostics.
    pub content: String,
    /// Value of the `crossorigin` attribute, if present.
    pub crossorigin: Option<String>,
    /// Value of the `integrity` attribute, if present.
    pub integrity: Option<String>,
    /// Which tag kind this element is.
    pub kind: ElementKind,
    /// One-based line number in the source document.
    pub line: u32,
    /// Raw href/src attribute value. `None` when the attribute is absent.
    pub raw_href: Option<String>,
    /// Value of the `rel` attribute, if present.
    pub rel: Option<String>,
}

/// The element kinds that carry checkable references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `<a href=...>`
    Anchor,
    /// `<link href=...>`, stylesheets and other resource links.
    Link,
    /// `<source src=...>`, media sources.
    MediaSource,
}

impl ElementKind {
    /// The attribute that carries the reference for this kind.
    pub fn attr_name(self) -> &'static str {
        match self {
            ElementKind::Anchor | ElementKind::Link => "href",
            ElementKind::MediaSource => "src",
        }
    }

    /// The tag name as it appears in markup.
    pub fn tag_name(self) -> &'static str {
        match self {
            ElementKind::Anchor => "a",
            ElementKind::Link => "link",
            ElementKind::MediaSource => "source",
        }
    }
}

/// An external reference queued for the remote resolver.
/// Not itself a diagnostic; reachability is resolved outside the core.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PendingCheck {
    /// One-based line number of the referencing element.
    pub line: u32,
    /// Absolute URL to probe.
    pub url: String,
}

/// Validation output for a single document.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Findings produced by the checker.
    pub diagnostics: Vec<Diagnostic>,
    /// External references deferred to the remote resolver.
    pub pending: Vec<PendingCheck>,
}

impl RunReport {
    /// Append one diagnostic for the given element.
    pub fn add_issue(&mut self, element: &Element, message: String) {
        self.diagnostics.push(Diagnostic {
            content: element.content.clone(),
            line: element.line,
            message,
        });
    }
}
