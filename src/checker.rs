//! The link-classification-and-validation core. Walks every candidate
//! element, classifies its reference, dispatches to the matching validators
//! in a fixed order, and accumulates diagnostics. Stateless across
//! references: each element is processed to completion independently, so
//! per-document reports can be merged in any order.

use std::path::{Component, Path, PathBuf};

use crate::config::Policy;
use crate::fstree::DocumentTree;
use crate::schemes::{self, SchemeRules};
use crate::types::{Document, Element, ElementKind, PendingCheck, RunReport};
use crate::urls::UrlFacts;

/// Closed classification over a reference's derived flags. The mapping is
/// total: flag combinations not covered by the named categories fall into
/// `Unclassified` and are reported, never silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Absolute http(s) reference to another host; queued for the external
    /// resolver.
    External,
    /// The reference is exactly `#`.
    HashOnly,
    /// Resolves within the local document set.
    Internal,
    /// The attribute is absent or blank.
    Missing,
    /// Recognized non-probeable scheme (`mailto`, `tel`, `ftp`, ...).
    NonHttpRemote,
    /// No category matched; reported as a diagnostic.
    Unclassified,
}

/// Pure classification of one reference. No I/O, no policy: the dispatch
/// policy (ordering, short-circuits, tolerances) lives in `check_element`.
pub fn classify(raw: &str, facts: &UrlFacts) -> Category {
    if raw.is_empty() {
        Category::Missing
    } else if raw == "#" {
        Category::HashOnly
    } else if facts.non_http_remote {
        Category::NonHttpRemote
    } else if !raw.starts_with('#') && !facts.internal && facts.remote {
        Category::External
    } else if facts.internal {
        Category::Internal
    } else {
        Category::Unclassified
    }
}

/// The validation orchestrator. Borrows its collaborators; owns nothing but
/// the compiled scheme grammars.
pub struct Checker<'a> {
    /// Injected policy: tolerances, the ignore predicate, the site host.
    policy: &'a Policy,
    /// Compiled grammars for the scheme handlers.
    rules: SchemeRules,
    /// Existence resolver for internal references.
    tree: &'a dyn DocumentTree,
}

impl<'a> Checker<'a> {
    /// Build a checker over the given policy and document tree.
    pub fn new(policy: &'a Policy, tree: &'a dyn DocumentTree) -> Self {
        Self {
            policy,
            rules: SchemeRules::new(),
            tree,
        }
    }

    /// Validate every candidate element in one document.
    pub fn check_document(&self, document: &Document) -> RunReport {
        let mut report = RunReport::default();
        for element in &document.elements {
            self.check_element(document, element, &mut report);
        }
        report
    }

    /// Validate one element. The steps run in a fixed order and
    /// short-circuit so that no reference is double-reported: an ignored
    /// reference gets nothing, a hash-only or invalid reference gets exactly
    /// one diagnostic, and the missing-reference check runs after the scheme
    /// handlers because a reference can have a recognized scheme and still
    /// be judged on other grounds.
    fn check_element(&self, document: &Document, element: &Element, report: &mut RunReport) {
        let raw = element.raw_href.as_deref().unwrap_or("").trim().to_string();

        if self.policy.is_ignored(&raw) {
            return;
        }

        let facts = UrlFacts::derive(&raw, self.policy.site_host());
        let category = classify(&raw, &facts);

        if category == Category::HashOnly {
            if !self.policy.allow_hash_href {
                report.add_issue(
                    element,
                    "linking to internal hash #, which points to nowhere".to_string(),
                );
            }
            return;
        }

        if !facts.valid {
            report.add_issue(element, format!("{raw} is an invalid URL"));
            return;
        }

        schemes::check(element, &facts, self.policy, &self.rules, report);

        match category {
            Category::Missing => self.check_missing(document, element, report),
            Category::NonHttpRemote => {},
            Category::External => self.check_external(element, &facts, report),
            Category::Internal => self.check_internal(document, element, &facts, report),
            Category::Unclassified => {
                report.add_issue(element, format!("{raw} could not be classified"));
            },
            // Handled above; classify is stable for a given input.
            Category::HashOnly => {},
        }
    }

    /// An absent or blank reference attribute. Tolerated for anchors under
    /// `allow_missing_href`, and tolerated for any element when the document
    /// declares the bare HTML5 doctype, which permits the omission.
    fn check_missing(&self, document: &Document, element: &Element, report: &mut RunReport) {
        if element.kind == ElementKind::Anchor && self.policy.allow_missing_href {
            return;
        }
        if document.html5_doctype {
            return;
        }
        report.add_issue(
            element,
            format!(
                "'{}' tag has no {} attribute",
                element.kind.tag_name(),
                element.kind.attr_name()
            ),
        );
    }

    /// An external reference: audit SRI where it applies, skip relations
    /// that cannot be probed reliably, then queue for the remote resolver.
    fn check_external(&self, element: &Element, facts: &UrlFacts, report: &mut RunReport) {
        if self.policy.check_sri && schemes::sri_applies(element) {
            schemes::check_sri(element, report);
        }

        // Existence probing is unreliable for this relation type.
        if element.rel.as_deref() == Some("dns-prefetch") {
            return;
        }

        if facts.path.is_empty() {
            report.add_issue(element, format!("{} is an invalid URL", facts.raw));
            return;
        }

        // Scheme-relative references cannot be probed as written; assume
        // https, which any host serving them is expected to support.
        let url = if facts.raw.starts_with("//") {
            format!("https:{}", facts.raw)
        } else {
            facts.raw.clone()
        };

        report.pending.push(PendingCheck {
            line: element.line,
            url,
        });
    }

    /// An internal reference: existence, directory-slash, and fragment
    /// checks. A nonexistent target suppresses the other two; once existence
    /// passes, the slash and fragment checks are evaluated independently.
    fn check_internal(
        &self,
        document: &Document,
        element: &Element,
        facts: &UrlFacts,
        report: &mut RunReport,
    ) {
        let target = resolve_target(&document.path, facts);

        if !self.tree.exists(&target) {
            report.add_issue(
                element,
                format!("internally linking to {}, which does not exist", facts.raw),
            );
            return;
        }

        if self.tree.is_directory(&target) && !facts.path.is_empty() && !facts.path.ends_with('/') {
            report.add_issue(
                element,
                format!(
                    "internally linking to {}, which resolves to a directory without a trailing slash",
                    facts.raw
                ),
            );
        }

        if let Some(fragment) = facts.fragment.as_deref()
            && !fragment.is_empty()
            && !self.tree.fragment_exists(&target, fragment)
        {
            report.add_issue(
                element,
                format!(
                    "internally linking to {}; the file exists, but the hash '{fragment}' does not",
                    facts.raw
                ),
            );
        }
    }
}

/// Resolve an internal reference's path against the referencing document.
/// Root-relative paths resolve from the scan root; a fragment-only
/// reference targets the current document; anything else is relative to the
/// document's directory. `.` and `..` components are collapsed lexically.
fn resolve_target(document_path: &Path, facts: &UrlFacts) -> PathBuf {
    if facts.path.is_empty() {
        return document_path.to_path_buf();
    }

    if let Some(root_relative) = facts.path.strip_prefix('/') {
        return normalize_path(Path::new(root_relative));
    }

    let document_dir = document_path.parent().unwrap_or(Path::new(""));
    normalize_path(&document_dir.join(&facts.path))
}

/// Collapse `.` and `..` components without touching the filesystem.
/// A `..` that would climb above the root is dropped.
fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                components.pop();
            },
            other => components.push(other),
        }
    }
    components.iter().collect()
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::types::Diagnostic;

    /// In-memory document tree for exercising the checker without disk I/O.
    struct FakeTree {
        dirs: HashSet<PathBuf>,
        files: HashSet<PathBuf>,
        fragments: HashSet<(PathBuf, String)>,
    }

    impl FakeTree {
        fn new() -> Self {
            Self {
                dirs: HashSet::new(),
                files: HashSet::new(),
                fragments: HashSet::new(),
            }
        }

        fn file(mut self, path: &str) -> Self {
            self.files.insert(PathBuf::from(path));
            self
        }

        fn dir(mut self, path: &str) -> Self {
            self.dirs.insert(PathBuf::from(path));
            self
        }

        fn fragment(mut self, path: &str, fragment: &str) -> Self {
            self.fragments.insert((PathBuf::from(path), fragment.to_string()));
            self
        }
    }

    impl DocumentTree for FakeTree {
        fn exists(&self, path: &Path) -> bool {
            self.files.contains(path) || self.dirs.contains(path)
        }

        fn fragment_exists(&self, path: &Path, fragment: &str) -> bool {
            self.fragments.contains(&(path.to_path_buf(), fragment.to_string()))
        }

        fn is_directory(&self, path: &Path) -> bool {
            self.dirs.contains(path)
        }
    }

    fn anchor(raw: Option<&str>) -> Element {
        Element {
            content: match raw {
                Some(href) => format!("<a href=\"{href}\">x</a>"),
                None => "<a>x</a>".to_string(),
            },
            crossorigin: None,
            integrity: None,
            kind: ElementKind::Anchor,
            line: 7,
            raw_href: raw.map(String::from),
            rel: None,
        }
    }

    fn document(elements: Vec<Element>) -> Document {
        Document {
            elements,
            html5_doctype: false,
            path: PathBuf::from("index.html"),
        }
    }

    fn run(policy: &Policy, tree: &FakeTree, elements: Vec<Element>) -> RunReport {
        Checker::new(policy, tree).check_document(&document(elements))
    }

    fn messages(report: &RunReport) -> Vec<&str> {
        report.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn hash_only_reports_exactly_one_diagnostic() {
        let tree = FakeTree::new();
        let report = run(&Policy::default(), &tree, vec![anchor(Some("#"))]);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("points to nowhere"));
        assert!(report.pending.is_empty());
    }

    #[test]
    fn hash_only_tolerated_by_policy() {
        let mut policy = Policy::default();
        policy.allow_hash_href = true;
        let tree = FakeTree::new();
        let report = run(&policy, &tree, vec![anchor(Some("#"))]);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn invalid_url_reports_exactly_once_and_stops() {
        let tree = FakeTree::new();
        let report = run(&Policy::default(), &tree, vec![anchor(Some("https://"))]);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("is an invalid URL"));
        assert!(report.pending.is_empty());
    }

    #[test]
    fn ignored_reference_is_terminal() {
        let policy = Policy::default()
            .with_ignore_patterns(&["^https://twitter\\.com".to_string()])
            .unwrap();
        let tree = FakeTree::new();
        let report = run(&policy, &tree, vec![anchor(Some("https://twitter.com/x"))]);
        assert!(report.diagnostics.is_empty());
        assert!(report.pending.is_empty());
    }

    #[test]
    fn external_reference_is_queued_not_reported() {
        let tree = FakeTree::new();
        let report = run(&Policy::default(), &tree, vec![anchor(Some("https://example.com/page"))]);
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.pending.len(), 1);
        assert_eq!(report.pending[0].url, "https://example.com/page");
        assert_eq!(report.pending[0].line, 7);
    }

    #[test]
    fn scheme_relative_reference_is_queued_as_https() {
        let tree = FakeTree::new();
        let report = run(&Policy::default(), &tree, vec![anchor(Some("//cdn.example.com/lib.js"))]);
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.pending.len(), 1);
        assert_eq!(report.pending[0].url, "https://cdn.example.com/lib.js");
    }

    #[test]
    fn enforce_https_flags_plain_http_but_still_queues() {
        let mut policy = Policy::default();
        policy.enforce_https = true;
        let tree = FakeTree::new();
        let report = run(&policy, &tree, vec![anchor(Some("http://example.com/page"))]);
        assert_eq!(messages(&report), vec!["http://example.com/page is not an HTTPS link"]);
        assert_eq!(report.pending.len(), 1);
    }

    #[test]
    fn plain_http_without_policy_is_only_queued() {
        let tree = FakeTree::new();
        let report = run(&Policy::default(), &tree, vec![anchor(Some("http://example.com/page"))]);
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.pending.len(), 1);
    }

    #[test]
    fn non_http_remote_schemes_are_skipped() {
        let tree = FakeTree::new();
        let report = run(
            &Policy::default(),
            &tree,
            vec![
                anchor(Some("ftp://files.example.com/a.tar")),
                anchor(Some("javascript:void(0)")),
                anchor(Some("data:text/plain,hi")),
            ],
        );
        assert!(report.diagnostics.is_empty());
        assert!(report.pending.is_empty());
    }

    #[test]
    fn empty_mailto_reports_through_the_scheme_handler() {
        let tree = FakeTree::new();
        let report = run(&Policy::default(), &tree, vec![anchor(Some("mailto:"))]);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("contains no email address"));
    }

    #[test]
    fn missing_target_suppresses_slash_and_fragment_checks() {
        let tree = FakeTree::new();
        let report = run(
            &Policy::default(),
            &tree,
            vec![anchor(Some("missing/#section"))],
        );
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("which does not exist"));
    }

    #[test]
    fn existing_file_with_missing_fragment() {
        let tree = FakeTree::new().file("page.html");
        let report = run(&Policy::default(), &tree, vec![anchor(Some("page.html#missing"))]);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(
            report.diagnostics[0]
                .message
                .contains("the file exists, but the hash 'missing' does not")
        );
    }

    #[test]
    fn query_string_does_not_break_internal_resolution() {
        let tree = FakeTree::new().file("page.html");
        let report = run(&Policy::default(), &tree, vec![anchor(Some("page.html?v=1"))]);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn existing_file_with_existing_fragment_passes() {
        let tree = FakeTree::new().file("page.html").fragment("page.html", "intro");
        let report = run(&Policy::default(), &tree, vec![anchor(Some("page.html#intro"))]);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn fragment_only_reference_checks_current_document() {
        let tree = FakeTree::new().file("index.html");
        let report = run(&Policy::default(), &tree, vec![anchor(Some("#nowhere"))]);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("the hash 'nowhere' does not"));
    }

    #[test]
    fn unslashed_directory_is_flagged() {
        let tree = FakeTree::new().dir("guide");
        let report = run(&Policy::default(), &tree, vec![anchor(Some("guide"))]);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("without a trailing slash"));
    }

    #[test]
    fn slashed_directory_passes() {
        let tree = FakeTree::new().dir("guide");
        let report = run(&Policy::default(), &tree, vec![anchor(Some("guide/"))]);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn slash_and_fragment_findings_are_independent() {
        let tree = FakeTree::new().dir("guide");
        let report = run(&Policy::default(), &tree, vec![anchor(Some("guide#setup"))]);
        let found = messages(&report);
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|m| m.contains("without a trailing slash")));
        assert!(found.iter().any(|m| m.contains("the hash 'setup' does not")));
    }

    #[test]
    fn missing_href_reported_without_tolerances() {
        let tree = FakeTree::new();
        let report = run(&Policy::default(), &tree, vec![anchor(None)]);
        assert_eq!(messages(&report), vec!["'a' tag has no href attribute"]);
    }

    #[test]
    fn missing_href_tolerated_by_policy() {
        let mut policy = Policy::default();
        policy.allow_missing_href = true;
        let tree = FakeTree::new();
        let report = run(&policy, &tree, vec![anchor(None)]);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn missing_href_tolerated_under_html5_doctype() {
        let tree = FakeTree::new();
        let policy = Policy::default();
        let checker = Checker::new(&policy, &tree);
        let mut doc = document(vec![anchor(None)]);
        doc.html5_doctype = true;
        let report = checker.check_document(&doc);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn sri_audit_runs_for_external_stylesheets_under_policy() {
        let mut policy = Policy::default();
        policy.check_sri = true;
        let tree = FakeTree::new();
        let stylesheet = Element {
            content: "<link rel=\"stylesheet\" href=\"https://cdn.example.com/a.css\">".to_string(),
            crossorigin: None,
            integrity: None,
            kind: ElementKind::Link,
            line: 2,
            raw_href: Some("https://cdn.example.com/a.css".to_string()),
            rel: Some("stylesheet".to_string()),
        };
        let report = run(&policy, &tree, vec![stylesheet]);
        assert_eq!(messages(&report), vec!["SRI and CORS not provided"]);
        // Still queued for reachability.
        assert_eq!(report.pending.len(), 1);
    }

    #[test]
    fn dns_prefetch_links_are_skipped_entirely() {
        let tree = FakeTree::new();
        let prefetch = Element {
            content: "<link rel=\"dns-prefetch\" href=\"https://cdn.example.com\">".to_string(),
            crossorigin: None,
            integrity: None,
            kind: ElementKind::Link,
            line: 2,
            raw_href: Some("https://cdn.example.com".to_string()),
            rel: Some("dns-prefetch".to_string()),
        };
        let report = run(&Policy::default(), &tree, vec![prefetch]);
        assert!(report.diagnostics.is_empty());
        assert!(report.pending.is_empty());
    }

    #[test]
    fn relative_reference_resolves_from_document_directory() {
        let tree = FakeTree::new().file("docs/other.html");
        let policy = Policy::default();
        let checker = Checker::new(&policy, &tree);
        let doc = Document {
            elements: vec![anchor(Some("other.html"))],
            html5_doctype: false,
            path: PathBuf::from("docs/guide.html"),
        };
        assert!(checker.check_document(&doc).diagnostics.is_empty());
    }

    #[test]
    fn parent_components_collapse_during_resolution() {
        let tree = FakeTree::new().file("index.html");
        let policy = Policy::default();
        let checker = Checker::new(&policy, &tree);
        let doc = Document {
            elements: vec![anchor(Some("../index.html"))],
            html5_doctype: false,
            path: PathBuf::from("docs/guide.html"),
        };
        assert!(checker.check_document(&doc).diagnostics.is_empty());
    }

    #[test]
    fn root_relative_reference_resolves_from_scan_root() {
        let tree = FakeTree::new().file("assets/style.css");
        let policy = Policy::default();
        let checker = Checker::new(&policy, &tree);
        let doc = Document {
            elements: vec![anchor(Some("/assets/style.css"))],
            html5_doctype: false,
            path: PathBuf::from("docs/guide.html"),
        };
        assert!(checker.check_document(&doc).diagnostics.is_empty());
    }

    #[test]
    fn same_host_absolute_is_checked_internally() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".hrefcheck.toml"),
            "site_url = \"https://docs.example.com\"\n",
        )
        .unwrap();
        let policy = Policy::load(dir.path()).unwrap();

        let tree = FakeTree::new();
        let report = run(
            &policy,
            &tree,
            vec![anchor(Some("https://docs.example.com/guide.html"))],
        );
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("which does not exist"));
        assert!(report.pending.is_empty());
    }

    #[test]
    fn rerunning_yields_an_identical_diagnostic_set() {
        let tree = FakeTree::new().file("page.html").dir("guide");
        let elements = vec![
            anchor(Some("#")),
            anchor(Some("page.html#missing")),
            anchor(Some("guide")),
            anchor(Some("mailto:")),
            anchor(Some("https://example.com/ok")),
        ];
        let policy = Policy::default();

        let first = run(&policy, &tree, elements.clone());
        let second = run(&policy, &tree, elements);

        let sort_key = |d: &Diagnostic| (d.line, d.message.clone());
        let mut first_sorted = first.diagnostics.clone();
        first_sorted.sort_by_key(sort_key);
        let mut second_sorted = second.diagnostics.clone();
        second_sorted.sort_by_key(sort_key);
        assert_eq!(first_sorted, second_sorted);
        assert_eq!(first.pending, second.pending);
    }

    #[test]
    fn classification_is_total() {
        let cases = [
            ("", Category::Missing),
            ("#", Category::HashOnly),
            ("#section", Category::Internal),
            ("mailto:a@b.c", Category::NonHttpRemote),
            ("tel:123", Category::NonHttpRemote),
            ("ftp://h/f", Category::NonHttpRemote),
            ("https://example.com/x", Category::External),
            ("//cdn.example.com/x", Category::External),
            ("page.html", Category::Internal),
            ("/page.html", Category::Internal),
        ];
        for (raw, expected) in cases {
            let facts = UrlFacts::derive(raw, None);
            assert_eq!(classify(raw, &facts), expected, "raw = {raw:?}");
        }
    }
}
