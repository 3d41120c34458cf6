/// Per-scheme validators (`mailto`, `tel`, `http`) and the SRI/CORS checker
/// for stylesheet links.
use regex::Regex;

use crate::config::Policy;
use crate::types::{Element, ElementKind, RunReport};
use crate::urls::UrlFacts;

/// Compiled grammars shared across all scheme checks in a run.
pub struct SchemeRules {
    /// Liberal email grammar: one `@`, no whitespace, dotted domain.
    email: Regex,
}

impl SchemeRules {
    /// Compile the scheme grammars.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded email regex is invalid (compile-time invariant).
    pub fn new() -> Self {
        Self {
            email: Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("valid regex"),
        }
    }
}

impl Default for SchemeRules {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the scheme handler matching this reference's scheme, if any.
///
/// Runs unconditionally before the missing-reference checks: a reference can
/// simultaneously have a recognized scheme and later be found missing.
/// `https` never triggers a handler. Unrecognized schemes are a no-op here
/// and are handled by the internal/external flow instead.
pub fn check(element: &Element, facts: &UrlFacts, policy: &Policy, rules: &SchemeRules, report: &mut RunReport) {
    match facts.scheme.as_str() {
        "mailto" => check_mailto(element, facts, policy, rules, report),
        "tel" => check_tel(element, facts, report),
        "http" => {
            if policy.enforce_https {
                report.add_issue(element, format!("{} is not an HTTPS link", facts.raw));
            }
        },
        _ => {},
    }
}

/// Empty address is reported unless the ignore-empty-mailto policy is set;
/// a non-empty address is validated against the email grammar.
fn check_mailto(element: &Element, facts: &UrlFacts, policy: &Policy, rules: &SchemeRules, report: &mut RunReport) {
    let address = facts.path.trim();
    if address.is_empty() {
        if !policy.ignore_empty_mailto {
            report.add_issue(element, format!("{} contains no email address", facts.raw));
        }
    } else if !rules.email.is_match(address) {
        report.add_issue(element, format!("{} contains an invalid email address", facts.raw));
    }
}

/// Only emptiness is checked; no phone-number syntax validation is performed.
fn check_tel(element: &Element, facts: &UrlFacts, report: &mut RunReport) {
    if facts.path.trim().is_empty() {
        report.add_issue(element, format!("{} contains no phone number", facts.raw));
    }
}

/// Whether the SRI/CORS audit applies to this element: stylesheet links only.
pub fn sri_applies(element: &Element) -> bool {
    element.kind == ElementKind::Link
        && element.rel.as_deref().is_some_and(|rel| rel.eq_ignore_ascii_case("stylesheet"))
}

/// Audit the `integrity`/`crossorigin` attribute pair on an external
/// stylesheet link. Blank attributes count as absent.
pub fn check_sri(element: &Element, report: &mut RunReport) {
    let has_integrity = element.integrity.as_deref().is_some_and(|v| !v.trim().is_empty());
    let has_crossorigin = element.crossorigin.as_deref().is_some_and(|v| !v.trim().is_empty());

    match (has_integrity, has_crossorigin) {
        (false, false) => report.add_issue(element, "SRI and CORS not provided".to_string()),
        (false, true) => report.add_issue(element, "Integrity is missing".to_string()),
        (true, false) => {
            report.add_issue(element, "CORS not provided for external resource".to_string());
        },
        (true, true) => {},
    }
}
