use super::*;
use crate::span::Span;

#[test]
fn format_message_substitutes_placeholders() {
    assert_eq!(
        format_message("Template type {0} expected {1}", &["T", "an object"]),
        "Template type T expected an object"
    );
}

#[test]
fn from_template_carries_code_and_category() {
    let diag = Diagnostic::from_template(
        diagnostic_messages::EXPECTED_THIS_TYPE,
        Span::new(3, 10),
        &["goog.bind"],
    );
    assert_eq!(diag.code, 9001);
    assert_eq!(diag.category, DiagnosticCategory::Error);
    assert!(diag.message_text.contains("goog.bind"));
    assert_eq!(diag.span, Span::new(3, 10));
}

#[test]
fn collector_accumulates_and_takes() {
    let collector = DiagnosticCollector::new();
    assert!(collector.is_empty());
    collector.report(Diagnostic::error(Span::DUMMY, "one", 1));
    collector.report(Diagnostic::error(Span::DUMMY, "two", 2));
    assert_eq!(collector.diagnostics().len(), 2);
    let taken = collector.take_diagnostics();
    assert_eq!(taken.len(), 2);
    assert!(collector.is_empty());
}
