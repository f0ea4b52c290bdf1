//! Structured diagnostics with stable numeric codes.
//!
//! The type layer never aborts on user input; structural problems are
//! reported through a [`DiagnosticSink`] and analysis continues best-effort.
//! Each diagnostic carries a stable code so downstream tooling can key on it.

use crate::span::Span;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

/// A diagnostic template: stable code, category, and a `{0}`-style message.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Diagnostics emitted by the type lattice and the inference engine.
pub mod diagnostic_messages {
    use super::{DiagnosticCategory, DiagnosticMessage};

    /// A generic call site needed a parameter typed as the callee's
    /// designated this-template, but the signature declares none.
    pub const EXPECTED_THIS_TYPE: DiagnosticMessage = DiagnosticMessage {
        code: 9001,
        category: DiagnosticCategory::Error,
        message: "Function literal argument refers to undefined this argument in call to {0}",
    };

    /// A templated type was bound to something that is not an object type.
    pub const TEMPLATE_TYPE_EXPECTS_OBJECT: DiagnosticMessage = DiagnosticMessage {
        code: 9002,
        category: DiagnosticCategory::Error,
        message: "Template type {0} expected an object type but found {1}",
    };

    /// A named type reference never resolved to a definition.
    pub const UNRESOLVED_TYPE: DiagnosticMessage = DiagnosticMessage {
        code: 9003,
        category: DiagnosticCategory::Warning,
        message: "Named type {0} could not be resolved",
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub span: Span,
    pub message_text: String,
}

impl Diagnostic {
    /// Instantiate a diagnostic from its template and arguments.
    pub fn from_template(template: DiagnosticMessage, span: Span, args: &[&str]) -> Self {
        Self {
            category: template.category,
            code: template.code,
            span,
            message_text: format_message(template.message, args),
        }
    }

    pub fn error(span: Span, message: impl Into<String>, code: u32) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            span,
            message_text: message.into(),
        }
    }
}

/// Substitute `{0}`, `{1}`, ... placeholders in a message template.
pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// Receiver for diagnostics produced during analysis.
///
/// The inference engine holds a `&dyn DiagnosticSink`; the pipeline decides
/// whether reports go to a collector, a console printer, or are dropped.
pub trait DiagnosticSink {
    fn report(&self, diagnostic: Diagnostic);
}

/// A sink that accumulates diagnostics for later inspection.
#[derive(Default)]
pub struct DiagnosticCollector {
    diagnostics: std::cell::RefCell<Vec<Diagnostic>>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the collected diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Take the collected diagnostics.
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.borrow().is_empty()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }
}

/// A sink that discards everything. Useful for speculative analysis.
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod tests;
