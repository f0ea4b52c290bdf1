//! Common types and utilities for the jsz JavaScript compiler.
//!
//! This crate provides foundational types used across all jsz crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`)
//! - Structured diagnostics (`Diagnostic`, `DiagnosticSink`)

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Structured diagnostics with stable codes
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticCollector, DiagnosticMessage, DiagnosticSink,
    NullSink, format_message,
};
