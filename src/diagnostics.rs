//! Diagnostics sink (C8) — §4 overview, §6 "Diagnostics sink", §7.
//!
//! A stateless channel, not a `Result`-returning API: every error category
//! in §7 is *reported and counted*, never propagated as an `Err`, so one
//! malformed declaration doesn't abort analysis of the rest of the tree.
//! This is the direct opposite of `barracuda_pest_semantic_analyser.rs`,
//! which `panic!`s on every error condition — [AMBIENT-2] calls out this
//! one place where that control flow is not carried over, because §7's
//! error-handling design requires recoverable, per-site diagnostics
//! instead.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;

use strum::Display;

use crate::source_ref::SourceRef;

/// [AMBIENT-3]: the three severities §6 names, lowercase for the
/// `path:line:col: severity: message` wire format — derived with `strum`
/// rather than a hand-written `match` since this is exactly the closed
/// enum-to-string table it's meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub source_ref: SourceRef,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    /// §6: "writes one line per diagnostic of the form
    /// `path:line:col: severity: message`".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.source_ref, self.severity, self.message)
    }
}

/// §6 names three operations: `report_error`, `report_warning`,
/// `report_note`. Notes are always emitted immediately after the
/// error/warning they annotate, so callers pass them as a trailing slice
/// rather than a separate call the sink would have to correlate after the
/// fact.
#[derive(Default)]
pub struct DiagnosticsSink {
    diagnostics: RefCell<Vec<Diagnostic>>,
    error_count: Cell<u32>,
}

impl DiagnosticsSink {
    pub fn new() -> Self {
        DiagnosticsSink { diagnostics: RefCell::new(Vec::new()), error_count: Cell::new(0) }
    }

    pub fn report_error(&self, source_ref: &SourceRef, message: impl Into<String>) {
        self.push(Severity::Error, source_ref.clone(), message.into());
        self.error_count.set(self.error_count.get() + 1);
    }

    pub fn report_warning(&self, source_ref: &SourceRef, message: impl Into<String>) {
        self.push(Severity::Warning, source_ref.clone(), message.into());
    }

    pub fn report_note(&self, source_ref: &SourceRef, message: impl Into<String>) {
        self.push(Severity::Note, source_ref.clone(), message.into());
    }

    fn push(&self, severity: Severity, source_ref: SourceRef, message: String) {
        tracing::trace!(%severity, %source_ref, %message, "diagnostic emitted");
        self.diagnostics.borrow_mut().push(Diagnostic { severity, source_ref, message });
    }

    pub fn error_count(&self) -> u32 {
        self.error_count.get()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count.get() > 0
    }

    pub fn diagnostics(&self) -> Ref<'_, Vec<Diagnostic>> {
        self.diagnostics.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_ref::Location;

    fn dummy_ref() -> SourceRef {
        SourceRef::new("t.lstf", Location::new(2, 3), Location::new(2, 3))
    }

    #[test]
    fn error_increments_counter_warning_and_note_do_not() {
        let sink = DiagnosticsSink::new();
        sink.report_error(&dummy_ref(), "undeclared name 'x'");
        sink.report_warning(&dummy_ref(), "unchecked member access");
        sink.report_note(&dummy_ref(), "previous declaration here");
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics().len(), 3);
    }

    #[test]
    fn display_format_matches_contract() {
        let sink = DiagnosticsSink::new();
        sink.report_error(&dummy_ref(), "boom");
        let text = sink.diagnostics()[0].to_string();
        assert_eq!(text, "t.lstf:2:3: error: boom");
    }
}
