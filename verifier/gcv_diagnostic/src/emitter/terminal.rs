//! Human-readable terminal output.

use std::fmt::Write;

use crate::Diagnostic;

use super::DiagnosticEmitter;

/// Emits diagnostics in the host compiler's terminal layout:
///
/// ```text
/// file.cpp:120: error [G2002]: class 'Foo' has untraced fields
/// file.cpp:140:   note: untraced field 'm_bar'
/// ```
pub struct TerminalEmitter {
    file_name: String,
    out: String,
}

impl TerminalEmitter {
    pub fn new(file_name: impl Into<String>) -> Self {
        TerminalEmitter {
            file_name: file_name.into(),
            out: String::new(),
        }
    }
}

impl DiagnosticEmitter for TerminalEmitter {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        let loc = diagnostic.primary_span().map_or(0, |s| s.start);
        let _ = writeln!(
            self.out,
            "{}:{}: {} [{}]: {}",
            self.file_name, loc, diagnostic.severity, diagnostic.code, diagnostic.message
        );
        for label in diagnostic.note_labels() {
            let _ = writeln!(
                self.out,
                "{}:{}:   note: {}",
                self.file_name, label.span.start, label.message
            );
        }
        for note in &diagnostic.notes {
            let _ = writeln!(self.out, "  = note: {note}");
        }
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        if error_count == 0 && warning_count == 0 {
            return;
        }
        let _ = writeln!(
            self.out,
            "{error_count} error(s), {warning_count} warning(s) emitted"
        );
    }

    fn finish(self) -> String {
        self.out
    }
}
