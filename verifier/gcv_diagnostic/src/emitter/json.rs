//! Machine-readable JSON output.
//!
//! Hand-rolled serialization: the schema is flat and stable, and keeping
//! the emitter dependency-free matches the rest of the diagnostic stack.

use std::fmt::Write;

use crate::Diagnostic;

use super::{escape_json, trailing_comma, DiagnosticEmitter};

/// Emits diagnostics as a JSON array of finding objects.
pub struct JsonEmitter {
    file_name: String,
    diagnostics: Vec<Diagnostic>,
}

impl JsonEmitter {
    pub fn new(file_name: impl Into<String>) -> Self {
        JsonEmitter {
            file_name: file_name.into(),
            diagnostics: Vec::new(),
        }
    }
}

impl DiagnosticEmitter for JsonEmitter {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }

    fn emit_summary(&mut self, _error_count: usize, _warning_count: usize) {}

    fn finish(self) -> String {
        let mut out = String::from("[\n");
        let total = self.diagnostics.len();
        for (i, diag) in self.diagnostics.iter().enumerate() {
            let _ = write!(
                out,
                "  {{\"file\": \"{}\", \"offset\": {}, \"severity\": \"{}\", \"code\": \"{}\", \"message\": \"{}\", \"notes\": [",
                escape_json(&self.file_name),
                diag.primary_span().map_or(0, |s| s.start),
                diag.severity,
                diag.code,
                escape_json(&diag.message),
            );
            let notes: Vec<&crate::Label> = diag.note_labels().collect();
            for (j, label) in notes.iter().enumerate() {
                let _ = write!(
                    out,
                    "{{\"offset\": {}, \"message\": \"{}\"}}{}",
                    label.span.start,
                    escape_json(&label.message),
                    trailing_comma(j, notes.len())
                );
            }
            let _ = writeln!(out, "]}}{}", trailing_comma(i, total));
        }
        out.push_str("]\n");
        out
    }
}
