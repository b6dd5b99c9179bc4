//! Diagnostic queue for collecting and ordering verifier findings.
//!
//! Findings accumulate during the record and trace-method phases; no
//! finding aborts the pass. At flush time the queue:
//! - sorts by primary span so findings interleave with compiler output in
//!   source order,
//! - optionally promotes warnings to errors ("warnings as errors"),
//! - optionally truncates after an error limit.

use crate::{Diagnostic, Severity};

/// Configuration for diagnostic processing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueueConfig {
    /// Maximum number of errors before truncating (0 = unlimited).
    pub error_limit: usize,
    /// Promote warnings to errors at flush time.
    pub warnings_as_errors: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            error_limit: 0,
            warnings_as_errors: false,
        }
    }
}

/// Queue for collecting and ordering diagnostics.
#[derive(Default, Debug)]
pub struct DiagnosticQueue {
    diagnostics: Vec<Diagnostic>,
    config: QueueConfig,
}

impl DiagnosticQueue {
    /// Create a new queue with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue with custom configuration.
    pub fn with_config(config: QueueConfig) -> Self {
        DiagnosticQueue {
            diagnostics: Vec::new(),
            config,
        }
    }

    /// Add a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Number of queued diagnostics.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Count of error-severity diagnostics, after any promotion.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.is_error() || (self.config.warnings_as_errors && d.severity == Severity::Warning))
            .count()
    }

    /// Sort, promote, truncate, and return the final diagnostics.
    pub fn flush(mut self) -> Vec<Diagnostic> {
        self.diagnostics
            .sort_by_key(|d| d.primary_span().map_or(u32::MAX, |s| s.start));

        if self.config.warnings_as_errors {
            for d in &mut self.diagnostics {
                if d.severity == Severity::Warning {
                    d.severity = Severity::Error;
                }
            }
        }

        if self.config.error_limit > 0 {
            let mut errors = 0;
            let limit = self.config.error_limit;
            self.diagnostics.retain(|d| {
                if d.is_error() {
                    errors += 1;
                    errors <= limit
                } else {
                    true
                }
            });
        }

        self.diagnostics
    }
}

#[cfg(test)]
mod tests;
