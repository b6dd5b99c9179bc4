use gcv_ir::Span;
use pretty_assertions::assert_eq;

use super::{DiagnosticQueue, QueueConfig};
use crate::{Diagnostic, ErrorCode, Severity};

fn error_at(start: u32) -> Diagnostic {
    Diagnostic::error(ErrorCode::G3001)
        .with_message("invalid fields")
        .with_label(Span::new(start, start + 4), "here")
}

#[test]
fn flush_sorts_by_span() {
    let mut queue = DiagnosticQueue::new();
    queue.push(error_at(40));
    queue.push(error_at(8));
    queue.push(error_at(24));

    let sorted = queue.flush();
    let starts: Vec<u32> = sorted
        .iter()
        .filter_map(|d| d.primary_span().map(|s| s.start))
        .collect();
    assert_eq!(starts, vec![8, 24, 40]);
}

#[test]
fn warnings_promoted_when_configured() {
    let mut queue = DiagnosticQueue::with_config(QueueConfig {
        error_limit: 0,
        warnings_as_errors: true,
    });
    queue.push(
        Diagnostic::warning(ErrorCode::G5004)
            .with_message("unneeded finalizer")
            .with_label(Span::new(0, 4), "here"),
    );

    assert_eq!(queue.error_count(), 1);
    let flushed = queue.flush();
    assert_eq!(flushed[0].severity, Severity::Error);
}

#[test]
fn error_limit_truncates_errors_only() {
    let mut queue = DiagnosticQueue::with_config(QueueConfig {
        error_limit: 2,
        warnings_as_errors: false,
    });
    for i in 0..4 {
        queue.push(error_at(i * 16));
    }
    queue.push(
        Diagnostic::warning(ErrorCode::G5004)
            .with_message("advisory")
            .with_label(Span::new(100, 104), "here"),
    );

    let flushed = queue.flush();
    assert_eq!(flushed.iter().filter(|d| d.is_error()).count(), 2);
    assert_eq!(flushed.iter().filter(|d| !d.is_error()).count(), 1);
}

#[test]
fn empty_queue_flushes_empty() {
    let queue = DiagnosticQueue::new();
    assert!(queue.is_empty());
    assert!(queue.flush().is_empty());
}
