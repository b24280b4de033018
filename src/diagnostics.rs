//! Shared diagnostic buffer: every pass appends here, ordered by source
//! position within the pass.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: usize,
    pub col: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, line: usize, col: usize) -> Diagnostic {
        Diagnostic {
            severity: Severity::Error,
            line,
            col,
            message: message.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("{}:{}: {}", self.line, self.col, self.message)
    }
}

/// Sort a pass's batch into source order (line, then column) before it is
/// appended to the shared buffer.
pub fn sort_batch(batch: &mut [Diagnostic]) {
    batch.sort_by_key(|d| (d.line, d.col));
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}
