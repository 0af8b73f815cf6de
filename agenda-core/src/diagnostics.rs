//! Reporting for lines skipped while parsing an agenda document.
//!
//! Parsing a whole document is best-effort: a malformed line is handed to a
//! [`DiagnosticSink`] and the rest of the document still contributes. The
//! core never prints; callers decide what to do with skipped lines.

/// Receives `(offending_line, reason)` for every line `IntervalSet::parse` skips.
pub trait DiagnosticSink {
    fn skipped(&mut self, line: &str, reason: &str);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(&str, &str),
{
    fn skipped(&mut self, line: &str, reason: &str) {
        (*self)(line, reason)
    }
}

/// A line that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line: String,
    pub reason: String,
}

/// Collects every skipped line for later inspection.
#[derive(Debug, Default, Clone)]
pub struct SkippedLines(pub Vec<SkippedLine>);

impl SkippedLines {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkippedLine> {
        self.0.iter()
    }
}

impl DiagnosticSink for SkippedLines {
    fn skipped(&mut self, line: &str, reason: &str) {
        self.0.push(SkippedLine {
            line: line.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Discards all diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreDiagnostics;

impl DiagnosticSink for IgnoreDiagnostics {
    fn skipped(&mut self, _line: &str, _reason: &str) {}
}
