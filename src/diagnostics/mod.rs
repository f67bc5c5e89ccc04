//! Diagnostics: the message sink shared by one parse.
//!
//! Everything the parser reports that is not a fatal [`ParseError`] lands
//! here: style issues (usually with an autofix instruction on a token),
//! advisory checks and warnings. A fatal syntax error is recorded too,
//! by the unit parser, once it has stopped the file.
//!
//! [`ParseError`]: crate::parser::ParseError

use std::fmt;
use std::sync::Arc;

use crate::base::Location;
use crate::parser::SyntaxError;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// What kind of message a diagnostic is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Error,
    StyleIssue,
    Warning,
    Check,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::StyleIssue => "style",
            Self::Warning => "warning",
            Self::Check => "check",
        }
    }
}

/// How serious an advisory check is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckSeverity {
    Info,
    Low,
    Medium,
    High,
}

impl CheckSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: Location,
    pub kind: DiagnosticKind,
    pub message: Arc<str>,
    /// Code (e.g. "S0001" or "E0201").
    pub code: Option<Arc<str>>,
    /// Only meaningful for errors: the file's parse stopped here.
    pub fatal: bool,
    /// Only meaningful for style issues: a fix instruction was recorded.
    pub autofixable: bool,
    /// Only set for checks.
    pub severity: Option<CheckSeverity>,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, location: Location, message: impl Into<Arc<str>>) -> Self {
        Self {
            location,
            kind,
            message: message.into(),
            code: None,
            fatal: false,
            autofixable: false,
            severity: None,
        }
    }

    pub fn error(location: Location, message: impl Into<Arc<str>>, fatal: bool) -> Self {
        let mut diag = Self::new(DiagnosticKind::Error, location, message);
        diag.fatal = fatal;
        diag
    }

    pub fn style_issue(location: Location, message: impl Into<Arc<str>>, autofixable: bool) -> Self {
        let mut diag = Self::new(DiagnosticKind::StyleIssue, location, message);
        diag.autofixable = autofixable;
        diag
    }

    pub fn warning(location: Location, message: impl Into<Arc<str>>) -> Self {
        Self::new(DiagnosticKind::Warning, location, message)
    }

    pub fn check(location: Location, message: impl Into<Arc<str>>, severity: CheckSeverity) -> Self {
        let mut diag = Self::new(DiagnosticKind::Check, location, message);
        diag.severity = Some(severity);
        diag
    }

    /// Set the code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.kind.as_str())?;
        if let Some(severity) = self.severity {
            write!(f, " ({})", severity.as_str())?;
        }
        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }
        write!(f, ": {}", self.message)?;
        if self.autofixable {
            f.write_str(" [fixed]")?;
        }
        Ok(())
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Codes for the style issues and checks the parser raises.
///
/// ## Code Ranges
///
/// - **S0001-S0099**: Style issues (termination, redundant brackets)
/// - **C0001-C0099**: Advisory checks
pub mod codes {
    /// Statement terminated by the wrong token, or not terminated.
    pub const TERMINATION: &str = "S0001";
    /// Extra `;` or `,` after the terminator.
    pub const REDUNDANT_TERMINATOR: &str = "S0002";
    /// More than one statement on a line.
    pub const MISSING_NEWLINE: &str = "S0003";
    /// Brackets around an already bracketed expression.
    pub const REDUNDANT_BRACKETS: &str = "S0004";
    /// File ends without a final newline.
    pub const FILE_END: &str = "S0005";

    /// `a < b < c`
    pub const CHAINED_RELATIONAL: &str = "C0001";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during one parse.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(kind = diagnostic.kind.as_str(), message = %diagnostic.message, "diagnostic");
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, location: Location, message: impl Into<Arc<str>>, fatal: bool) {
        self.add(Diagnostic::error(location, message, fatal));
    }

    pub fn style_issue(
        &mut self,
        location: Location,
        message: impl Into<Arc<str>>,
        autofixable: bool,
    ) {
        self.add(Diagnostic::style_issue(location, message, autofixable));
    }

    pub fn warning(&mut self, location: Location, message: impl Into<Arc<str>>) {
        self.add(Diagnostic::warning(location, message));
    }

    pub fn check(&mut self, location: Location, message: impl Into<Arc<str>>, severity: CheckSeverity) {
        self.add(Diagnostic::check(location, message, severity));
    }

    /// Record the syntax error that stopped a parse.
    pub fn syntax_error(&mut self, err: &SyntaxError) {
        self.add(
            Diagnostic::error(err.location.clone(), err.message.as_str(), true)
                .with_code(err.code.as_str()),
        );
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn error_count(&self) -> usize {
        self.of_kind(DiagnosticKind::Error).count()
    }

    pub fn style_issue_count(&self) -> usize {
        self.of_kind(DiagnosticKind::StyleIssue).count()
    }

    pub fn warning_count(&self) -> usize {
        self.of_kind(DiagnosticKind::Warning).count()
    }

    pub fn check_count(&self) -> usize {
        self.of_kind(DiagnosticKind::Check).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error() && d.fatal)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}

#[cfg(test)]
mod tests {
    use text_size::{TextRange, TextSize};

    use super::*;

    fn loc(line: u32) -> Location {
        Location::new(Arc::from("a.m"), line, 2, 3, TextRange::empty(TextSize::new(0)))
    }

    #[test]
    fn test_diagnostic_with_code() {
        let diag = Diagnostic::style_issue(loc(1), "end statement with a newline", true)
            .with_code(codes::TERMINATION);
        assert_eq!(diag.code.as_deref(), Some("S0001"));
        assert!(diag.autofixable);
        assert!(!diag.is_error());
    }

    #[test]
    fn test_collector_counts() {
        let mut collector = DiagnosticCollector::new();
        collector.error(loc(1), "expected ')'", true);
        collector.style_issue(loc(2), "redundant ';'", true);
        collector.style_issue(loc(3), "redundant ','", true);
        collector.check(loc(4), "chained relation", CheckSeverity::Medium);
        collector.warning(loc(5), "deprecated");

        assert_eq!(collector.error_count(), 1);
        assert_eq!(collector.style_issue_count(), 2);
        assert_eq!(collector.check_count(), 1);
        assert_eq!(collector.warning_count(), 1);
        assert!(collector.has_errors());
        assert!(collector.has_fatal());
    }

    #[test]
    fn test_take_empties_collector() {
        let mut collector = DiagnosticCollector::new();
        collector.warning(loc(1), "w");
        assert_eq!(collector.take().len(), 1);
        assert!(collector.is_empty());
    }

    #[test]
    fn test_display() {
        let diag = Diagnostic::check(loc(7), "chained relation", CheckSeverity::Medium)
            .with_code(codes::CHAINED_RELATIONAL);
        assert_eq!(diag.to_string(), "a.m:7:3: check (medium) [C0001]: chained relation");
    }
}
