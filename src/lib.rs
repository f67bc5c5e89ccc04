//! # matlint-base
//!
//! Syntax front-end for static analysis of MATLAB and Octave code.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! diagnostics → Errors, style issues and checks raised while parsing
//!   ↓
//! syntax      → Arena AST, visitor, print forms
//!   ↓
//! parser      → Logos lexer, lookahead buffer, grammar traits
//!   ↓
//! base        → Primitives (Location, TextRange)
//! ```

// ============================================================================
// MODULES (dependency order: base → parser → syntax → diagnostics)
// ============================================================================

/// Foundation types: Location, TextRange
pub mod base;

/// Parser: Logos lexer, recursive-descent parser, grammar traits
pub mod parser;

/// Syntax: AST types, visitor, print forms
pub mod syntax;

/// Diagnostics raised while parsing
pub mod diagnostics;

pub use base::{Location, TextRange, TextSize};
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind};
pub use parser::{Dialect, ParseOptions, ParseResult, parse_source};
pub use syntax::{Ast, NodeId};
