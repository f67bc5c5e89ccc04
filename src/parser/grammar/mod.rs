//! Grammar rules for MATLAB and Octave
//!
//! - `expressions` - precedence climbing over the twelve operator levels
//! - `termination` - end-of-statement handling and its autofixes
//! - `statements` - simple and compound statements
//! - `units` - script, function and class files
//!
//! The rules are generic over a trait (`ExpressionParser` / `StatementParser`)
//! so they can be driven by any parser implementation.

pub mod expressions;
pub mod statements;
pub mod termination;
pub mod units;

pub use expressions::{ExpressionParser, parse_expression};
pub use statements::{StatementParser, parse_statement};
pub use termination::{Terminator, match_eos};
pub use units::parse_unit;
