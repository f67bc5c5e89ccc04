//! Abstract syntax tree
//!
//! Nodes live in an arena ([`Ast`]) and refer to each other by [`NodeId`].
//! Every node knows its parent and the token it is anchored on.

mod ast;
mod nodes;
mod printer;
mod visitor;

pub use ast::{Ast, NodeData, NodeId};
pub use nodes::{
    Action, ActionKind, BlockKind, ClassDef, Docstring, EntityConstraint, EnumerationItem, Expr,
    FunctionDef, FunctionScope, ImportItem, NameValue, Node, Pragma, Row, RowList, Sequence,
    Signature, SpecialBlock, Stmt, Unit,
};
pub use printer::to_source;
pub use visitor::{Visitor, walk};
