//! AST node families
//!
//! Each family is a closed enum; children are arena indices. Every
//! variant lists its children with a relation label through
//! [`Node::children`], which is what the visitor, the tree dump and the
//! parent bookkeeping walk.

use smol_str::SmolStr;

use super::ast::NodeId;
use crate::parser::{Operator, TokenId};

// ============================================================================
// Top level
// ============================================================================

/// A parsed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    Script {
        statements: NodeId,
        /// Script-local functions (and, in Octave, interleaved global ones)
        functions: Vec<NodeId>,
    },
    Function {
        /// Primary function first, then local functions
        functions: Vec<NodeId>,
    },
    Class {
        class: NodeId,
        /// Functions after the class `end`
        functions: Vec<NodeId>,
    },
}

impl Unit {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Script { .. } => "script",
            Self::Function { .. } => "function file",
            Self::Class { .. } => "class file",
        }
    }

    pub fn functions(&self) -> &[NodeId] {
        match self {
            Self::Script { functions, .. }
            | Self::Function { functions }
            | Self::Class { functions, .. } => functions,
        }
    }
}

/// Where a function definition sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionScope {
    /// First function of a function file
    Primary,
    /// Subsequent function of a file, or a script-local function
    Local,
    /// Defined inside another function body
    Nested,
    /// Octave: defined among script statements
    Global,
    /// Defined in a `methods` block
    Method,
}

/// Comment text attached to a definition after parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Docstring {
    pub tokens: Vec<TokenId>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub signature: NodeId,
    /// `arguments` blocks before the body
    pub validation: Vec<NodeId>,
    pub body: NodeId,
    pub nested: Vec<NodeId>,
    pub scope: FunctionScope,
    /// Closed by `end` (or `endfunction`)
    pub terminated: bool,
    pub docstring: Option<Docstring>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    pub name: NodeId,
    /// Name-value pairs from `classdef (...)`
    pub attributes: Vec<NodeId>,
    pub superclasses: Vec<NodeId>,
    pub blocks: Vec<NodeId>,
    pub docstring: Option<Docstring>,
}

/// `[outputs] = name(inputs)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: NodeId,
    pub inputs: Vec<NodeId>,
    pub outputs: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Properties,
    Methods,
    Events,
    Enumeration,
    Arguments,
}

impl BlockKind {
    pub fn from_word(word: &str) -> Option<BlockKind> {
        match word {
            "properties" => Some(Self::Properties),
            "methods" => Some(Self::Methods),
            "events" => Some(Self::Events),
            "enumeration" => Some(Self::Enumeration),
            "arguments" => Some(Self::Arguments),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Properties => "properties",
            Self::Methods => "methods",
            Self::Events => "events",
            Self::Enumeration => "enumeration",
            Self::Arguments => "arguments",
        }
    }
}

/// `properties`, `methods`, `events`, `enumeration` or `arguments` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialBlock {
    pub kind: BlockKind,
    pub attributes: Vec<NodeId>,
    pub items: Vec<NodeId>,
}

/// One property or argument declaration:
/// `name (dims) class {validators} = default`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityConstraint {
    pub name: NodeId,
    /// Class named after `.?` in an arguments block
    pub delegate: Option<NodeId>,
    pub dimensions: Vec<NodeId>,
    pub class_name: Option<NodeId>,
    pub validators: Vec<NodeId>,
    pub default: Option<NodeId>,
}

/// `Name(arguments)` in an enumeration block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationItem {
    pub name: NodeId,
    pub arguments: Vec<NodeId>,
}

/// Attribute `Name = value`, `Name`, or `~Name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameValue {
    pub name: NodeId,
    pub value: Option<NodeId>,
    pub negated: bool,
}

/// Statements in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    pub statements: Vec<NodeId>,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    /// Dotted package path without the wildcard
    pub path: SmolStr,
    pub wildcard: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pragma {
    /// `pragma Justify(tool, "tag", "reason")`
    Justify {
        tool: SmolStr,
        tag: SmolStr,
        reason: SmolStr,
    },
    /// `pragma No_Tracing`
    NoTracing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Assignment {
        lhs: NodeId,
        rhs: NodeId,
    },
    /// `[a, ~, c] = rhs`
    CompoundAssignment {
        targets: Vec<NodeId>,
        rhs: NodeId,
    },
    Expression {
        expr: NodeId,
    },
    /// `hold on`
    Command {
        name: NodeId,
        arguments: Vec<NodeId>,
    },
    Return,
    Break,
    Continue,
    Global {
        names: Vec<NodeId>,
    },
    Persistent {
        names: Vec<NodeId>,
    },
    Import {
        items: Vec<ImportItem>,
    },
    /// `if` / `elseif` / `else` actions in order
    If {
        actions: Vec<NodeId>,
    },
    Switch {
        subject: NodeId,
        actions: Vec<NodeId>,
    },
    For {
        variable: NodeId,
        range: NodeId,
        body: NodeId,
    },
    Parfor {
        variable: NodeId,
        range: NodeId,
        workers: Option<NodeId>,
        body: NodeId,
    },
    While {
        guard: NodeId,
        body: NodeId,
    },
    Try {
        body: NodeId,
        identifier: Option<NodeId>,
        handler: Option<NodeId>,
    },
    Spmd {
        workers: Option<NodeId>,
        body: NodeId,
    },
    /// Octave `do ... until cond`
    DoUntil {
        body: NodeId,
        guard: NodeId,
    },
    /// Octave `unwind_protect ... unwind_protect_cleanup ... end_unwind_protect`
    UnwindProtect {
        body: NodeId,
        cleanup: NodeId,
    },
    Pragma(Pragma),
    /// `!command`
    ShellEscape {
        command: SmolStr,
    },
}

impl Stmt {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Assignment { .. } => "Simple_Assignment_Statement",
            Self::CompoundAssignment { .. } => "Compound_Assignment_Statement",
            Self::Expression { .. } => "Naked_Expression_Statement",
            Self::Command { .. } => "Command_Statement",
            Self::Return => "Return_Statement",
            Self::Break => "Break_Statement",
            Self::Continue => "Continue_Statement",
            Self::Global { .. } => "Global_Statement",
            Self::Persistent { .. } => "Persistent_Statement",
            Self::Import { .. } => "Import_Statement",
            Self::If { .. } => "If_Statement",
            Self::Switch { .. } => "Switch_Statement",
            Self::For { .. } => "For_Loop_Statement",
            Self::Parfor { .. } => "Parfor_Statement",
            Self::While { .. } => "While_Statement",
            Self::Try { .. } => "Try_Statement",
            Self::Spmd { .. } => "SPMD_Statement",
            Self::DoUntil { .. } => "Do_Until_Statement",
            Self::UnwindProtect { .. } => "Unwind_Protect_Statement",
            Self::Pragma(_) => "Pragma",
            Self::ShellEscape { .. } => "Shell_Escape_Statement",
        }
    }

    /// Statements owning nested statement sequences
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Self::If { .. }
                | Self::Switch { .. }
                | Self::For { .. }
                | Self::Parfor { .. }
                | Self::While { .. }
                | Self::Try { .. }
                | Self::Spmd { .. }
                | Self::DoUntil { .. }
                | Self::UnwindProtect { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    If,
    Elseif,
    Else,
    Case,
    Otherwise,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Elseif => "elseif",
            Self::Else => "else",
            Self::Case => "case",
            Self::Otherwise => "otherwise",
        }
    }
}

/// One arm of an `if` or `switch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub guard: Option<NodeId>,
    pub body: NodeId,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Identifier(SmolStr),
    Number(SmolStr),
    CharArray(SmolStr),
    StringLiteral(SmolStr),
    /// `prefix.field`
    Selection {
        prefix: NodeId,
        field: NodeId,
    },
    /// `prefix.(field)`
    DynamicSelection {
        prefix: NodeId,
        field: NodeId,
    },
    /// `prefix(arguments)`
    Reference {
        prefix: NodeId,
        arguments: Vec<NodeId>,
    },
    /// `prefix{arguments}`
    CellReference {
        prefix: NodeId,
        arguments: Vec<NodeId>,
    },
    /// `first:last` or `first:stride:last`
    Range {
        first: NodeId,
        stride: Option<NodeId>,
        last: NodeId,
    },
    Matrix {
        rows: NodeId,
    },
    Cell {
        rows: NodeId,
    },
    Unary {
        op: Operator,
        operand: NodeId,
    },
    Binary {
        op: Operator,
        lhs: NodeId,
        rhs: NodeId,
    },
    /// Transposes
    Postfix {
        op: Operator,
        operand: NodeId,
    },
    /// `@(parameters) body`
    Lambda {
        parameters: Vec<NodeId>,
        body: NodeId,
    },
    /// `@name`
    FunctionPointer {
        name: NodeId,
    },
    /// `?name`
    Metaclass {
        name: NodeId,
    },
    /// `method@superclass`
    SuperclassReference {
        method: NodeId,
        superclass: NodeId,
    },
    /// Lone `:` used as an index
    Reshape,
    /// `end` inside an index
    IndexEnd,
    /// `~` in an output or input list
    Ignored,
}

impl Expr {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Identifier(_) => "Identifier",
            Self::Number(_) => "Number_Literal",
            Self::CharArray(_) => "Char_Array_Literal",
            Self::StringLiteral(_) => "String_Literal",
            Self::Selection { .. } => "Selection",
            Self::DynamicSelection { .. } => "Dynamic_Selection",
            Self::Reference { .. } => "Reference",
            Self::CellReference { .. } => "Cell_Reference",
            Self::Range { .. } => "Range_Expression",
            Self::Matrix { .. } => "Matrix_Expression",
            Self::Cell { .. } => "Cell_Expression",
            Self::Unary { .. } => "Unary_Operation",
            Self::Binary { .. } => "Binary_Operation",
            Self::Postfix { .. } => "Postfix_Operation",
            Self::Lambda { .. } => "Lambda_Function",
            Self::FunctionPointer { .. } => "Function_Pointer",
            Self::Metaclass { .. } => "Metaclass",
            Self::SuperclassReference { .. } => "Superclass_Reference",
            Self::Reshape => "Reshape",
            Self::IndexEnd => "Index_End",
            Self::Ignored => "Ignored_Output",
        }
    }

    /// Identifiers and selections of identifiers, e.g. `pkg.fn`
    pub fn is_simple_name(&self) -> bool {
        matches!(self, Self::Identifier(_) | Self::Selection { .. })
    }
}

/// One matrix or cell row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub items: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowList {
    pub rows: Vec<NodeId>,
}

// ============================================================================
// Node
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Unit(Unit),
    Function(FunctionDef),
    Class(ClassDef),
    Signature(Signature),
    Block(SpecialBlock),
    Constraint(EntityConstraint),
    Enumeration(EnumerationItem),
    NameValue(NameValue),
    Sequence(Sequence),
    Stmt(Stmt),
    Action(Action),
    Expr(Expr),
    Row(Row),
    RowList(RowList),
}

fn push_all(out: &mut Vec<(&'static str, NodeId)>, label: &'static str, ids: &[NodeId]) {
    out.extend(ids.iter().map(|&id| (label, id)));
}

fn push_opt(out: &mut Vec<(&'static str, NodeId)>, label: &'static str, id: Option<NodeId>) {
    if let Some(id) = id {
        out.push((label, id));
    }
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Unit(unit) => match unit {
                Unit::Script { .. } => "Script_File",
                Unit::Function { .. } => "Function_File",
                Unit::Class { .. } => "Class_File",
            },
            Self::Function(_) => "Function_Definition",
            Self::Class(_) => "Class_Definition",
            Self::Signature(_) => "Function_Signature",
            Self::Block(block) => match block.kind {
                BlockKind::Properties => "Special_Block(properties)",
                BlockKind::Methods => "Special_Block(methods)",
                BlockKind::Events => "Special_Block(events)",
                BlockKind::Enumeration => "Special_Block(enumeration)",
                BlockKind::Arguments => "Special_Block(arguments)",
            },
            Self::Constraint(_) => "Entity_Constraints",
            Self::Enumeration(_) => "Class_Enumeration",
            Self::NameValue(_) => "Name_Value_Pair",
            Self::Sequence(_) => "Sequence_Of_Statements",
            Self::Stmt(stmt) => stmt.kind_name(),
            Self::Action(_) => "Action",
            Self::Expr(expr) => expr.kind_name(),
            Self::Row(_) => "Row",
            Self::RowList(_) => "Row_List",
        }
    }

    /// Children with their relation labels, in source order
    pub fn children(&self) -> Vec<(&'static str, NodeId)> {
        let mut out = Vec::new();
        match self {
            Self::Unit(unit) => match unit {
                Unit::Script {
                    statements,
                    functions,
                } => {
                    out.push(("Statements", *statements));
                    push_all(&mut out, "Function", functions);
                }
                Unit::Function { functions } => push_all(&mut out, "Function", functions),
                Unit::Class { class, functions } => {
                    out.push(("Classdef", *class));
                    push_all(&mut out, "Function", functions);
                }
            },
            Self::Function(def) => {
                out.push(("Signature", def.signature));
                push_all(&mut out, "Validation", &def.validation);
                out.push(("Body", def.body));
                push_all(&mut out, "Nested", &def.nested);
            }
            Self::Class(def) => {
                out.push(("Name", def.name));
                push_all(&mut out, "Attribute", &def.attributes);
                push_all(&mut out, "Superclass", &def.superclasses);
                push_all(&mut out, "Block", &def.blocks);
            }
            Self::Signature(sig) => {
                push_all(&mut out, "Output", &sig.outputs);
                out.push(("Name", sig.name));
                push_all(&mut out, "Input", &sig.inputs);
            }
            Self::Block(block) => {
                push_all(&mut out, "Attribute", &block.attributes);
                push_all(&mut out, "Item", &block.items);
            }
            Self::Constraint(c) => {
                out.push(("Name", c.name));
                push_opt(&mut out, "Delegate", c.delegate);
                push_all(&mut out, "Dimension", &c.dimensions);
                push_opt(&mut out, "Class", c.class_name);
                push_all(&mut out, "Validator", &c.validators);
                push_opt(&mut out, "Default", c.default);
            }
            Self::Enumeration(item) => {
                out.push(("Name", item.name));
                push_all(&mut out, "Argument", &item.arguments);
            }
            Self::NameValue(nv) => {
                out.push(("Name", nv.name));
                push_opt(&mut out, "Value", nv.value);
            }
            Self::Sequence(seq) => push_all(&mut out, "Statement", &seq.statements),
            Self::Stmt(stmt) => match stmt {
                Stmt::Assignment { lhs, rhs } => {
                    out.push(("LHS", *lhs));
                    out.push(("RHS", *rhs));
                }
                Stmt::CompoundAssignment { targets, rhs } => {
                    push_all(&mut out, "LHS", targets);
                    out.push(("RHS", *rhs));
                }
                Stmt::Expression { expr } => out.push(("Expression", *expr)),
                Stmt::Command { name, arguments } => {
                    out.push(("Name", *name));
                    push_all(&mut out, "Argument", arguments);
                }
                Stmt::Global { names } | Stmt::Persistent { names } => {
                    push_all(&mut out, "Name", names)
                }
                Stmt::If { actions } => push_all(&mut out, "Action", actions),
                Stmt::Switch { subject, actions } => {
                    out.push(("Subject", *subject));
                    push_all(&mut out, "Action", actions);
                }
                Stmt::For {
                    variable,
                    range,
                    body,
                } => {
                    out.push(("Variable", *variable));
                    out.push(("Range", *range));
                    out.push(("Body", *body));
                }
                Stmt::Parfor {
                    variable,
                    range,
                    workers,
                    body,
                } => {
                    out.push(("Variable", *variable));
                    out.push(("Range", *range));
                    push_opt(&mut out, "Workers", *workers);
                    out.push(("Body", *body));
                }
                Stmt::While { guard, body } => {
                    out.push(("Guard", *guard));
                    out.push(("Body", *body));
                }
                Stmt::Try {
                    body,
                    identifier,
                    handler,
                } => {
                    out.push(("Body", *body));
                    push_opt(&mut out, "Identifier", *identifier);
                    push_opt(&mut out, "Handler", *handler);
                }
                Stmt::Spmd { workers, body } => {
                    push_opt(&mut out, "Workers", *workers);
                    out.push(("Body", *body));
                }
                Stmt::DoUntil { body, guard } => {
                    out.push(("Body", *body));
                    out.push(("Guard", *guard));
                }
                Stmt::UnwindProtect { body, cleanup } => {
                    out.push(("Body", *body));
                    out.push(("Cleanup", *cleanup));
                }
                Stmt::Return
                | Stmt::Break
                | Stmt::Continue
                | Stmt::Import { .. }
                | Stmt::Pragma(_)
                | Stmt::ShellEscape { .. } => {}
            },
            Self::Action(action) => {
                push_opt(&mut out, "Guard", action.guard);
                out.push(("Body", action.body));
            }
            Self::Expr(expr) => match expr {
                Expr::Selection { prefix, field } | Expr::DynamicSelection { prefix, field } => {
                    out.push(("Prefix", *prefix));
                    out.push(("Field", *field));
                }
                Expr::Reference { prefix, arguments }
                | Expr::CellReference { prefix, arguments } => {
                    out.push(("Prefix", *prefix));
                    push_all(&mut out, "Argument", arguments);
                }
                Expr::Range { first, stride, last } => {
                    out.push(("First", *first));
                    push_opt(&mut out, "Stride", *stride);
                    out.push(("Last", *last));
                }
                Expr::Matrix { rows } | Expr::Cell { rows } => out.push(("Content", *rows)),
                Expr::Unary { operand, .. } | Expr::Postfix { operand, .. } => {
                    out.push(("Operand", *operand))
                }
                Expr::Binary { lhs, rhs, .. } => {
                    out.push(("LHS", *lhs));
                    out.push(("RHS", *rhs));
                }
                Expr::Lambda { parameters, body } => {
                    push_all(&mut out, "Parameter", parameters);
                    out.push(("Body", *body));
                }
                Expr::FunctionPointer { name } | Expr::Metaclass { name } => {
                    out.push(("Name", *name))
                }
                Expr::SuperclassReference { method, superclass } => {
                    out.push(("Method", *method));
                    out.push(("Superclass", *superclass));
                }
                Expr::Identifier(_)
                | Expr::Number(_)
                | Expr::CharArray(_)
                | Expr::StringLiteral(_)
                | Expr::Reshape
                | Expr::IndexEnd
                | Expr::Ignored => {}
            },
            Self::Row(row) => push_all(&mut out, "Item", &row.items),
            Self::RowList(list) => push_all(&mut out, "Row", &list.rows),
        }
        out
    }
}
