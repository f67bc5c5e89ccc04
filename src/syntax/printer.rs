//! Print forms of nodes
//!
//! [`to_source`] renders an expression as source text. Brackets recorded
//! on a node are printed again; brackets the tree shape needs but the
//! source did not have (trees built by hand) are added, so re-parsing the
//! output gives the same tree up to bracket annotations.
//!
//! [`dump`] renders the whole tree, one node per line with relation labels.

use std::fmt::Write as _;

use super::ast::{Ast, NodeId};
use super::nodes::{Expr, Node, Stmt};
use super::visitor::Visitor;
use crate::parser::Operator;

/// Precedence level, 1 binds tightest
fn level(ast: &Ast, id: NodeId) -> u8 {
    match ast.node(id) {
        Node::Expr(expr) => match expr {
            Expr::Binary { op, .. } => binary_level(*op),
            Expr::Unary { .. } => 4,
            Expr::Postfix { .. } => 2,
            Expr::Range { .. } => 7,
            Expr::Lambda { .. } => 13,
            _ => 1,
        },
        _ => 1,
    }
}

fn binary_level(op: Operator) -> u8 {
    match op {
        Operator::ShortCircuitOr => 12,
        Operator::ShortCircuitAnd => 11,
        Operator::ElementOr => 10,
        Operator::ElementAnd => 9,
        op if op.is_relational() => 8,
        Operator::Plus | Operator::Minus => 6,
        op if op.is_power() => 2,
        _ => 5,
    }
}

struct Printer<'a> {
    ast: &'a Ast,
    out: String,
}

impl Printer<'_> {
    fn child(&mut self, id: NodeId, wrap: bool) {
        let wrap = wrap && self.ast.get(id).brackets.is_none();
        if wrap {
            self.out.push('(');
        }
        self.node(id);
        if wrap {
            self.out.push(')');
        }
    }

    fn list(&mut self, ids: &[NodeId], separator: &str) {
        for (i, &id) in ids.iter().enumerate() {
            if i > 0 {
                self.out.push_str(separator);
            }
            self.node(id);
        }
    }

    fn quoted(&mut self, text: &str, quote: char) {
        self.out.push(quote);
        for c in text.chars() {
            if c == quote {
                self.out.push(quote);
            }
            self.out.push(c);
        }
        self.out.push(quote);
    }

    fn node(&mut self, id: NodeId) {
        let ast = self.ast;
        let bracketed = ast.get(id).brackets.is_some();
        if bracketed {
            self.out.push('(');
        }
        match ast.node(id) {
            Node::Expr(expr) => self.expr(id, expr),
            Node::Row(row) => self.list(&row.items, ", "),
            Node::RowList(list) => self.list(&list.rows, "; "),
            Node::NameValue(nv) => {
                if nv.negated {
                    self.out.push('~');
                }
                self.node(nv.name);
                if let Some(value) = nv.value {
                    self.out.push_str(" = ");
                    self.node(value);
                }
            }
            other => {
                let _ = write!(self.out, "<{}>", other.kind_name());
            }
        }
        if bracketed {
            self.out.push(')');
        }
    }

    fn expr(&mut self, id: NodeId, expr: &Expr) {
        match expr {
            Expr::Identifier(name) | Expr::Number(name) => self.out.push_str(name),
            Expr::CharArray(text) => self.quoted(text, '\''),
            Expr::StringLiteral(text) => self.quoted(text, '"'),
            Expr::Selection { prefix, field } => {
                self.node(*prefix);
                self.out.push('.');
                self.node(*field);
            }
            Expr::DynamicSelection { prefix, field } => {
                self.node(*prefix);
                self.out.push_str(".(");
                self.node(*field);
                self.out.push(')');
            }
            Expr::Reference { prefix, arguments } => {
                self.node(*prefix);
                self.out.push('(');
                self.list(arguments, ", ");
                self.out.push(')');
            }
            Expr::CellReference { prefix, arguments } => {
                self.node(*prefix);
                self.out.push('{');
                self.list(arguments, ", ");
                self.out.push('}');
            }
            Expr::Range { first, stride, last } => {
                let first_level = level(self.ast, *first);
                self.child(*first, first_level >= 7);
                self.out.push(':');
                if let Some(stride) = stride {
                    let stride_level = level(self.ast, *stride);
                    self.child(*stride, stride_level >= 7);
                    self.out.push(':');
                }
                let last_level = level(self.ast, *last);
                self.child(*last, last_level >= 7);
            }
            Expr::Matrix { rows } => {
                self.out.push('[');
                self.node(*rows);
                self.out.push(']');
            }
            Expr::Cell { rows } => {
                self.out.push('{');
                self.node(*rows);
                self.out.push('}');
            }
            Expr::Unary { op, operand } => {
                self.out.push_str(op.as_str());
                let wrap = level(self.ast, *operand) > 4;
                self.child(*operand, wrap);
            }
            Expr::Postfix { op, operand } => {
                let wrap = level(self.ast, *operand) > 2;
                self.child(*operand, wrap);
                self.out.push_str(op.as_str());
            }
            Expr::Binary { op, lhs, rhs } => {
                let own = level(self.ast, id);
                let wrap_lhs = level(self.ast, *lhs) > own;
                let wrap_rhs = level(self.ast, *rhs) >= own;
                self.child(*lhs, wrap_lhs);
                if op.is_power() {
                    self.out.push_str(op.as_str());
                } else {
                    let _ = write!(self.out, " {} ", op);
                }
                self.child(*rhs, wrap_rhs);
            }
            Expr::Lambda { parameters, body } => {
                self.out.push_str("@(");
                self.list(parameters, ", ");
                self.out.push_str(") ");
                self.node(*body);
            }
            Expr::FunctionPointer { name } => {
                self.out.push('@');
                self.node(*name);
            }
            Expr::Metaclass { name } => {
                self.out.push('?');
                self.node(*name);
            }
            Expr::SuperclassReference { method, superclass } => {
                self.node(*method);
                self.out.push('@');
                self.node(*superclass);
            }
            Expr::Reshape => self.out.push(':'),
            Expr::IndexEnd => self.out.push_str("end"),
            Expr::Ignored => self.out.push('~'),
        }
    }
}

/// Render the expression (or name, row, name-value pair) at `id` as source
pub fn to_source(ast: &Ast, id: NodeId) -> String {
    let mut printer = Printer {
        ast,
        out: String::new(),
    };
    printer.node(id);
    printer.out
}

struct Dumper {
    depth: usize,
    out: String,
}

impl Visitor for Dumper {
    fn enter(&mut self, ast: &Ast, id: NodeId, _parent: Option<NodeId>, relation: &'static str) {
        let data = ast.get(id);
        let _ = write!(
            self.out,
            "{:indent$}{}: {}",
            "",
            relation,
            data.node.kind_name(),
            indent = self.depth * 2
        );
        match &data.node {
            Node::Expr(
                Expr::Identifier(text)
                | Expr::Number(text)
                | Expr::CharArray(text)
                | Expr::StringLiteral(text),
            ) => {
                let _ = write!(self.out, " {:?}", text.as_str());
            }
            Node::Expr(
                Expr::Binary { op, .. } | Expr::Unary { op, .. } | Expr::Postfix { op, .. },
            ) => {
                let _ = write!(self.out, " '{}'", op);
            }
            Node::Action(action) => {
                let _ = write!(self.out, " {}", action.kind.as_str());
            }
            Node::Function(def) => {
                let _ = write!(self.out, " {:?}", def.scope);
            }
            Node::Stmt(Stmt::ShellEscape { command }) => {
                let _ = write!(self.out, " {:?}", command.as_str());
            }
            _ => {}
        }
        let _ = writeln!(self.out, " @{}:{}", data.location.line, data.location.col_start + 1);
        self.depth += 1;
    }

    fn leave(&mut self, _ast: &Ast, _id: NodeId, _parent: Option<NodeId>, _relation: &'static str) {
        self.depth -= 1;
    }
}

impl Ast {
    /// Render the tree, one node per line
    pub fn dump(&self) -> String {
        let mut dumper = Dumper {
            depth: 0,
            out: String::new(),
        };
        self.visit(&mut dumper);
        dumper.out
    }

    /// Print form of the node at `id`
    pub fn to_source(&self, id: NodeId) -> String {
        to_source(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParseOptions, parse_source};

    fn rhs_source(src: &str) -> String {
        let result = parse_source("t.m", src, &ParseOptions::default()).unwrap();
        let ast = result.ast.unwrap();
        let stmt = ast
            .ids()
            .find(|&id| matches!(ast.stmt(id), Some(Stmt::Assignment { .. })))
            .unwrap();
        match ast.stmt(stmt) {
            Some(Stmt::Assignment { rhs, .. }) => ast.to_source(*rhs),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_print_keeps_source_brackets() {
        assert_eq!(rhs_source("x = (a + b) * c;\n"), "(a + b) * c");
        assert_eq!(rhs_source("x = a + b * c;\n"), "a + b * c");
    }

    #[test]
    fn test_print_literals() {
        assert_eq!(rhs_source("x = 'it''s';\n"), "'it''s'");
        assert_eq!(rhs_source("x = [1 2; 3 4];\n"), "[1, 2; 3, 4]");
        assert_eq!(rhs_source("x = @(a) a.^2;\n"), "@(a) a.^2");
    }

    #[test]
    fn test_dump_names_relations() {
        let result = parse_source("t.m", "y = -x';\n", &ParseOptions::default()).unwrap();
        let dump = result.ast.unwrap().dump();
        assert!(dump.starts_with("Root: Script_File"));
        assert!(dump.contains("RHS: Unary_Operation '-'"));
        assert!(dump.contains("Operand: Postfix_Operation '''"));
    }
}
