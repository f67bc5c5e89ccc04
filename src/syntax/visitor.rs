//! Generic traversal of an [`Ast`]
//!
//! Consumers implement [`Visitor`] and get `enter`/`leave` calls in
//! pre-order/post-order pairs, children in source order. The relation
//! label is the edge tag from [`Node::children`](super::Node::children),
//! `"Root"` for the node the walk starts at.

use super::ast::{Ast, NodeId};

pub trait Visitor {
    fn enter(&mut self, _ast: &Ast, _id: NodeId, _parent: Option<NodeId>, _relation: &'static str) {}

    fn leave(&mut self, _ast: &Ast, _id: NodeId, _parent: Option<NodeId>, _relation: &'static str) {}
}

/// Walk the subtree at `start`. Uses an explicit stack, so deeply nested
/// expressions do not grow the call stack.
pub fn walk<V: Visitor + ?Sized>(ast: &Ast, start: NodeId, visitor: &mut V) {
    enum Step {
        Enter(NodeId, Option<NodeId>, &'static str),
        Leave(NodeId, Option<NodeId>, &'static str),
    }

    let mut stack = vec![Step::Enter(start, ast.parent(start), "Root")];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id, parent, relation) => {
                visitor.enter(ast, id, parent, relation);
                stack.push(Step::Leave(id, parent, relation));
                for (label, child) in ast.children(id).into_iter().rev() {
                    stack.push(Step::Enter(child, Some(id), label));
                }
            }
            Step::Leave(id, parent, relation) => visitor.leave(ast, id, parent, relation),
        }
    }
}

impl Ast {
    /// Walk the whole tree from the root
    pub fn visit<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        if let Some(root) = self.root() {
            walk(self, root, visitor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParseOptions, parse_source};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Visitor for Recorder {
        fn enter(&mut self, ast: &Ast, id: NodeId, _parent: Option<NodeId>, relation: &'static str) {
            self.events.push(format!("+{}:{}", relation, ast.kind_name(id)));
        }

        fn leave(&mut self, ast: &Ast, id: NodeId, _parent: Option<NodeId>, _relation: &'static str) {
            self.events.push(format!("-{}", ast.kind_name(id)));
        }
    }

    #[test]
    fn test_enter_leave_pairs_in_source_order() {
        let result = parse_source("t.m", "x = a + 1;\n", &ParseOptions::default()).unwrap();
        let ast = result.ast.unwrap();
        let mut recorder = Recorder::default();
        ast.visit(&mut recorder);
        assert_eq!(
            recorder.events,
            vec![
                "+Root:Script_File",
                "+Statements:Sequence_Of_Statements",
                "+Statement:Simple_Assignment_Statement",
                "+LHS:Identifier",
                "-Identifier",
                "+RHS:Binary_Operation",
                "+LHS:Identifier",
                "-Identifier",
                "+RHS:Number_Literal",
                "-Number_Literal",
                "-Binary_Operation",
                "-Simple_Assignment_Statement",
                "-Sequence_Of_Statements",
                "-Script_File",
            ]
        );
    }
}
