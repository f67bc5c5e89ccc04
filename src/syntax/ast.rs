//! Arena holding the nodes of one parsed file
//!
//! Nodes are created bottom-up: a node is allocated after its children,
//! and allocation is where every child receives its parent. Parents are
//! indices, so the tree has no ownership cycles and upward navigation is
//! O(1).

use std::fmt;
use std::sync::Arc;

use super::nodes::{ActionKind, Docstring, Expr, FunctionDef, FunctionScope, Node, Stmt, Unit};
use crate::base::Location;
use crate::parser::{ParseError, Token, TokenId};

/// Index of a node in its [`Ast`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A node plus its bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub node: Node,
    pub parent: Option<NodeId>,
    /// Token the node is anchored on (keyword, operator, name)
    pub token: Option<TokenId>,
    pub location: Location,
    /// Enclosing `(` and `)` of a parenthesised expression
    pub brackets: Option<(TokenId, TokenId)>,
}

#[derive(Debug, Clone)]
pub struct Ast {
    file: Arc<str>,
    line_count: u32,
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
}

impl Ast {
    pub(crate) fn new(file: Arc<str>, line_count: u32) -> Self {
        Self {
            file,
            line_count,
            nodes: Vec::new(),
            root: None,
        }
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Allocate `node`, making it the parent of each of its children
    pub(crate) fn alloc(
        &mut self,
        node: Node,
        token: Option<TokenId>,
        location: Location,
    ) -> Result<NodeId, ParseError> {
        let id = NodeId(self.nodes.len() as u32);
        let children = node.children();
        self.nodes.push(NodeData {
            node,
            parent: None,
            token,
            location,
            brackets: None,
        });
        for (_, child) in children {
            self.adopt(id, child)?;
        }
        Ok(id)
    }

    fn adopt(&mut self, parent: NodeId, child: NodeId) -> Result<(), ParseError> {
        let location = self.nodes.get(child.index()).map(|d| d.location.clone());
        let data = self.nodes.get_mut(child.index()).ok_or_else(|| {
            ParseError::internal(format!("dangling child {} of {}", child, parent), None)
        })?;
        if let Some(existing) = data.parent {
            return Err(ParseError::internal(
                format!("{} already has parent {}, cannot adopt into {}", child, existing, parent),
                location,
            ));
        }
        data.parent = Some(parent);
        Ok(())
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub(crate) fn set_brackets(&mut self, id: NodeId, open: TokenId, close: TokenId) {
        if let Some(data) = self.nodes.get_mut(id.index()) {
            data.brackets = Some((open, close));
        }
    }

    pub(crate) fn set_scope(&mut self, id: NodeId, scope: FunctionScope) {
        if let Some(Node::Function(def)) = self.nodes.get_mut(id.index()).map(|d| &mut d.node) {
            def.scope = scope;
        }
    }

    /// Remove and orphan the nested functions of `function`, so that they
    /// can be adopted by another node
    pub(crate) fn detach_nested(&mut self, function: NodeId) -> Result<Vec<NodeId>, ParseError> {
        let nested = match self.nodes.get_mut(function.index()).map(|d| &mut d.node) {
            Some(Node::Function(def)) => std::mem::take(&mut def.nested),
            _ => {
                return Err(ParseError::internal(
                    format!("{} is not a function definition", function),
                    None,
                ));
            }
        };
        for &child in &nested {
            if let Some(data) = self.nodes.get_mut(child.index()) {
                data.parent = None;
            }
        }
        Ok(nested)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn file(&self) -> &Arc<str> {
        &self.file
    }

    pub fn line_count(&self) -> u32 {
        self.line_count
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in allocation order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// # Panics
    /// Panics if `id` does not belong to this tree.
    pub fn get(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.get(id).node
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    pub fn location(&self, id: NodeId) -> &Location {
        &self.get(id).location
    }

    pub fn children(&self, id: NodeId) -> Vec<(&'static str, NodeId)> {
        self.node(id).children()
    }

    pub fn kind_name(&self, id: NodeId) -> &'static str {
        self.node(id).kind_name()
    }

    pub fn unit(&self) -> Option<&Unit> {
        match self.root.map(|root| self.node(root)) {
            Some(Node::Unit(unit)) => Some(unit),
            _ => None,
        }
    }

    pub fn expr(&self, id: NodeId) -> Option<&Expr> {
        match self.node(id) {
            Node::Expr(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn stmt(&self, id: NodeId) -> Option<&Stmt> {
        match self.node(id) {
            Node::Stmt(stmt) => Some(stmt),
            _ => None,
        }
    }

    pub fn function(&self, id: NodeId) -> Option<&FunctionDef> {
        match self.node(id) {
            Node::Function(def) => Some(def),
            _ => None,
        }
    }

    /// Statements of a sequence node; empty for anything else
    pub fn statements(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Node::Sequence(seq) => &seq.statements,
            _ => &[],
        }
    }

    /// Name of a function definition, e.g. `set.Value` or `foo`
    pub fn function_name(&self, id: NodeId) -> Option<String> {
        let def = self.function(id)?;
        match self.node(def.signature) {
            Node::Signature(sig) => Some(super::printer::to_source(self, sig.name)),
            _ => None,
        }
    }

    // =========================================================================
    // Indentation
    // =========================================================================

    /// Does this node indent the nodes it contains?
    pub fn causes_indentation(&self, id: NodeId) -> bool {
        match self.node(id) {
            Node::Function(_) | Node::Class(_) | Node::Block(_) => true,
            Node::Stmt(stmt) => stmt.is_compound(),
            Node::Action(action) => {
                matches!(action.kind, ActionKind::Case | ActionKind::Otherwise)
            }
            _ => false,
        }
    }

    /// Number of indenting ancestors
    pub fn indentation(&self, id: NodeId) -> u32 {
        let mut level = 0;
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            if self.causes_indentation(ancestor) {
                level += 1;
            }
            current = self.parent(ancestor);
        }
        level
    }

    // =========================================================================
    // Deferred mutation
    // =========================================================================

    /// Attach the comment block `comments` as documentation of a function
    /// or class definition
    pub fn attach_docstring(
        &mut self,
        definition: NodeId,
        comments: &[TokenId],
        tokens: &[Token],
    ) -> Result<(), ParseError> {
        let text = comments
            .iter()
            .filter_map(|id| tokens.get(id.index()))
            .map(|token| {
                token
                    .raw_text
                    .trim_start_matches(['%', '#'])
                    .trim_start_matches(' ')
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n");
        let docstring = Docstring {
            tokens: comments.to_vec(),
            text,
        };
        let location = self.nodes.get(definition.index()).map(|d| d.location.clone());
        match self.nodes.get_mut(definition.index()).map(|d| &mut d.node) {
            Some(Node::Function(def)) => def.docstring = Some(docstring),
            Some(Node::Class(def)) => def.docstring = Some(docstring),
            _ => {
                return Err(ParseError::internal(
                    format!("cannot attach a docstring to {}", definition),
                    location,
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use text_size::{TextRange, TextSize};

    use super::*;
    use crate::syntax::nodes::{Row, RowList};

    fn loc() -> Location {
        Location::new(Arc::from("t.m"), 1, 0, 0, TextRange::empty(TextSize::new(0)))
    }

    #[test]
    fn test_alloc_sets_parents() {
        let mut ast = Ast::new(Arc::from("t.m"), 1);
        let a = ast
            .alloc(Node::Expr(Expr::Number("1".into())), None, loc())
            .unwrap();
        let b = ast
            .alloc(Node::Expr(Expr::Number("2".into())), None, loc())
            .unwrap();
        let row = ast.alloc(Node::Row(Row { items: vec![a, b] }), None, loc()).unwrap();
        assert_eq!(ast.parent(a), Some(row));
        assert_eq!(ast.parent(b), Some(row));
        assert_eq!(ast.parent(row), None);
    }

    #[test]
    fn test_second_parent_is_internal_error() {
        let mut ast = Ast::new(Arc::from("t.m"), 1);
        let a = ast.alloc(Node::Expr(Expr::Reshape), None, loc()).unwrap();
        ast.alloc(Node::Row(Row { items: vec![a] }), None, loc()).unwrap();
        let err = ast
            .alloc(Node::RowList(RowList { rows: vec![a] }), None, loc())
            .unwrap_err();
        assert!(err.is_internal());
    }
}
