//! Autofix instructions and AST back-links, kept beside the token vector
//!
//! Tokens stay plain values; everything the parser (and later the style
//! pass) learns about a token lives in these tables keyed by [`TokenId`].

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use super::errors::ParseError;
use super::token::TokenId;
use crate::syntax::NodeId;

/// Accumulated autofix instruction for one token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fix {
    pub ensure_ws_before: bool,
    pub ensure_ws_after: bool,
    pub ensure_trim_before: bool,
    pub ensure_trim_after: bool,
    pub delete: bool,
    /// Indentation the token should have, in columns
    pub correct_indent: Option<u32>,
    pub add_newline: bool,
    pub add_semicolon: bool,
    pub change_to_semicolon: bool,
    pub replace_with_newline: bool,
    pub spurious: bool,
    pub statement_terminator: bool,
    pub binary_operator: bool,
    pub unary_operator: bool,
}

impl Fix {
    /// True if applying this fix changes the source text; pure
    /// classification flags do not count.
    pub fn is_repair(&self) -> bool {
        self.ensure_ws_before
            || self.ensure_ws_after
            || self.ensure_trim_before
            || self.ensure_trim_after
            || self.delete
            || self.correct_indent.is_some()
            || self.add_newline
            || self.add_semicolon
            || self.change_to_semicolon
            || self.replace_with_newline
    }
}

/// Parallel store of fixes, in the order tokens were first touched
#[derive(Debug, Clone, Default)]
pub struct FixTable {
    fixes: IndexMap<TokenId, Fix, FxBuildHasher>,
}

impl FixTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token: TokenId) -> Option<&Fix> {
        self.fixes.get(&token)
    }

    /// Fix entry for `token`, created on first use
    pub fn entry(&mut self, token: TokenId) -> &mut Fix {
        self.fixes.entry(token).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &Fix)> {
        self.fixes.iter().map(|(id, fix)| (*id, fix))
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    /// Number of tokens carrying a text-changing instruction
    pub fn repair_count(&self) -> usize {
        self.fixes.values().filter(|fix| fix.is_repair()).count()
    }
}

/// Token to consuming-node back references, each set at most once
#[derive(Debug, Clone, Default)]
pub struct TokenLinks {
    links: IndexMap<TokenId, NodeId, FxBuildHasher>,
}

impl TokenLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, token: TokenId, node: NodeId) -> Result<(), ParseError> {
        if let Some(existing) = self.links.get(&token) {
            return Err(ParseError::internal(
                format!("token {} already linked to {}, relinking to {}", token, existing, node),
                None,
            ));
        }
        self.links.insert(token, node);
        Ok(())
    }

    pub fn get(&self, token: TokenId) -> Option<NodeId> {
        self.links.get(&token).copied()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TokenId, NodeId)> + '_ {
        self.links.iter().map(|(t, n)| (*t, *n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_not_repair() {
        let fix = Fix {
            statement_terminator: true,
            binary_operator: true,
            ..Fix::default()
        };
        assert!(!fix.is_repair());
        let fix = Fix {
            add_semicolon: true,
            ..Fix::default()
        };
        assert!(fix.is_repair());
    }

    #[test]
    fn test_fix_table_entry_accumulates() {
        let mut table = FixTable::new();
        table.entry(TokenId(3)).spurious = true;
        table.entry(TokenId(3)).delete = true;
        table.entry(TokenId(1)).statement_terminator = true;
        assert_eq!(table.len(), 2);
        assert_eq!(table.repair_count(), 1);
        let order: Vec<_> = table.iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![TokenId(3), TokenId(1)]);
    }

    #[test]
    fn test_links_are_set_once() {
        let mut links = TokenLinks::new();
        links.set(TokenId(0), NodeId(1)).unwrap();
        assert_eq!(links.get(TokenId(0)), Some(NodeId(1)));
        assert!(links.set(TokenId(0), NodeId(2)).unwrap_err().is_internal());
    }
}
