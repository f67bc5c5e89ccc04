//! Stack of enclosing constructs
//!
//! The parser pushes a context when it enters a function, class, loop,
//! `if`, `switch` or other block and pops it on the way out. The stack
//! answers legality questions (`break` needs a loop in the same function)
//! and names the innermost construct in error messages.

use super::errors::ParseError;

/// Kind of an enclosing construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKind {
    Function,
    Class,
    Loop,
    If,
    Switch,
    /// `try`, `spmd`, `unwind_protect` and class-body blocks
    Block,
}

impl ContextKind {
    /// Human-readable description of this context for error messages
    pub fn description(&self) -> &'static str {
        match self {
            Self::Function => "in function body",
            Self::Class => "in class body",
            Self::Loop => "in loop body",
            Self::If => "in if statement",
            Self::Switch => "in switch statement",
            Self::Block => "in block",
        }
    }

    /// What may appear next in this context
    pub fn expected_description(&self) -> &'static str {
        match self {
            Self::Function => "a statement, nested function or 'end'",
            Self::Class => "properties, methods, events, enumeration or 'end'",
            Self::Loop => "a statement or 'end'",
            Self::If => "a statement, 'elseif', 'else' or 'end'",
            Self::Switch => "'case', 'otherwise' or 'end'",
            Self::Block => "a statement or the closing keyword",
        }
    }

    /// Functions and classes hide everything outside them
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::Function | Self::Class)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    stack: Vec<ContextKind>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ContextKind) {
        tracing::trace!(?kind, depth = self.stack.len(), "enter context");
        self.stack.push(kind);
    }

    /// Pop `expected`; anything else on top is a parser defect
    pub fn pop(&mut self, expected: ContextKind) -> Result<(), ParseError> {
        match self.stack.pop() {
            Some(kind) if kind == expected => Ok(()),
            Some(kind) => Err(ParseError::internal(
                format!("context mismatch: expected {:?}, found {:?}", expected, kind),
                None,
            )),
            None => Err(ParseError::internal("context stack underflow", None)),
        }
    }

    pub fn top(&self) -> Option<ContextKind> {
        self.stack.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Search from the top for `kind` without crossing a function or
    /// class boundary (the boundary itself is still visible).
    pub fn in_context(&self, kind: ContextKind) -> bool {
        for &ctx in self.stack.iter().rev() {
            if ctx == kind {
                return true;
            }
            if ctx.is_boundary() {
                return false;
            }
        }
        false
    }

    /// True if the innermost construct is `kind`
    pub fn directly_in(&self, kind: ContextKind) -> bool {
        self.top() == Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_is_visible_through_if() {
        let mut ctx = ContextStack::new();
        ctx.push(ContextKind::Function);
        ctx.push(ContextKind::Loop);
        ctx.push(ContextKind::If);
        assert!(ctx.in_context(ContextKind::Loop));
        assert!(ctx.in_context(ContextKind::Function));
        assert!(!ctx.in_context(ContextKind::Switch));
    }

    #[test]
    fn test_function_boundary_hides_outer_loop() {
        let mut ctx = ContextStack::new();
        ctx.push(ContextKind::Loop);
        ctx.push(ContextKind::Function);
        assert!(!ctx.in_context(ContextKind::Loop));
        assert!(ctx.directly_in(ContextKind::Function));
    }

    #[test]
    fn test_pop_checks_kind() {
        let mut ctx = ContextStack::new();
        ctx.push(ContextKind::If);
        assert!(ctx.pop(ContextKind::Loop).unwrap_err().is_internal());
        assert!(ctx.pop(ContextKind::If).unwrap_err().is_internal());
    }

    #[test]
    fn test_pop_balanced() {
        let mut ctx = ContextStack::new();
        ctx.push(ContextKind::Switch);
        ctx.pop(ContextKind::Switch).unwrap();
        assert!(ctx.is_empty());
    }
}
