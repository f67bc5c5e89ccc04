//! Parser options

/// Language dialect accepted by the tokenizer and parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Matlab,
    Octave,
}

impl Dialect {
    pub fn is_octave(&self) -> bool {
        matches!(self, Self::Octave)
    }
}

/// Options for one parse
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub dialect: Dialect,
    /// Column width of a tab character
    pub tab_width: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Matlab,
            tab_width: 8,
        }
    }
}

impl ParseOptions {
    pub fn octave() -> Self {
        Self::default().with_dialect(Dialect::Octave)
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_tab_width(mut self, tab_width: u32) -> Self {
        self.tab_width = tab_width.max(1);
        self
    }
}
