// Symbol table: index-to-name and name-to-index mapping.

use hashbrown::HashMap;

use crate::automaton::Symbol;

/// Names of the symbols an automaton's labels refer to.
///
/// Epsilon is not a table entry; labels express it as `None`. Index 0 is the
/// first interned name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    /// Maps symbol index to its string representation.
    pub symbol_strings: Vec<String>,
    /// Maps a name back to its symbol index.
    name_to_symbol: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from names in index order. Repeated names keep their first index.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for name in names {
            table.intern(name);
        }
        table
    }

    /// Index of `name`, adding it to the table if missing.
    pub fn intern(&mut self, name: impl Into<String>) -> Symbol {
        let name = name.into();
        if let Some(&sym) = self.name_to_symbol.get(&name) {
            return sym;
        }
        let sym = self.symbol_strings.len() as Symbol;
        self.symbol_strings.push(name.clone());
        self.name_to_symbol.insert(name, sym);
        sym
    }

    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.name_to_symbol.get(name).copied()
    }

    pub fn name(&self, symbol: Symbol) -> Option<&str> {
        self.symbol_strings.get(symbol as usize).map(String::as_str)
    }

    /// Display form of a label; epsilon and unknown indices get placeholders.
    pub fn label(&self, symbol: Option<Symbol>) -> String {
        match symbol {
            None => "<eps>".to_string(),
            Some(s) => match self.name(s) {
                Some(name) => name.to_string(),
                None => format!("#{s}"),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.symbol_strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbol_strings.is_empty()
    }
}
