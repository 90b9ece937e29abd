//! Collection of renameable identifiers across all input symbols.

use std::collections::BTreeSet;

use cxxsr_demangle::{is_reserved_identifier, Demangled, Token};

/// The distinct, non-reserved identifiers seen in a run.
///
/// Iteration is lexicographic by byte order. Allocation depends on the order
/// identifiers are visited, so this order is part of the output contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierSet {
    names: BTreeSet<String>,
}

impl IdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gather identifiers from a batch of demangled symbols.
    pub fn collect<'a>(symbols: impl IntoIterator<Item = &'a Demangled>) -> Self {
        let mut set = Self::new();
        for symbol in symbols {
            set.extend(&symbol.tokens);
        }
        set
    }

    /// Add the tokens of one symbol, skipping reserved ones.
    pub fn extend<'a>(&mut self, tokens: impl IntoIterator<Item = &'a Token>) {
        for token in tokens {
            self.insert(token);
        }
    }

    /// Add a token. Returns true if it was renameable and not yet present.
    pub fn insert(&mut self, token: &Token) -> bool {
        if is_renameable(token) {
            self.names.insert(token.text.clone())
        } else {
            false
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Identifiers in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Returns true if the token should receive a substitute.
pub fn is_renameable(token: &Token) -> bool {
    !token.reserved && !is_reserved_identifier(&token.text)
}
