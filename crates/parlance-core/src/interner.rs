//! String interning for message parts and atom names.
//!
//! Message parts are compared constantly while the bundle trie is walked, so
//! they are reduced to cheap integer handles up front. A `Symbol` is valid
//! only for the `Interner` that produced it.

use std::sync::Arc;

use indexmap::IndexSet;

/// A lightweight handle to an interned string.
///
/// Comparison is O(1). Symbols order by insertion, not lexicographically;
/// resolve both sides if string order matters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Symbol(u32);

impl Symbol {
    /// Raw index, for dumps and serialization.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Rebuild a Symbol from a raw index. Only for deserialization.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

/// Deduplicating string table handing out `Symbol`s.
///
/// Strings are stored behind `Arc` so resolved lexemes can be shared with
/// tokens and phrases without copying.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    strings: IndexSet<Arc<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its Symbol. Idempotent per string.
    pub fn intern(&mut self, text: &str) -> Symbol {
        if let Some(index) = self.strings.get_index_of(text) {
            return Symbol(index as u32);
        }
        let (index, _) = self.strings.insert_full(Arc::from(text));
        Symbol(index as u32)
    }

    /// Look up a string without interning it.
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.strings.get_index_of(text).map(|i| Symbol(i as u32))
    }

    /// Resolve a Symbol back to its string.
    ///
    /// # Panics
    /// Panics if the symbol was not created by this interner.
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &Arc<str> {
        self.strings
            .get_index(sym.0 as usize)
            .expect("symbol from a different interner")
    }

    /// Resolve a Symbol, returning None for foreign symbols.
    #[inline]
    pub fn try_resolve(&self, sym: Symbol) -> Option<&Arc<str>> {
        self.strings.get_index(sym.0 as usize)
    }

    /// Number of interned strings.
    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over all interned strings with their symbols.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &Arc<str>)> {
        self.strings
            .iter()
            .enumerate()
            .map(|(i, s)| (Symbol(i as u32), s))
    }
}
