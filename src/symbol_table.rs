use std::collections::HashMap;

use crate::constants::v1_0;
use crate::types::{Symbol, SymbolId};

/// Stores mappings from Symbol IDs to text and vice-versa.
///
/// Slot 0 is permanently undefined. Slots 1 through 9 hold the Ion 1.0 system symbols.
/// Higher slots are populated by shared-table imports and local symbol declarations, in
/// that order. A slot may hold no text: symbol ID 0, a non-string entry in a local table's
/// `symbols` list, or a symbol contributed by an import whose text is unavailable.
pub struct SymbolTable {
    symbols_by_id: Vec<Option<String>>,
    ids_by_text: HashMap<String, SymbolId>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Constructs a new symbol table pre-populated with the system symbols defined in the spec.
    pub fn new() -> SymbolTable {
        let mut symbol_table = SymbolTable {
            symbols_by_id: Vec::with_capacity(v1_0::SYSTEM_SYMBOLS.len()),
            ids_by_text: HashMap::new(),
        };
        symbol_table.initialize();
        symbol_table
    }

    // Interns the v1.0 system symbols
    fn initialize(&mut self) {
        for text in v1_0::SYSTEM_SYMBOLS.iter() {
            match text {
                Some(text) => {
                    let _ = self.intern(text.to_string());
                }
                None => {
                    let _ = self.add_placeholder();
                }
            }
        }
    }

    /// Discards all symbols, then re-interns the system symbols. Called when an Ion Version
    /// Marker is encountered mid-stream.
    pub fn reset(&mut self) {
        self.symbols_by_id.clear();
        self.ids_by_text.clear();
        self.initialize();
    }

    /// Interns the provided text, returning the existing symbol ID if the text was already
    /// present or assigning the next ID if it was not. IDs are never recycled within a
    /// stream.
    pub fn intern(&mut self, text: String) -> SymbolId {
        if let Some(id) = self.ids_by_text.get(&text) {
            return *id;
        }
        let id = self.symbols_by_id.len();
        self.symbols_by_id.push(Some(text.clone()));
        self.ids_by_text.insert(text, id);
        id
    }

    /// Assigns an ID to a slot whose text is unknown or undefined. The slot can never be
    /// resolved to text, but it keeps subsequent IDs aligned with the stream's table.
    pub fn add_placeholder(&mut self) -> SymbolId {
        let sid = self.symbols_by_id.len();
        self.symbols_by_id.push(None);
        sid
    }

    /// Interns `text` if it is `Some`; otherwise adds a placeholder slot.
    pub fn add_symbol_or_placeholder(&mut self, text: Option<String>) -> SymbolId {
        match text {
            Some(text) => self.intern(text),
            None => self.add_placeholder(),
        }
    }

    /// If `text` is already in the symbol table, returns the corresponding [SymbolId].
    pub fn sid_for<A: AsRef<str>>(&self, text: &A) -> Option<SymbolId> {
        self.ids_by_text.get(text.as_ref()).copied()
    }

    /// If `sid` is defined and has known text, returns that text.
    pub fn text_for(&self, sid: SymbolId) -> Option<&str> {
        self.symbols_by_id.get(sid)?.as_deref()
    }

    /// Returns a resolved [Symbol] for `sid`: its text if known, the unknown-text symbol
    /// for a defined slot without text, and `None` if `sid` is beyond the end of the table.
    pub fn symbol_for(&self, sid: SymbolId) -> Option<Symbol> {
        let slot = self.symbols_by_id.get(sid)?;
        match slot {
            Some(text) => Some(Symbol::owned(text.as_str())),
            None => Some(Symbol::unknown_text()),
        }
    }

    /// Returns true if `sid` maps to a slot in the table. The slot's text may still be
    /// unknown.
    pub fn sid_is_valid(&self, sid: SymbolId) -> bool {
        sid < self.symbols_by_id.len()
    }

    /// Returns a slice of the symbols in the table beginning at `start`, in ID order.
    pub fn symbols_tail(&self, start: usize) -> &[Option<String>] {
        &self.symbols_by_id[start..]
    }

    /// The number of slots in the table, including slot zero and any placeholder slots.
    pub fn len(&self) -> usize {
        self.symbols_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols_by_id.is_empty()
    }
}
