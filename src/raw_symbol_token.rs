use crate::types::{Symbol, SymbolId};

/// An unresolved symbol as it appears in the encoding: either a symbol ID awaiting lookup
/// in the stream's symbol table, or inline text (the form text Ion usually carries).
///
/// Exactly one of the two is present, which is what separates this type from a resolved
/// [Symbol] — a raw token never knows both its id and its text at once, and it records
/// nothing about which shared table (if any) a symbol ID came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSymbolToken {
    SymbolId(SymbolId),
    Text(String),
}

impl RawSymbolToken {
    /// True if this token is `sid` or spells out `text`. System constructs (like the
    /// `$ion_symbol_table` annotation) can arrive in either form depending on the
    /// encoding, so recognizing them requires checking both.
    pub fn matches(&self, sid: SymbolId, text: &str) -> bool {
        match self {
            RawSymbolToken::SymbolId(s) => *s == sid,
            RawSymbolToken::Text(t) => t == text,
        }
    }

    pub fn local_sid(&self) -> Option<SymbolId> {
        if let RawSymbolToken::SymbolId(sid) = self {
            Some(*sid)
        } else {
            None
        }
    }

    pub fn text(&self) -> Option<&str> {
        if let RawSymbolToken::Text(text) = self {
            Some(text.as_str())
        } else {
            None
        }
    }
}

impl From<SymbolId> for RawSymbolToken {
    fn from(sid: SymbolId) -> Self {
        RawSymbolToken::SymbolId(sid)
    }
}

impl From<&str> for RawSymbolToken {
    fn from(text: &str) -> Self {
        RawSymbolToken::Text(text.to_owned())
    }
}

impl From<String> for RawSymbolToken {
    fn from(text: String) -> Self {
        RawSymbolToken::Text(text)
    }
}

impl From<&RawSymbolToken> for RawSymbolToken {
    fn from(token: &RawSymbolToken) -> Self {
        token.clone()
    }
}

// Resolved symbols convert back into raw tokens on their way to a writer. A symbol whose
// text is unknown has no textual form at all; `$0` is the only token that can stand in
// for it.
impl From<&Symbol> for RawSymbolToken {
    fn from(symbol: &Symbol) -> Self {
        match symbol.text() {
            Some(text) => text.into(),
            None => RawSymbolToken::SymbolId(0),
        }
    }
}

impl From<Symbol> for RawSymbolToken {
    fn from(symbol: Symbol) -> Self {
        RawSymbolToken::from(&symbol)
    }
}

#[cfg(test)]
mod raw_symbol_token_tests {
    use super::*;

    #[test]
    fn matches_either_form() {
        assert!(RawSymbolToken::SymbolId(3).matches(3, "$ion_symbol_table"));
        assert!(RawSymbolToken::Text("$ion_symbol_table".to_string())
            .matches(3, "$ion_symbol_table"));
        assert!(!RawSymbolToken::SymbolId(4).matches(3, "$ion_symbol_table"));
        assert!(!RawSymbolToken::Text("imports".to_string()).matches(3, "$ion_symbol_table"));
    }

    #[test]
    fn symbols_with_unknown_text_become_sid_zero() {
        assert_eq!(
            RawSymbolToken::from(Symbol::unknown_text()),
            RawSymbolToken::SymbolId(0)
        );
        assert_eq!(
            RawSymbolToken::from(Symbol::owned("foo")),
            RawSymbolToken::Text("foo".to_string())
        );
    }
}
