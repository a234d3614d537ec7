use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The text of a fully resolved symbol, or the absence thereof.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
enum SymbolText {
    // This symbol's text is known
    Text(String),
    // This symbol's text is unknown; it was resolved from symbol ID zero or from a slot
    // contributed by an inaccessible shared table import.
    Unknown,
}

impl SymbolText {
    fn text(&self) -> Option<&str> {
        match self {
            SymbolText::Text(text) => Some(text.as_str()),
            SymbolText::Unknown => None,
        }
    }
}

/// A fully resolved symbol: either a string or the special "unknown text" symbol `$0`.
/// Symbols appear as values, annotations, and struct field names.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Symbol {
    text: SymbolText,
}

impl Symbol {
    pub fn owned<I: Into<String>>(text: I) -> Symbol {
        Symbol {
            text: SymbolText::Text(text.into()),
        }
    }

    /// Constructs the unresolvable symbol `$0`.
    pub fn unknown_text() -> Symbol {
        Symbol {
            text: SymbolText::Unknown,
        }
    }

    /// Returns this symbol's text, or `None` if it is `$0`.
    pub fn text(&self) -> Option<&str> {
        self.text.text()
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Symbols with known text hash as that text so that `Symbol` keys can be
        // looked up by `&str` via `Borrow`.
        match self.text() {
            Some(text) => text.hash(state),
            None => "".hash(state),
        }
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        // A symbol with unknown text sorts before any symbol with known text.
        match (self.text(), other.text()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(this), Some(that)) => this.cmp(that),
        }
    }
}

impl From<&str> for Symbol {
    fn from(text: &str) -> Self {
        Symbol::owned(text)
    }
}

impl From<String> for Symbol {
    fn from(text: String) -> Self {
        Symbol::owned(text)
    }
}

impl From<&Symbol> for Symbol {
    fn from(symbol: &Symbol) -> Self {
        symbol.clone()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => write!(f, "{text}"),
            None => write!(f, "$0"),
        }
    }
}

#[cfg(test)]
mod symbol_tests {
    use super::*;

    #[test]
    fn unknown_text_is_not_empty_text() {
        assert_ne!(Symbol::unknown_text(), Symbol::owned(""));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Symbol::owned("hello").to_string(), "hello");
        assert_eq!(Symbol::unknown_text().to_string(), "$0");
    }

    #[test]
    fn ordering() {
        let mut symbols = vec![
            Symbol::owned("foo"),
            Symbol::unknown_text(),
            Symbol::owned("bar"),
        ];
        symbols.sort();
        assert_eq!(
            symbols,
            vec![
                Symbol::unknown_text(),
                Symbol::owned("bar"),
                Symbol::owned("foo"),
            ]
        );
    }
}
