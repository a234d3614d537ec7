use std::fmt::{Display, Formatter};

use delegate::delegate;

use crate::constants::v1_0::system_symbol_ids;
use crate::raw_reader::{RawReader, RawStreamItem};
use crate::result::{decoding_error, IonResult};
use crate::symbol_table::SymbolTable;
use crate::types::IonType;

/// Stream components that a [SystemReader] distinguishes. Encoding artifacts (version
/// markers and local symbol table structs) are reported separately from user data so that a
/// user-level reader can skip them.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SystemStreamItem {
    /// An Ion Version Marker; reading one resets the local symbol table.
    VersionMarker(u8, u8),
    /// A `$ion_symbol_table`-annotated struct. Its contents have already been applied to
    /// the reader's symbol table by the time this item is returned.
    SymbolTableValue(IonType),
    /// A non-null Ion value and its corresponding Ion data type.
    Value(IonType),
    /// A null Ion value and its corresponding Ion data type.
    Null(IonType),
    /// The end of the current sequence (container or stream).
    Nothing,
}

impl Display for SystemStreamItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use SystemStreamItem::*;
        match self {
            VersionMarker(major, minor) => write!(f, "<IVM v{major}.{minor}>"),
            SymbolTableValue(ion_type) => write!(f, "symbol table ({ion_type})"),
            Value(ion_type) => write!(f, "{ion_type}"),
            Null(ion_type) => write!(f, "null.{ion_type}"),
            Nothing => write!(f, "<nothing>"),
        }
    }
}

/// Wraps a [RawReader], maintaining the stream's symbol table as directed by the system
/// values (IVMs and local symbol table structs) it encounters.
pub struct SystemReader<R: RawReader> {
    raw_reader: R,
    symbol_table: SymbolTable,
}

impl<R: RawReader> SystemReader<R> {
    pub fn new(raw_reader: R) -> SystemReader<R> {
        SystemReader {
            raw_reader,
            symbol_table: SymbolTable::new(),
        }
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    delegate! {
        to self.raw_reader {
            pub fn ion_version(&self) -> (u8, u8);
            pub fn depth(&self) -> usize;
            pub fn parent_type(&self) -> Option<IonType>;
        }
    }

    /// Provides access to the underlying raw reader, through which the current value's
    /// content and metadata (field name, annotations) can be read.
    pub fn raw_reader(&self) -> &R {
        &self.raw_reader
    }

    pub fn raw_reader_mut(&mut self) -> &mut R {
        &mut self.raw_reader
    }

    /// Advances the raw reader to the next stream item, interpreting any system-level
    /// constructs it encounters along the way.
    pub fn next(&mut self) -> IonResult<SystemStreamItem> {
        match self.raw_reader.next()? {
            RawStreamItem::VersionMarker(major, minor) => {
                // A new stream segment begins with a bare system symbol table.
                self.symbol_table.reset();
                Ok(SystemStreamItem::VersionMarker(major, minor))
            }
            RawStreamItem::Value(IonType::Struct)
                if self.raw_reader.depth() == 0 && self.current_struct_is_symbol_table() =>
            {
                self.process_local_symbol_table()?;
                Ok(SystemStreamItem::SymbolTableValue(IonType::Struct))
            }
            RawStreamItem::Value(ion_type) => Ok(SystemStreamItem::Value(ion_type)),
            RawStreamItem::Null(ion_type) => Ok(SystemStreamItem::Null(ion_type)),
            RawStreamItem::Nothing => Ok(SystemStreamItem::Nothing),
        }
    }

    fn current_struct_is_symbol_table(&self) -> bool {
        self.raw_reader
            .annotations()
            .first()
            .map(|annotation| {
                annotation.matches(system_symbol_ids::ION_SYMBOL_TABLE, "$ion_symbol_table")
            })
            .unwrap_or(false)
    }

    // Reads the struct the raw reader is currently positioned on and applies it to the
    // symbol table. The `imports` field selects between appending to the current table
    // (`imports: $ion_symbol_table`) and starting over; the `symbols` field contributes new
    // local slots in order. Fields are collected before anything is applied, because the
    // struct's field order is not constrained.
    fn process_local_symbol_table(&mut self) -> IonResult<()> {
        let mut is_append = false;
        let mut imported_slots: usize = 0;
        let mut new_symbols: Vec<Option<String>> = Vec::new();

        self.raw_reader.step_in()?;
        loop {
            let item = self.raw_reader.next()?;
            if item == RawStreamItem::Nothing {
                break;
            }
            let field_name = match self.raw_reader.field_name() {
                Some(field_name) => field_name.clone(),
                None => return decoding_error("found a struct field with no name"),
            };
            if field_name.matches(system_symbol_ids::IMPORTS, "imports") {
                match item {
                    RawStreamItem::Value(IonType::Symbol) => {
                        let token = self.raw_reader.read_symbol()?;
                        is_append = token
                            .matches(system_symbol_ids::ION_SYMBOL_TABLE, "$ion_symbol_table");
                    }
                    RawStreamItem::Value(IonType::List) => {
                        imported_slots = self.process_imports()?;
                    }
                    // Any other value makes no assertion about imports
                    _ => {}
                }
            } else if field_name.matches(system_symbol_ids::SYMBOLS, "symbols") {
                if let RawStreamItem::Value(IonType::List) = item {
                    self.raw_reader.step_in()?;
                    loop {
                        match self.raw_reader.next()? {
                            RawStreamItem::Nothing => break,
                            RawStreamItem::Value(IonType::String) => {
                                new_symbols.push(Some(self.raw_reader.read_string()?));
                            }
                            // Non-string entries claim a slot but cannot be resolved
                            RawStreamItem::Value(_) | RawStreamItem::Null(_) => {
                                new_symbols.push(None);
                            }
                            RawStreamItem::VersionMarker(_, _) => {
                                return decoding_error(
                                    "found an Ion version marker inside a symbols list",
                                )
                            }
                        }
                    }
                    self.raw_reader.step_out()?;
                }
                // A non-list `symbols` field contributes nothing
            }
            // All other fields (name, version, max_id, ...) are ignored in a local table
        }
        self.raw_reader.step_out()?;

        if !is_append {
            self.symbol_table.reset();
        }
        for _ in 0..imported_slots {
            self.symbol_table.add_placeholder();
        }
        for entry in new_symbols {
            self.symbol_table.add_symbol_or_placeholder(entry);
        }
        Ok(())
    }

    // Walks the `imports` list, returning the total number of symbol table slots the
    // declared shared tables occupy. With no catalog to supply the tables' text, every
    // imported slot is a placeholder; an import that does not declare a max_id cannot be
    // sized and is rejected.
    fn process_imports(&mut self) -> IonResult<usize> {
        let mut total_slots = 0usize;
        self.raw_reader.step_in()?;
        loop {
            match self.raw_reader.next()? {
                RawStreamItem::Nothing => break,
                RawStreamItem::Value(IonType::Struct) => {
                    let mut name: Option<String> = None;
                    let mut max_id: Option<usize> = None;
                    self.raw_reader.step_in()?;
                    loop {
                        let item = self.raw_reader.next()?;
                        if item == RawStreamItem::Nothing {
                            break;
                        }
                        let field_name = match self.raw_reader.field_name() {
                            Some(field_name) => field_name.clone(),
                            None => return decoding_error("found a struct field with no name"),
                        };
                        if field_name.matches(system_symbol_ids::NAME, "name") {
                            if let RawStreamItem::Value(IonType::String) = item {
                                name = Some(self.raw_reader.read_string()?);
                            }
                        } else if field_name.matches(system_symbol_ids::MAX_ID, "max_id") {
                            if let RawStreamItem::Value(IonType::Int) = item {
                                let value = self.raw_reader.read_i64()?;
                                if value >= 0 {
                                    max_id = Some(value as usize);
                                }
                            }
                        }
                    }
                    self.raw_reader.step_out()?;

                    let name = match name {
                        // An import with no name makes no assertion
                        None => continue,
                        Some(name) => name,
                    };
                    // Imports of the system table are redundant and ignored
                    if name == "$ion" {
                        continue;
                    }
                    match max_id {
                        Some(max_id) => total_slots += max_id,
                        None => {
                            return decoding_error(format!(
                                "cannot import shared table '{name}' without a max_id: no catalog is available"
                            ))
                        }
                    }
                }
                // Non-struct entries make no assertion
                RawStreamItem::Value(_) | RawStreamItem::Null(_) => {}
                RawStreamItem::VersionMarker(_, _) => {
                    return decoding_error("found an Ion version marker inside an imports list")
                }
            }
        }
        self.raw_reader.step_out()?;
        Ok(total_slots)
    }
}
