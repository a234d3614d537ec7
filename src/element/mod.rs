//! Provides a dynamically typed, materialized representation of an Ion value of any type.
//! This is used in contexts where the client does not know which type of Ion value is
//! expected, or when the whole tree is more convenient than a streaming cursor.

pub(crate) mod reader;
pub(crate) mod writer;

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use smallvec::SmallVec;

use crate::ion_eq::IonEq;
use crate::text::text_formatter::IonValueFormatter;
use crate::types::{Decimal, Int, IonType, Symbol, Timestamp};

/// An owned, materialized Ion value together with its annotations. `Element` is the unit
/// that [read](Element::read_all) produces and [write_to](Element::write_to) consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    annotations: Vec<Symbol>,
    value: Value,
}

/// The value of an [Element]: one of the eleven Ion types, or a typed null.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null(IonType),
    Bool(bool),
    Int(Int),
    Float(f64),
    Decimal(Decimal),
    Timestamp(Timestamp),
    Symbol(Symbol),
    String(String),
    Clob(Vec<u8>),
    Blob(Vec<u8>),
    List(Sequence),
    SExp(Sequence),
    Struct(Struct),
}

impl Element {
    pub fn new(annotations: Vec<Symbol>, value: Value) -> Element {
        Element { annotations, value }
    }

    pub fn null(null_type: IonType) -> Element {
        Value::Null(null_type).into()
    }

    pub fn boolean(value: bool) -> Element {
        Value::Bool(value).into()
    }

    pub fn integer<I: Into<Int>>(value: I) -> Element {
        Value::Int(value.into()).into()
    }

    pub fn float(value: f64) -> Element {
        Value::Float(value).into()
    }

    pub fn decimal(value: Decimal) -> Element {
        Value::Decimal(value).into()
    }

    pub fn timestamp(value: Timestamp) -> Element {
        Value::Timestamp(value).into()
    }

    pub fn symbol<S: Into<Symbol>>(value: S) -> Element {
        Value::Symbol(value.into()).into()
    }

    pub fn string<S: Into<String>>(value: S) -> Element {
        Value::String(value.into()).into()
    }

    pub fn clob<B: AsRef<[u8]>>(bytes: B) -> Element {
        Value::Clob(bytes.as_ref().to_vec()).into()
    }

    pub fn blob<B: AsRef<[u8]>>(bytes: B) -> Element {
        Value::Blob(bytes.as_ref().to_vec()).into()
    }

    pub fn list<I: IntoIterator<Item = Element>>(elements: I) -> Element {
        Value::List(elements.into_iter().collect()).into()
    }

    pub fn sexp<I: IntoIterator<Item = Element>>(elements: I) -> Element {
        Value::SExp(elements.into_iter().collect()).into()
    }

    pub fn struct_of<F, K>(fields: F) -> Element
    where
        F: IntoIterator<Item = (K, Element)>,
        K: Into<Symbol>,
    {
        Value::Struct(fields.into_iter().collect()).into()
    }

    /// Returns a copy of this element with the provided annotations in place of its own.
    pub fn with_annotations<I, S>(mut self, annotations: I) -> Element
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        self.annotations = annotations.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn annotations(&self) -> &[Symbol] {
        &self.annotations
    }

    pub fn has_annotation(&self, text: &str) -> bool {
        self.annotations
            .iter()
            .any(|annotation| annotation.text() == Some(text))
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn ion_type(&self) -> IonType {
        use Value::*;
        match &self.value {
            Null(ion_type) => *ion_type,
            Bool(_) => IonType::Bool,
            Int(_) => IonType::Int,
            Float(_) => IonType::Float,
            Decimal(_) => IonType::Decimal,
            Timestamp(_) => IonType::Timestamp,
            Symbol(_) => IonType::Symbol,
            String(_) => IonType::String,
            Clob(_) => IonType::Clob,
            Blob(_) => IonType::Blob,
            List(_) => IonType::List,
            SExp(_) => IonType::SExp,
            Struct(_) => IonType::Struct,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(&self.value, Value::Null(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.value {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&Int> {
        match &self.value {
            Value::Int(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_int().and_then(|value| value.as_i64().ok())
    }

    pub fn as_float(&self) -> Option<f64> {
        match &self.value {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&Decimal> {
        match &self.value {
            Value::Decimal(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match &self.value {
            Value::Timestamp(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match &self.value {
            Value::Symbol(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match &self.value {
            Value::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the text of this element if it is a string or a symbol with known text.
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            Value::String(value) => Some(value.as_str()),
            Value::Symbol(value) => value.text(),
            _ => None,
        }
    }

    pub fn as_lob(&self) -> Option<&[u8]> {
        match &self.value {
            Value::Clob(bytes) | Value::Blob(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match &self.value {
            Value::List(sequence) | Value::SExp(sequence) => Some(sequence),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match &self.value {
            Value::Struct(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for Element {
    fn from(value: Value) -> Self {
        Element {
            annotations: Vec::new(),
            value,
        }
    }
}

impl IonEq for Element {
    fn ion_eq(&self, other: &Self) -> bool {
        self.annotations == other.annotations && self.value.ion_eq(&other.value)
    }
}

impl IonEq for Value {
    fn ion_eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null(this), Null(that)) => this == that,
            (Bool(this), Bool(that)) => this == that,
            (Int(this), Int(that)) => this == that,
            (Float(this), Float(that)) => this.ion_eq(that),
            (Decimal(this), Decimal(that)) => this.ion_eq(that),
            (Timestamp(this), Timestamp(that)) => this.ion_eq(that),
            (Symbol(this), Symbol(that)) => this == that,
            (String(this), String(that)) => this == that,
            (Clob(this), Clob(that)) => this == that,
            (Blob(this), Blob(that)) => this == that,
            (List(this), List(that)) => this.ion_eq(that),
            (SExp(this), SExp(that)) => this.ion_eq(that),
            (Struct(this), Struct(that)) => this.ion_eq(that),
            _ => false,
        }
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for annotation in &self.annotations {
            let mut ivf = IonValueFormatter { output: &mut *f };
            match annotation.text() {
                Some(text) => ivf.format_symbol(text).map_err(|_| std::fmt::Error)?,
                None => write!(f, "$0")?,
            };
            write!(f, "::")?;
        }
        write!(f, "{}", &self.value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Value::*;
        match self {
            List(sequence) => return write!(f, "[{sequence}]"),
            SExp(sequence) => return write!(f, "({sequence})"),
            Struct(fields) => return write!(f, "{fields}"),
            _ => {}
        }
        let mut ivf = IonValueFormatter { output: f };
        let result = match self {
            Null(ion_type) => ivf.format_null(*ion_type),
            Bool(value) => ivf.format_bool(*value),
            Int(value) => ivf.format_integer(value),
            Float(value) => ivf.format_float(*value),
            Decimal(value) => ivf.format_decimal(value),
            Timestamp(value) => ivf.format_timestamp(value),
            Symbol(value) => ivf.format_symbol_token(&value.into()),
            String(value) => ivf.format_string(value),
            Clob(bytes) => ivf.format_clob(bytes),
            Blob(bytes) => ivf.format_blob(bytes),
            List(_) | SExp(_) | Struct(_) => unreachable!("containers are rendered above"),
        };
        result.map_err(|_| std::fmt::Error)
    }
}

/// An ordered sequence of elements: the body of a list or s-expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    elements: Vec<Element>,
}

impl Sequence {
    pub fn new(elements: Vec<Element>) -> Sequence {
        Sequence { elements }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl FromIterator<Element> for Sequence {
    fn from_iter<T: IntoIterator<Item = Element>>(iter: T) -> Self {
        Sequence {
            elements: iter.into_iter().collect(),
        }
    }
}

impl IonEq for Sequence {
    fn ion_eq(&self, other: &Self) -> bool {
        self.elements.ion_eq(&other.elements)
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for element in &self.elements {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{element}")?;
            first = false;
        }
        Ok(())
    }
}

// Indexes into a Struct's field vector. Most field names appear once, so a single inline
// index covers the common case.
type IndexVec = SmallVec<[usize; 1]>;

/// An ordered multimap from [Symbol] to [Element]: the body of a struct. Fields iterate in
/// the order they were inserted, and duplicate field names are preserved.
#[derive(Debug, Clone, Default)]
pub struct Struct {
    // Field name/value pairs in the order they were inserted
    by_index: Vec<(Symbol, Element)>,
    // Maps known-text field names to the indexes in `by_index` where their values live
    by_name: HashMap<String, IndexVec>,
}

impl Struct {
    /// Returns an iterator over this struct's fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&Symbol, &Element)> {
        self.by_index
            .iter()
            .map(|(field_name, element)| (field_name, element))
    }

    /// Returns the value of the first field with the provided name, if one exists.
    pub fn get<A: AsRef<str>>(&self, field_name: A) -> Option<&Element> {
        let index = *self.by_name.get(field_name.as_ref())?.first()?;
        self.by_index.get(index).map(|(_, element)| element)
    }

    /// Returns every value associated with the provided field name, in insertion order.
    pub fn get_all<'a, A: AsRef<str>>(
        &'a self,
        field_name: A,
    ) -> impl Iterator<Item = &'a Element> {
        let indexes = self
            .by_name
            .get(field_name.as_ref())
            .map(|indexes| indexes.as_slice())
            .unwrap_or(&[]);
        indexes
            .iter()
            .flat_map(|index| self.by_index.get(*index))
            .map(|(_, element)| element)
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    fn insert(&mut self, field_name: Symbol, element: Element) {
        let index = self.by_index.len();
        if let Some(text) = field_name.text() {
            self.by_name
                .entry(text.to_string())
                .or_insert_with(IndexVec::new)
                .push(index);
        }
        self.by_index.push((field_name, element));
    }

    // Counts the fields of `this` whose (name, value) pair matches `target` under `values_eq`.
    fn count_matching_fields<F>(
        fields: &[(Symbol, Element)],
        target: &(Symbol, Element),
        values_eq: F,
    ) -> usize
    where
        F: Fn(&Element, &Element) -> bool,
    {
        fields
            .iter()
            .filter(|(name, value)| *name == target.0 && values_eq(value, &target.1))
            .count()
    }

    // Multiset equality over (name, value) pairs: Ion structs are unordered, but duplicate
    // fields must appear with matching multiplicity.
    fn fields_are_equivalent<F>(&self, other: &Self, values_eq: F) -> bool
    where
        F: Fn(&Element, &Element) -> bool + Copy,
    {
        if self.by_index.len() != other.by_index.len() {
            return false;
        }
        self.by_index.iter().all(|field| {
            Self::count_matching_fields(&self.by_index, field, values_eq)
                == Self::count_matching_fields(&other.by_index, field, values_eq)
        })
    }
}

impl<K: Into<Symbol>> FromIterator<(K, Element)> for Struct {
    fn from_iter<T: IntoIterator<Item = (K, Element)>>(iter: T) -> Self {
        let mut fields = Struct::default();
        for (field_name, element) in iter {
            fields.insert(field_name.into(), element);
        }
        fields
    }
}

impl PartialEq for Struct {
    fn eq(&self, other: &Self) -> bool {
        self.fields_are_equivalent(other, |e1, e2| e1 == e2)
    }
}

impl IonEq for Struct {
    fn ion_eq(&self, other: &Self) -> bool {
        self.fields_are_equivalent(other, |e1, e2| e1.ion_eq(e2))
    }
}

impl Display for Struct {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for (field_name, element) in self.fields() {
            if !first {
                write!(f, ", ")?;
            }
            let mut ivf = IonValueFormatter { output: &mut *f };
            ivf.format_symbol_token(&field_name.into())
                .map_err(|_| std::fmt::Error)?;
            write!(f, ": {element}")?;
            first = false;
        }
        write!(f, "}}")
    }
}
