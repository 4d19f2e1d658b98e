//! Declared field metadata for structural inspection.
//!
//! Types that take part in the field-completeness check describe their own
//! fields through [`Inspect`]: a name, whether the field may be left empty,
//! and a view of its value. Walkers only ever see this table, so the
//! optional/required classification lives next to the type definition.

use serde_json::Value;

/// A view of one field value, reduced to what emptiness checks need.
#[derive(Clone, Copy)]
pub enum FieldValue<'a> {
    Text(&'a str),
    /// An embedded raw document kept as-is.
    Raw(&'a Value),
    Seq(usize),
    Map(usize),
    Int(i64),
    Float(f64),
    /// An optional reference: only presence matters.
    Ref(bool),
    Struct(&'a dyn Inspect),
}

impl<'a> FieldValue<'a> {
    pub fn text(s: &'a str) -> Self {
        FieldValue::Text(s)
    }

    pub fn seq<T>(items: &'a [T]) -> Self {
        FieldValue::Seq(items.len())
    }

    pub fn map<K, V>(map: &'a std::collections::BTreeMap<K, V>) -> Self {
        FieldValue::Map(map.len())
    }

    pub fn opt<T>(value: &'a Option<T>) -> Self {
        FieldValue::Ref(value.is_some())
    }

    /// Whether the value counts as unset.
    ///
    /// A structured value is empty when every one of its own fields is.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Raw(v) => match v {
                Value::Null => true,
                Value::String(s) => s.is_empty() || s == "null",
                _ => false,
            },
            FieldValue::Seq(len) | FieldValue::Map(len) => *len == 0,
            FieldValue::Int(n) => *n == 0,
            FieldValue::Float(n) => *n == 0.0,
            FieldValue::Ref(present) => !present,
            FieldValue::Struct(inner) => inner.fields().iter().all(|f| f.value.is_empty()),
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, FieldValue::Struct(_))
    }
}

/// One row of a type's field table.
pub struct FieldMeta<'a> {
    pub name: &'static str,
    pub optional: bool,
    pub value: FieldValue<'a>,
}

impl<'a> FieldMeta<'a> {
    pub fn required(name: &'static str, value: FieldValue<'a>) -> Self {
        Self {
            name,
            optional: false,
            value,
        }
    }

    pub fn optional(name: &'static str, value: FieldValue<'a>) -> Self {
        Self {
            name,
            optional: true,
            value,
        }
    }
}

/// A type whose fields can be walked without runtime reflection.
pub trait Inspect {
    fn fields(&self) -> Vec<FieldMeta<'_>>;
}
