//! Row images carried in the `before` / `after` slots of an envelope.

use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A single column value with its semantic type.
///
/// Ids, integers and epoch-millis timestamps all encode as JSON integers and
/// decimals as JSON numbers, matching what Debezium emits with
/// `decimal.handling.mode=double`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Id(u64),
    Text(String),
    Decimal(Decimal),
    TimestampMillis(i64),
    Integer(i64),
}

impl FieldValue {
    pub fn as_id(&self) -> Option<u64> {
        match self {
            FieldValue::Id(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Id(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Id(v) => serializer.serialize_u64(*v),
            FieldValue::Text(v) => serializer.serialize_str(v),
            FieldValue::Decimal(v) => rust_decimal::serde::float::serialize(v, serializer),
            FieldValue::TimestampMillis(v) | FieldValue::Integer(v) => serializer.serialize_i64(*v),
        }
    }
}

/// Ordered mapping of column name to value.
///
/// Columns keep insertion order so the serialized object mirrors the table
/// layout; `set` on an existing column replaces it in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace a column, returning the previous value if any.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of columns whose values differ between `self` and `other`,
    /// including columns present on only one side.
    pub fn differing_fields<'a>(&'a self, other: &'a Record) -> Vec<&'a str> {
        let mut diff: Vec<&str> = self
            .fields()
            .filter(|(name, value)| other.get(name) != Some(*value))
            .map(|(name, _)| name)
            .collect();

        diff.extend(
            other
                .fields()
                .filter(|(name, _)| self.get(name).is_none())
                .map(|(name, _)| name),
        );

        diff
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
