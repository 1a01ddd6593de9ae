use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fields;

/// Lifecycle status carried by every record.
///
/// Stored as the single-letter codes `"A"`/`"I"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "A")]
    Active,
    #[serde(rename = "I")]
    Inactive,
}

impl Status {
    /// Returns the stored single-letter code for this status.
    pub fn code(&self) -> &'static str {
        match self {
            Status::Active => "A",
            Status::Inactive => "I",
        }
    }

    /// Parses a status from its stored code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(Status::Active),
            "I" => Some(Status::Inactive),
            _ => None,
        }
    }
}

/// Patient sex, stored as the single-letter codes `"M"`/`"F"`.
///
/// Absence of the field on a record means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Sex::Male),
            "F" => Some(Sex::Female),
            _ => None,
        }
    }
}

/// A typed field value as it crosses the storage boundary.
///
/// `List` only appears as the right-hand side of an `In` lookup; records
/// themselves hold scalar values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Str(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Id(Uuid),
    Status(Status),
    Sex(Sex),
    List(Vec<Value>),
}

impl Value {
    /// Orders two values of the same variant.
    ///
    /// Cross-variant comparisons have no defined order and return `None`;
    /// filter evaluation treats that as a non-match rather than an error.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Id(a), Value::Id(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Substring containment: does this (string) value contain `query`?
    ///
    /// Defined only for string/string pairs; anything else is a non-match.
    /// The match is case-sensitive.
    pub fn contains(&self, query: &Value) -> bool {
        match (self, query) {
            (Value::Str(field), Value::Str(needle)) => field.contains(needle.as_str()),
            _ => false,
        }
    }

    /// Returns the UUID if this is an `Id` value.
    pub fn as_id(&self) -> Option<Uuid> {
        match self {
            Value::Id(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the string slice if this is a `Str` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the timestamp if this is a `DateTime` value.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Returns the list elements if this is a `List` value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Value::Date(date)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Uuid> for Value {
    fn from(id: Uuid) -> Self {
        Value::Id(id)
    }
}

impl From<Status> for Value {
    fn from(status: Status) -> Self {
        Value::Status(status)
    }
}

impl From<Sex> for Value {
    fn from(sex: Sex) -> Self {
        Value::Sex(sex)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// A stored record: an ordered mapping from field name to value.
///
/// The same shape serves as the create/update payload and as the returned
/// row. Every stored record carries `id`, `status`, `created_date` and
/// `updated_date`; patients and providers add their own fields on top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field assignment.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    /// Looks up a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.values.remove(field)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// The backend-assigned record id, if present.
    pub fn id(&self) -> Option<Uuid> {
        self.get(fields::ID).and_then(Value::as_id)
    }

    /// Convenience accessor for string fields.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Convenience accessor for timestamp fields.
    pub fn get_datetime(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get(field).and_then(|v| v.as_datetime())
    }

    /// Overwrites fields with the values supplied in `other`.
    ///
    /// Fields not present in `other` are left untouched (partial merge).
    pub fn merge(&mut self, other: Record) {
        for (field, value) in other {
            self.values.insert(field, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Names of the fields present on this record.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// How to locate a patient record on a read.
///
/// Reads resolve either by the backend-assigned primary id or by an external
/// identifier pair previously established with `link_patient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientKey {
    Id(Uuid),
    Identifier {
        source_id: String,
        source_name: String,
    },
}

impl From<Uuid> for PatientKey {
    fn from(id: Uuid) -> Self {
        PatientKey::Id(id)
    }
}

impl fmt::Display for PatientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientKey::Id(id) => write!(f, "{id}"),
            PatientKey::Identifier {
                source_id,
                source_name,
            } => write!(f, "{source_id} (source {source_name})"),
        }
    }
}
