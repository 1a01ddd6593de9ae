use crate::records::{Record, Value};

use super::{Comparison, LookupError};

/// A parsed field lookup: `(field, comparison, value)`.
///
/// Lookups are built from keys of the form `field` or `field__suffix`
/// (split on the last double underscore). They are the declarative query
/// form handed to `filter_*`; each backend translates them into its native
/// predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub field: String,
    pub comparison: Comparison,
    pub value: Value,
}

impl Lookup {
    pub fn new(
        field: impl Into<String>,
        comparison: Comparison,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            comparison,
            value: value.into(),
        }
    }

    /// Translates a lookup key and value into a `Lookup`.
    ///
    /// A bare field name means `Equal`. When a suffix is present it must be
    /// one of the recognized comparison tokens, otherwise the whole lookup
    /// is rejected with [`LookupError::UnknownSuffix`].
    pub fn parse(key: &str, value: impl Into<Value>) -> Result<Self, LookupError> {
        let (field, comparison) = match key.rsplit_once("__") {
            Some((field, suffix)) => {
                let comparison = Comparison::from_suffix(suffix).ok_or_else(|| {
                    LookupError::UnknownSuffix {
                        lookup: key.to_string(),
                        suffix: suffix.to_string(),
                    }
                })?;
                (field, comparison)
            }
            None => (key, Comparison::Equal),
        };
        Ok(Self::new(field, comparison, value))
    }

    /// Evaluates this lookup against a record.
    ///
    /// This is the in-memory backend's native predicate form. A record that
    /// does not carry the field is a non-match, as is any comparison between
    /// values with no defined relation (e.g. ordering a string against a
    /// date, or `In` against a non-list query value).
    pub fn matches(&self, record: &Record) -> bool {
        let Some(field_value) = record.get(&self.field) else {
            return false;
        };
        match self.comparison {
            Comparison::Equal => field_value == &self.value,
            // The field value contains the query substring, not the reverse.
            Comparison::Like => field_value.contains(&self.value),
            Comparison::In => self
                .value
                .as_list()
                .is_some_and(|items| items.contains(field_value)),
            Comparison::Lt => field_value
                .compare(&self.value)
                .is_some_and(std::cmp::Ordering::is_lt),
            Comparison::Lte => field_value
                .compare(&self.value)
                .is_some_and(std::cmp::Ordering::is_le),
            Comparison::Gt => field_value
                .compare(&self.value)
                .is_some_and(std::cmp::Ordering::is_gt),
            Comparison::Gte => field_value
                .compare(&self.value)
                .is_some_and(std::cmp::Ordering::is_ge),
        }
    }
}
