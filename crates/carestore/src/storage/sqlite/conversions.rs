//! SQLite row and value conversion functions.
//!
//! Pure functions for moving between stored TEXT columns and the typed
//! record model. Testable in isolation without database access.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;

use carestore_core::records::{fields, Record, Sex, Status, Value};

/// Convert a patients row to a `Record`.
///
/// Expected columns: id, name, sex, birth_date, death_date, location,
/// status, created_date, updated_date. NULL columns are omitted from the
/// record rather than mapped to a sentinel value.
pub fn row_to_patient(row: &Row) -> rusqlite::Result<Record> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let sex: Option<String> = row.get(2)?;
    let birth_date: Option<String> = row.get(3)?;
    let death_date: Option<String> = row.get(4)?;
    let location: Option<String> = row.get(5)?;
    let status: String = row.get(6)?;
    let created_date: String = row.get(7)?;
    let updated_date: String = row.get(8)?;

    let mut record = Record::new()
        .with(fields::ID, parse_uuid(&id)?)
        .with(fields::NAME, name)
        .with(fields::STATUS, parse_status(&status)?)
        .with(fields::CREATED_DATE, parse_datetime(&created_date)?)
        .with(fields::UPDATED_DATE, parse_datetime(&updated_date)?);
    if let Some(sex) = sex {
        record.set(fields::SEX, parse_sex(&sex)?);
    }
    if let Some(birth_date) = birth_date {
        record.set(fields::BIRTH_DATE, parse_date(&birth_date)?);
    }
    if let Some(death_date) = death_date {
        record.set(fields::DEATH_DATE, parse_date(&death_date)?);
    }
    if let Some(location) = location {
        record.set(fields::LOCATION, location);
    }
    Ok(record)
}

/// Convert a providers row to a `Record`.
///
/// Expected columns: id, name, location, status, created_date,
/// updated_date.
pub fn row_to_provider(row: &Row) -> rusqlite::Result<Record> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let location: Option<String> = row.get(2)?;
    let status: String = row.get(3)?;
    let created_date: String = row.get(4)?;
    let updated_date: String = row.get(5)?;

    let mut record = Record::new()
        .with(fields::ID, parse_uuid(&id)?)
        .with(fields::NAME, name)
        .with(fields::STATUS, parse_status(&status)?)
        .with(fields::CREATED_DATE, parse_datetime(&created_date)?)
        .with(fields::UPDATED_DATE, parse_datetime(&updated_date)?);
    if let Some(location) = location {
        record.set(fields::LOCATION, location);
    }
    Ok(record)
}

/// Render a value in its stored TEXT form.
///
/// Lists never reach this function directly; the predicate builder expands
/// them into their elements first.
pub fn value_to_sql(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;

    match value {
        Value::Str(s) => Sql::Text(s.clone()),
        Value::Date(date) => Sql::Text(format_date(date)),
        Value::DateTime(dt) => Sql::Text(format_datetime(dt)),
        Value::Id(id) => Sql::Text(id.to_string()),
        Value::Status(status) => Sql::Text(status.code().to_string()),
        Value::Sex(sex) => Sql::Text(sex.code().to_string()),
        Value::List(_) => Sql::Null,
    }
}

/// Format a timestamp for storage.
///
/// Fixed-width RFC 3339 (microseconds, `Z` suffix) keeps lexicographic
/// ordering of the TEXT column chronological, which the range comparisons
/// rely on.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Format a date for storage (YYYY-MM-DD).
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The current time, truncated to the precision the TEXT column stores.
///
/// Timestamps stamped onto a returned record must equal what a later read
/// parses back out of the column, so the sub-microsecond part is dropped
/// up front.
pub fn stored_now() -> DateTime<Utc> {
    use chrono::TimeZone;

    let now = Utc::now();
    Utc.timestamp_micros(now.timestamp_micros())
        .single()
        .unwrap_or(now)
}

fn conversion_error(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

/// Parse a UUID from its stored string.
fn parse_uuid(s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a date from ISO 8601 (YYYY-MM-DD).
fn parse_date(s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a datetime from RFC 3339.
fn parse_datetime(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_status(s: &str) -> rusqlite::Result<Status> {
    Status::from_code(s).ok_or_else(|| conversion_error(format!("Unknown status code: {s}")))
}

fn parse_sex(s: &str) -> rusqlite::Result<Sex> {
    Sex::from_code(s).ok_or_else(|| conversion_error(format!("Unknown sex code: {s}")))
}
