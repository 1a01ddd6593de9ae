//! SQLite repository implementation.
//!
//! Implements the `Storage` trait from `carestore_core` over a
//! `tokio_rusqlite` connection. Engine errors are downgraded to the
//! trait's absent/false results here, with the reason logged; nothing
//! rusqlite-specific escapes this module except [`StoreError`] at
//! construction time.

use async_trait::async_trait;
use tokio_rusqlite::Connection;
use tracing::warn;
use uuid::Uuid;

use carestore_core::query::Lookup;
use carestore_core::records::{fields, PatientKey, Record, Status};
use carestore_core::storage::Storage;

use super::conversions::{
    format_datetime, row_to_patient, row_to_provider, stored_now, value_to_sql,
};
use super::error::{map_call_error, StoreError};
use super::query::{build_filter, build_update, SqlFilter};
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// SQLite-backed storage.
///
/// Atomicity is delegated to the engine: no explicit transactions are
/// opened, so an identifier link is exactly as atomic as SQLite's
/// uniqueness-constrained insert.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (creating if necessary) a file-based database and its schema.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Initialize the database schema.
    async fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES).map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(map_call_error)
    }

    /// Runs a single-row SELECT, mapping "no rows" to `Ok(None)`.
    async fn fetch_one(
        &self,
        sql: &'static str,
        params: Vec<String>,
        to_record: fn(&rusqlite::Row) -> rusqlite::Result<Record>,
    ) -> Result<Option<Record>, StoreError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(sql).map_err(wrap_err)?;
                match stmt.query_row(rusqlite::params_from_iter(params), to_record) {
                    Ok(record) => Ok(Some(record)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(map_call_error)
    }

    /// Runs a filtered SELECT and collects the mapped records.
    async fn select_records(
        &self,
        base_sql: &'static str,
        filter: SqlFilter,
        to_record: fn(&rusqlite::Row) -> rusqlite::Result<Record>,
    ) -> Result<Vec<Record>, StoreError> {
        let sql = format!("{base_sql}{}", filter.clause);
        let params = filter.params;

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql).map_err(wrap_err)?;
                let rows = stmt
                    .query_map(rusqlite::params_from_iter(params), to_record)
                    .map_err(wrap_err)?;

                let mut records = Vec::new();
                for row_result in rows {
                    records.push(row_result.map_err(wrap_err)?);
                }
                Ok(records)
            })
            .await
            .map_err(map_call_error)
    }

    /// Stamps the backend-owned fields onto `data` and inserts it.
    ///
    /// `None` when the payload carries a field the table has no writable
    /// column for, or when the engine rejects the row (e.g. a NOT NULL
    /// violation for a missing name).
    async fn insert_record(
        &self,
        insert_sql: &'static str,
        columns: &'static [&'static str],
        writable: &'static [&'static str],
        data: Record,
    ) -> Result<Option<Record>, StoreError> {
        let mut record = data;
        // Backend-owned fields are assigned here, never taken from the
        // caller.
        record.remove(fields::ID);
        record.remove(fields::CREATED_DATE);
        record.remove(fields::UPDATED_DATE);
        if !record.field_names().all(|field| writable.contains(&field)) {
            return Ok(None);
        }

        let now = stored_now();
        record.set(fields::ID, Uuid::new_v4());
        record.set(fields::CREATED_DATE, now);
        record.set(fields::UPDATED_DATE, now);
        if !record.contains_field(fields::STATUS) {
            record.set(fields::STATUS, Status::Active);
        }

        let params: Vec<rusqlite::types::Value> = columns
            .iter()
            .map(|col| {
                record
                    .get(col)
                    .map(value_to_sql)
                    .unwrap_or(rusqlite::types::Value::Null)
            })
            .collect();

        let rows = self
            .conn
            .call(move |conn| {
                conn.execute(insert_sql, rusqlite::params_from_iter(params))
                    .map_err(wrap_err)
            })
            .await
            .map_err(map_call_error)?;
        Ok((rows > 0).then_some(record))
    }

    /// Executes a prebuilt UPDATE, reporting whether a row was touched.
    async fn execute_update(
        &self,
        sql: String,
        params: Vec<rusqlite::types::Value>,
    ) -> Result<bool, StoreError> {
        let rows = self
            .conn
            .call(move |conn| {
                conn.execute(&sql, rusqlite::params_from_iter(params))
                    .map_err(wrap_err)
            })
            .await
            .map_err(map_call_error)?;
        Ok(rows > 0)
    }

    /// Executes a fixed statement, reporting whether a row was affected.
    async fn execute(&self, sql: &'static str, params: Vec<String>) -> Result<bool, StoreError> {
        let rows = self
            .conn
            .call(move |conn| {
                conn.execute(sql, rusqlite::params_from_iter(params))
                    .map_err(wrap_err)
            })
            .await
            .map_err(map_call_error)?;
        Ok(rows > 0)
    }

    /// Links an identifier pair to an existing patient.
    ///
    /// The insert-if-absent is as atomic as the engine's primary-key
    /// constraint on the pair; `OR IGNORE` turns a taken pair into zero
    /// affected rows rather than an error.
    async fn insert_identifier(
        &self,
        id: Uuid,
        source_id: String,
        source_name: String,
    ) -> Result<bool, StoreError> {
        let id_str = id.to_string();
        let created_date = format_datetime(&stored_now());

        self.conn
            .call(move |conn| {
                let exists: bool = conn
                    .query_row(schema::PATIENT_EXISTS, [&id_str], |row| row.get(0))
                    .map_err(wrap_err)?;
                if !exists {
                    return Ok(false);
                }
                let rows = conn
                    .execute(
                        schema::INSERT_IDENTIFIER_IF_ABSENT,
                        rusqlite::params![source_id, source_name, id_str, created_date],
                    )
                    .map_err(wrap_err)?;
                Ok(rows > 0)
            })
            .await
            .map_err(map_call_error)
    }
}

// ============================================================================
// Storage implementation
// ============================================================================

#[async_trait]
impl Storage for SqliteStorage {
    async fn get_patient(&self, key: &PatientKey) -> Option<Record> {
        let result = match key {
            PatientKey::Id(id) => {
                self.fetch_one(
                    schema::SELECT_PATIENT_BY_ID,
                    vec![id.to_string()],
                    row_to_patient,
                )
                .await
            }
            PatientKey::Identifier {
                source_id,
                source_name,
            } => {
                self.fetch_one(
                    schema::SELECT_PATIENT_BY_IDENTIFIER,
                    vec![source_id.clone(), source_name.clone()],
                    row_to_patient,
                )
                .await
            }
        };
        match result {
            Ok(found) => found,
            Err(err) => {
                warn!(%err, %key, "get_patient failed; treating as absent");
                None
            }
        }
    }

    async fn create_patient(&self, data: Record) -> Option<Record> {
        match self
            .insert_record(
                schema::INSERT_PATIENT,
                schema::PATIENT_COLUMNS,
                schema::PATIENT_WRITABLE_COLUMNS,
                data,
            )
            .await
        {
            Ok(created) => created,
            Err(err) => {
                warn!(%err, "create_patient rejected by the store");
                None
            }
        }
    }

    async fn update_patient(&self, id: Uuid, data: Record) -> bool {
        let Some((sql, params)) =
            build_update("patients", schema::PATIENT_WRITABLE_COLUMNS, data, id)
        else {
            return false;
        };
        match self.execute_update(sql, params).await {
            Ok(updated) => updated,
            Err(err) => {
                warn!(%err, %id, "update_patient failed");
                false
            }
        }
    }

    async fn delete_patient(&self, id: Uuid) -> bool {
        match self
            .execute(schema::DELETE_PATIENT, vec![id.to_string()])
            .await
        {
            Ok(deleted) => deleted,
            Err(err) => {
                warn!(%err, %id, "delete_patient failed");
                false
            }
        }
    }

    async fn filter_patients(&self, lookups: &[Lookup]) -> Vec<Record> {
        let Some(filter) = build_filter(lookups, schema::PATIENT_COLUMNS) else {
            warn!("filter_patients lookup names a column patients does not have; no matches");
            return Vec::new();
        };
        match self
            .select_records(schema::SELECT_PATIENTS, filter, row_to_patient)
            .await
        {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, "filter_patients failed");
                Vec::new()
            }
        }
    }

    async fn link_patient(&self, id: Uuid, source_id: &str, source_name: &str) -> bool {
        match self
            .insert_identifier(id, source_id.to_string(), source_name.to_string())
            .await
        {
            Ok(linked) => linked,
            Err(err) => {
                warn!(%err, %id, "link_patient failed");
                false
            }
        }
    }

    async fn unlink_patient(&self, id: Uuid, source_id: &str, source_name: &str) -> bool {
        match self
            .execute(
                schema::DELETE_IDENTIFIER,
                vec![source_id.to_string(), source_name.to_string(), id.to_string()],
            )
            .await
        {
            Ok(unlinked) => unlinked,
            Err(err) => {
                warn!(%err, %id, "unlink_patient failed");
                false
            }
        }
    }

    async fn get_provider(&self, id: Uuid) -> Option<Record> {
        match self
            .fetch_one(
                schema::SELECT_PROVIDER_BY_ID,
                vec![id.to_string()],
                row_to_provider,
            )
            .await
        {
            Ok(found) => found,
            Err(err) => {
                warn!(%err, %id, "get_provider failed; treating as absent");
                None
            }
        }
    }

    async fn create_provider(&self, data: Record) -> Option<Record> {
        match self
            .insert_record(
                schema::INSERT_PROVIDER,
                schema::PROVIDER_COLUMNS,
                schema::PROVIDER_WRITABLE_COLUMNS,
                data,
            )
            .await
        {
            Ok(created) => created,
            Err(err) => {
                warn!(%err, "create_provider rejected by the store");
                None
            }
        }
    }

    async fn update_provider(&self, id: Uuid, data: Record) -> bool {
        let Some((sql, params)) =
            build_update("providers", schema::PROVIDER_WRITABLE_COLUMNS, data, id)
        else {
            return false;
        };
        match self.execute_update(sql, params).await {
            Ok(updated) => updated,
            Err(err) => {
                warn!(%err, %id, "update_provider failed");
                false
            }
        }
    }

    async fn delete_provider(&self, id: Uuid) -> bool {
        match self
            .execute(schema::DELETE_PROVIDER, vec![id.to_string()])
            .await
        {
            Ok(deleted) => deleted,
            Err(err) => {
                warn!(%err, %id, "delete_provider failed");
                false
            }
        }
    }

    async fn filter_providers(&self, lookups: &[Lookup]) -> Vec<Record> {
        let Some(filter) = build_filter(lookups, schema::PROVIDER_COLUMNS) else {
            warn!("filter_providers lookup names a column providers does not have; no matches");
            return Vec::new();
        };
        match self
            .select_records(schema::SELECT_PROVIDERS, filter, row_to_provider)
            .await
        {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, "filter_providers failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;

    use carestore_core::records::{Sex, Value};

    use super::*;

    async fn storage() -> SqliteStorage {
        SqliteStorage::new_in_memory().await.unwrap()
    }

    fn patient_fields(name: &str, sex: Sex) -> Record {
        Record::new().with(fields::NAME, name).with(fields::SEX, sex)
    }

    fn birth_date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    // ==================== Patient CRUD Tests ====================

    #[tokio::test]
    async fn test_patient_create_and_get_round_trip() {
        let storage = storage().await;

        let created = storage
            .create_patient(
                patient_fields("Joe", Sex::Male)
                    .with(fields::BIRTH_DATE, birth_date(1985, 3, 12))
                    .with(fields::LOCATION, "Ward 3"),
            )
            .await
            .unwrap();
        let id = created.id().unwrap();

        let fetched = storage.get_patient(&PatientKey::Id(id)).await;
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn test_patient_create_defaults_status_to_active() {
        let storage = storage().await;

        let created = storage
            .create_patient(patient_fields("Joe", Sex::Male))
            .await
            .unwrap();

        assert_eq!(
            created.get(fields::STATUS),
            Some(&Value::Status(Status::Active))
        );
    }

    #[tokio::test]
    async fn test_patient_create_rejects_unknown_fields() {
        let storage = storage().await;

        let created = storage
            .create_patient(patient_fields("Joe", Sex::Male).with("ward", "3B"))
            .await;

        assert!(created.is_none());
        assert!(storage.filter_patients(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_patient_create_without_name_is_rejected() {
        let storage = storage().await;
        // patients.name is NOT NULL; the engine's rejection surfaces as an
        // absent result, not an error.
        let created = storage.create_patient(Record::new()).await;
        assert!(created.is_none());
    }

    #[tokio::test]
    async fn test_patient_get_nonexistent() {
        let storage = storage().await;
        let fetched = storage.get_patient(&PatientKey::Id(Uuid::new_v4())).await;
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn test_patient_update_merges_and_advances_updated_date() {
        let storage = storage().await;
        let created = storage
            .create_patient(patient_fields("Joe", Sex::Male))
            .await
            .unwrap();
        let id = created.id().unwrap();
        let before = created.get_datetime(fields::UPDATED_DATE).unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(
            storage
                .update_patient(id, Record::new().with(fields::NAME, "Jane"))
                .await
        );

        let updated = storage.get_patient(&PatientKey::Id(id)).await.unwrap();
        assert_eq!(updated.get_str(fields::NAME), Some("Jane"));
        assert_eq!(updated.get(fields::SEX), Some(&Value::Sex(Sex::Male)));
        assert!(updated.get_datetime(fields::UPDATED_DATE).unwrap() > before);
        assert_eq!(
            updated.get_datetime(fields::CREATED_DATE),
            created.get_datetime(fields::CREATED_DATE)
        );
    }

    #[tokio::test]
    async fn test_patient_update_nonexistent() {
        let storage = storage().await;
        let result = storage
            .update_patient(Uuid::new_v4(), Record::new().with(fields::NAME, "Jane"))
            .await;
        assert!(!result);
    }

    #[tokio::test]
    async fn test_patient_update_with_unknown_field_is_rejected() {
        let storage = storage().await;
        let created = storage
            .create_patient(patient_fields("Joe", Sex::Male))
            .await
            .unwrap();
        let id = created.id().unwrap();

        assert!(!storage.update_patient(id, Record::new().with("ward", "3B")).await);

        // The record is untouched.
        let fetched = storage.get_patient(&PatientKey::Id(id)).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_patient_delete_is_idempotent() {
        let storage = storage().await;
        let created = storage
            .create_patient(patient_fields("Joe", Sex::Male))
            .await
            .unwrap();
        let id = created.id().unwrap();

        assert!(storage.delete_patient(id).await);
        assert!(!storage.delete_patient(id).await);
        assert!(storage.get_patient(&PatientKey::Id(id)).await.is_none());
    }

    // ==================== Patient Filter Tests ====================

    async fn seed_joe_and_jane(storage: &SqliteStorage) {
        storage
            .create_patient(
                patient_fields("Joe", Sex::Male).with(fields::BIRTH_DATE, birth_date(1985, 3, 12)),
            )
            .await
            .unwrap();
        storage
            .create_patient(
                patient_fields("Jane", Sex::Female)
                    .with(fields::BIRTH_DATE, birth_date(1992, 11, 2)),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_filter_patients_no_lookups_returns_everyone() {
        let storage = storage().await;
        seed_joe_and_jane(&storage).await;

        assert_eq!(storage.filter_patients(&[]).await.len(), 2);
    }

    #[tokio::test]
    async fn test_filter_patients_like_and_in() {
        let storage = storage().await;
        seed_joe_and_jane(&storage).await;

        let matches = storage
            .filter_patients(&[Lookup::parse("name__like", "Jo").unwrap()])
            .await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].get_str(fields::NAME), Some("Joe"));

        let matches = storage
            .filter_patients(&[Lookup::parse("name__in", vec!["Joe", "Jane"]).unwrap()])
            .await;
        assert_eq!(matches.len(), 2);
    }

    #[tokio::test]
    async fn test_filter_patients_like_is_case_sensitive() {
        let storage = storage().await;
        seed_joe_and_jane(&storage).await;

        let matches = storage
            .filter_patients(&[Lookup::parse("name__like", "jo").unwrap()])
            .await;
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_filter_patients_birth_date_ranges() {
        let storage = storage().await;
        seed_joe_and_jane(&storage).await;

        let cutoff = birth_date(1990, 1, 1);
        let matches = storage
            .filter_patients(&[Lookup::parse("birth_date__lt", cutoff).unwrap()])
            .await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].get_str(fields::NAME), Some("Joe"));

        let matches = storage
            .filter_patients(&[Lookup::parse("birth_date__gte", cutoff).unwrap()])
            .await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].get_str(fields::NAME), Some("Jane"));
    }

    #[tokio::test]
    async fn test_filter_patients_lookups_combine_with_and() {
        let storage = storage().await;
        seed_joe_and_jane(&storage).await;

        let matches = storage
            .filter_patients(&[
                Lookup::parse("name__like", "J").unwrap(),
                Lookup::parse("sex", Sex::Female).unwrap(),
            ])
            .await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].get_str(fields::NAME), Some("Jane"));
    }

    #[tokio::test]
    async fn test_filter_patients_unknown_column_matches_nothing() {
        let storage = storage().await;
        seed_joe_and_jane(&storage).await;

        let matches = storage
            .filter_patients(&[Lookup::parse("ward", "3B").unwrap()])
            .await;
        assert!(matches.is_empty());
    }

    // ==================== Identifier Link Tests ====================

    #[tokio::test]
    async fn test_link_patient_and_get_by_identifier() {
        let storage = storage().await;
        let created = storage
            .create_patient(patient_fields("Joe", Sex::Male))
            .await
            .unwrap();
        let id = created.id().unwrap();

        assert!(storage.link_patient(id, "FOO", "BAR").await);

        let key = PatientKey::Identifier {
            source_id: "FOO".to_string(),
            source_name: "BAR".to_string(),
        };
        assert_eq!(storage.get_patient(&key).await, Some(created));
    }

    #[tokio::test]
    async fn test_link_patient_pair_is_unique() {
        let storage = storage().await;
        let first = storage
            .create_patient(patient_fields("Joe", Sex::Male))
            .await
            .unwrap();
        let second = storage
            .create_patient(patient_fields("Jane", Sex::Female))
            .await
            .unwrap();

        assert!(storage.link_patient(first.id().unwrap(), "FOO", "BAR").await);
        assert!(!storage.link_patient(second.id().unwrap(), "FOO", "BAR").await);

        // The original association is untouched.
        let key = PatientKey::Identifier {
            source_id: "FOO".to_string(),
            source_name: "BAR".to_string(),
        };
        assert_eq!(storage.get_patient(&key).await.unwrap().id(), first.id());
    }

    #[tokio::test]
    async fn test_link_patient_requires_an_existing_patient() {
        let storage = storage().await;
        assert!(!storage.link_patient(Uuid::new_v4(), "FOO", "BAR").await);
    }

    #[tokio::test]
    async fn test_unlink_patient_removes_the_association() {
        let storage = storage().await;
        let created = storage
            .create_patient(patient_fields("Joe", Sex::Male))
            .await
            .unwrap();
        let id = created.id().unwrap();

        assert!(storage.link_patient(id, "FOO", "BAR").await);
        assert!(storage.unlink_patient(id, "FOO", "BAR").await);
        assert!(!storage.unlink_patient(id, "FOO", "BAR").await);

        let key = PatientKey::Identifier {
            source_id: "FOO".to_string(),
            source_name: "BAR".to_string(),
        };
        assert!(storage.get_patient(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_unlink_patient_checks_the_patient_id() {
        let storage = storage().await;
        let created = storage
            .create_patient(patient_fields("Joe", Sex::Male))
            .await
            .unwrap();
        let id = created.id().unwrap();

        assert!(storage.link_patient(id, "FOO", "BAR").await);
        assert!(!storage.unlink_patient(Uuid::new_v4(), "FOO", "BAR").await);
    }

    // ==================== Provider Tests ====================

    #[tokio::test]
    async fn test_provider_crud_round_trip() {
        let storage = storage().await;

        let created = storage
            .create_provider(
                Record::new()
                    .with(fields::NAME, "Dr. Smith")
                    .with(fields::LOCATION, "Clinic 2"),
            )
            .await
            .unwrap();
        let id = created.id().unwrap();

        assert_eq!(storage.get_provider(id).await, Some(created));

        assert!(
            storage
                .update_provider(id, Record::new().with(fields::LOCATION, "Clinic 5"))
                .await
        );
        let updated = storage.get_provider(id).await.unwrap();
        assert_eq!(updated.get_str(fields::LOCATION), Some("Clinic 5"));

        assert!(storage.delete_provider(id).await);
        assert!(!storage.delete_provider(id).await);
        assert!(storage.get_provider(id).await.is_none());
    }

    #[tokio::test]
    async fn test_provider_create_rejects_patient_only_fields() {
        let storage = storage().await;
        // sex is a patients column; providers have no such field.
        let created = storage
            .create_provider(Record::new().with(fields::NAME, "Dr. Smith").with(
                fields::SEX,
                Sex::Male,
            ))
            .await;
        assert!(created.is_none());
    }

    #[tokio::test]
    async fn test_filter_providers() {
        let storage = storage().await;
        storage
            .create_provider(Record::new().with(fields::NAME, "Dr. Smith"))
            .await
            .unwrap();
        storage
            .create_provider(Record::new().with(fields::NAME, "Dr. Jones"))
            .await
            .unwrap();

        let matches = storage
            .filter_providers(&[Lookup::parse("name__like", "Jones").unwrap()])
            .await;
        assert_eq!(matches.len(), 1);
        assert_eq!(storage.filter_providers(&[]).await.len(), 2);
    }
}
