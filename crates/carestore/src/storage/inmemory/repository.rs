//! In-memory repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use carestore_core::query::Lookup;
use carestore_core::records::{fields, PatientKey, Record, Status};
use carestore_core::storage::Storage;

/// In-memory storage backend for testing and reference use.
///
/// Records live in HashMaps wrapped in `Arc<RwLock<_>>`; identifier
/// associations in a second map keyed by the (source_id, source_name)
/// pair. Every `new()` owns freshly constructed maps — nothing is shared
/// between instances and nothing outlives the last clone.
///
/// Individual operations are atomic behind the lock, but there are no
/// transactions across calls: concurrent read-modify-write sequences
/// against the same id interleave arbitrarily. Not intended for
/// concurrent production use.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    patients: Arc<RwLock<HashMap<Uuid, Record>>>,
    providers: Arc<RwLock<HashMap<Uuid, Record>>>,
    identifiers: Arc<RwLock<HashMap<(String, String), Uuid>>>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Stamps the backend-owned fields on a newly created record.
fn init_record(id: Uuid, mut data: Record) -> Record {
    let now = Utc::now();
    data.set(fields::ID, id);
    data.set(fields::CREATED_DATE, now);
    data.set(fields::UPDATED_DATE, now);
    if !data.contains_field(fields::STATUS) {
        data.set(fields::STATUS, Status::Active);
    }
    data
}

/// Drops the fields a caller may not overwrite through update.
fn strip_backend_owned(data: &mut Record) {
    data.remove(fields::ID);
    data.remove(fields::CREATED_DATE);
    data.remove(fields::UPDATED_DATE);
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get_patient(&self, key: &PatientKey) -> Option<Record> {
        let patients = self.patients.read().await;
        match key {
            PatientKey::Id(id) => patients.get(id).cloned(),
            PatientKey::Identifier {
                source_id,
                source_name,
            } => {
                let identifiers = self.identifiers.read().await;
                let id = identifiers.get(&(source_id.clone(), source_name.clone()))?;
                patients.get(id).cloned()
            }
        }
    }

    async fn create_patient(&self, data: Record) -> Option<Record> {
        // Unknown fields pass through untouched: this store has no schema
        // to reject them against.
        let record = init_record(Uuid::new_v4(), data);
        let id = record.id()?;
        self.patients.write().await.insert(id, record.clone());
        Some(record)
    }

    async fn update_patient(&self, id: Uuid, mut data: Record) -> bool {
        let mut patients = self.patients.write().await;
        let Some(record) = patients.get_mut(&id) else {
            return false;
        };
        strip_backend_owned(&mut data);
        record.merge(data);
        record.set(fields::UPDATED_DATE, Utc::now());
        true
    }

    async fn delete_patient(&self, id: Uuid) -> bool {
        self.patients.write().await.remove(&id).is_some()
    }

    async fn filter_patients(&self, lookups: &[Lookup]) -> Vec<Record> {
        let patients = self.patients.read().await;
        patients
            .values()
            .filter(|record| lookups.iter().all(|lookup| lookup.matches(record)))
            .cloned()
            .collect()
    }

    async fn link_patient(&self, id: Uuid, source_id: &str, source_name: &str) -> bool {
        let patients = self.patients.read().await;
        if !patients.contains_key(&id) {
            return false;
        }
        let mut identifiers = self.identifiers.write().await;
        let key = (source_id.to_string(), source_name.to_string());
        if identifiers.contains_key(&key) {
            return false;
        }
        identifiers.insert(key, id);
        true
    }

    async fn unlink_patient(&self, id: Uuid, source_id: &str, source_name: &str) -> bool {
        let mut identifiers = self.identifiers.write().await;
        let key = (source_id.to_string(), source_name.to_string());
        if identifiers.get(&key) == Some(&id) {
            identifiers.remove(&key);
            true
        } else {
            false
        }
    }

    async fn get_provider(&self, id: Uuid) -> Option<Record> {
        let providers = self.providers.read().await;
        providers.get(&id).cloned()
    }

    async fn create_provider(&self, data: Record) -> Option<Record> {
        let record = init_record(Uuid::new_v4(), data);
        let id = record.id()?;
        self.providers.write().await.insert(id, record.clone());
        Some(record)
    }

    async fn update_provider(&self, id: Uuid, mut data: Record) -> bool {
        let mut providers = self.providers.write().await;
        let Some(record) = providers.get_mut(&id) else {
            return false;
        };
        strip_backend_owned(&mut data);
        record.merge(data);
        record.set(fields::UPDATED_DATE, Utc::now());
        true
    }

    async fn delete_provider(&self, id: Uuid) -> bool {
        self.providers.write().await.remove(&id).is_some()
    }

    async fn filter_providers(&self, lookups: &[Lookup]) -> Vec<Record> {
        let providers = self.providers.read().await;
        providers
            .values()
            .filter(|record| lookups.iter().all(|lookup| lookup.matches(record)))
            .cloned()
            .collect()
    }
}
