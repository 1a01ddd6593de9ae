use std::ops::Deref;
use std::sync::Arc;

use uuid::Uuid;

use crate::query::Lookup;
use crate::records::{PatientKey, Record, Value};
use crate::storage::Storage;

use super::ApiError;

/// The two record categories routed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Patient,
    Provider,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Patient => "patient",
            Category::Provider => "provider",
        }
    }
}

/// API client for accessing healthcare data via a configured backend.
///
/// The client owns no record state: it is a stateless routing façade over
/// the backend instance it was constructed with.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use carestore_core::api::HealthcareApi;
/// # use carestore_core::storage::Storage;
/// # async fn example(backend: Arc<dyn Storage>) {
/// let api = HealthcareApi::new(backend);
/// let patient = api.patients().get(uuid::Uuid::new_v4()).await;
/// # }
/// ```
#[derive(Clone)]
pub struct HealthcareApi {
    backend: Arc<dyn Storage>,
}

impl std::fmt::Debug for HealthcareApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthcareApi").finish_non_exhaustive()
    }
}

impl HealthcareApi {
    pub fn new(backend: Arc<dyn Storage>) -> Self {
        Self { backend }
    }

    /// The patient category handle.
    pub fn patients(&self) -> Patients {
        Patients {
            inner: CategoryApi {
                backend: Arc::clone(&self.backend),
                category: Category::Patient,
            },
        }
    }

    /// The provider category handle.
    pub fn providers(&self) -> Providers {
        Providers {
            inner: CategoryApi {
                backend: Arc::clone(&self.backend),
                category: Category::Provider,
            },
        }
    }
}

/// Category-scoped operations shared by patients and providers.
///
/// Each call switches on the category tag to reach the matching backend
/// method; the backend stays a single object behind one trait.
pub struct CategoryApi {
    backend: Arc<dyn Storage>,
    category: Category,
}

impl CategoryApi {
    /// Retrieves a record by id, raising the category's not-found error
    /// when the backend reports it absent.
    pub async fn get(&self, id: Uuid) -> Result<Record, ApiError> {
        let found = match self.category {
            Category::Patient => self.backend.get_patient(&PatientKey::Id(id)).await,
            Category::Provider => self.backend.get_provider(id).await,
        };
        found.ok_or(match self.category {
            Category::Patient => ApiError::PatientNotFound {
                key: PatientKey::Id(id),
            },
            Category::Provider => ApiError::ProviderNotFound { id },
        })
    }

    /// Creates a record, returning it as stored (with assigned id and
    /// timestamps), or `None` when the backend rejected the field set.
    pub async fn create(&self, fields: Record) -> Option<Record> {
        match self.category {
            Category::Patient => self.backend.create_patient(fields).await,
            Category::Provider => self.backend.create_provider(fields).await,
        }
    }

    /// Partially updates a record. The boolean is the backend's success
    /// flag; a missing record is false, never an error.
    pub async fn update(&self, id: Uuid, fields: Record) -> bool {
        match self.category {
            Category::Patient => self.backend.update_patient(id, fields).await,
            Category::Provider => self.backend.update_provider(id, fields).await,
        }
    }

    /// Deletes a record. False when no such record exists.
    pub async fn delete(&self, id: Uuid) -> bool {
        match self.category {
            Category::Patient => self.backend.delete_patient(id).await,
            Category::Provider => self.backend.delete_provider(id).await,
        }
    }

    /// Filters records by `(lookup key, value)` pairs.
    ///
    /// Every key is translated through the lookup grammar first; an
    /// unrecognized suffix fails the whole call before the backend is
    /// consulted. No pairs at all returns every record of the category.
    pub async fn filter<I, K, V>(&self, query: I) -> Result<Vec<Record>, ApiError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut lookups = Vec::new();
        for (key, value) in query {
            lookups.push(Lookup::parse(key.as_ref(), value)?);
        }
        Ok(match self.category {
            Category::Patient => self.backend.filter_patients(&lookups).await,
            Category::Provider => self.backend.filter_providers(&lookups).await,
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

/// Patient operations: the shared category surface plus identifier linking.
pub struct Patients {
    inner: CategoryApi,
}

impl Deref for Patients {
    type Target = CategoryApi;

    fn deref(&self) -> &CategoryApi {
        &self.inner
    }
}

impl Patients {
    /// Retrieves a patient by an external identifier pair.
    pub async fn get_by_identifier(
        &self,
        source_id: &str,
        source_name: &str,
    ) -> Result<Record, ApiError> {
        let key = PatientKey::Identifier {
            source_id: source_id.to_string(),
            source_name: source_name.to_string(),
        };
        self.inner
            .backend
            .get_patient(&key)
            .await
            .ok_or(ApiError::PatientNotFound { key })
    }

    /// Associates an external identifier pair with this patient.
    pub async fn link(&self, id: Uuid, source_id: &str, source_name: &str) -> bool {
        self.inner
            .backend
            .link_patient(id, source_id, source_name)
            .await
    }

    /// Removes an identifier association from this patient.
    pub async fn unlink(&self, id: Uuid, source_id: &str, source_name: &str) -> bool {
        self.inner
            .backend
            .unlink_patient(id, source_id, source_name)
            .await
    }
}

/// Provider operations: the shared category surface only.
///
/// Identifier linking is a patient capability; it simply does not exist
/// here, so an unsupported call is a compile error rather than a runtime
/// condition.
pub struct Providers {
    inner: CategoryApi,
}

impl Deref for Providers {
    type Target = CategoryApi;

    fn deref(&self) -> &CategoryApi {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::query::Comparison;
    use crate::records::fields;

    use super::*;

    /// Records every backend call so tests can assert on dispatch without
    /// real storage behind the trait.
    #[derive(Default, Debug)]
    struct StubStorage {
        calls: Mutex<Vec<String>>,
        lookups_seen: Mutex<Vec<Vec<Lookup>>>,
        patient: Option<Record>,
        provider: Option<Record>,
    }

    impl StubStorage {
        fn with_patient(patient: Record) -> Self {
            Self {
                patient: Some(patient),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record_call(&self, name: &str) {
            self.calls.lock().unwrap().push(name.to_string());
        }
    }

    #[async_trait]
    impl Storage for StubStorage {
        async fn get_patient(&self, _key: &PatientKey) -> Option<Record> {
            self.record_call("get_patient");
            self.patient.clone()
        }

        async fn create_patient(&self, fields: Record) -> Option<Record> {
            self.record_call("create_patient");
            Some(fields)
        }

        async fn update_patient(&self, _id: Uuid, _fields: Record) -> bool {
            self.record_call("update_patient");
            false
        }

        async fn delete_patient(&self, _id: Uuid) -> bool {
            self.record_call("delete_patient");
            false
        }

        async fn filter_patients(&self, lookups: &[Lookup]) -> Vec<Record> {
            self.record_call("filter_patients");
            self.lookups_seen.lock().unwrap().push(lookups.to_vec());
            Vec::new()
        }

        async fn link_patient(&self, _id: Uuid, _source_id: &str, _source_name: &str) -> bool {
            self.record_call("link_patient");
            true
        }

        async fn unlink_patient(&self, _id: Uuid, _source_id: &str, _source_name: &str) -> bool {
            self.record_call("unlink_patient");
            true
        }

        async fn get_provider(&self, _id: Uuid) -> Option<Record> {
            self.record_call("get_provider");
            self.provider.clone()
        }

        async fn create_provider(&self, fields: Record) -> Option<Record> {
            self.record_call("create_provider");
            Some(fields)
        }

        async fn update_provider(&self, _id: Uuid, _fields: Record) -> bool {
            self.record_call("update_provider");
            false
        }

        async fn delete_provider(&self, _id: Uuid) -> bool {
            self.record_call("delete_provider");
            false
        }

        async fn filter_providers(&self, lookups: &[Lookup]) -> Vec<Record> {
            self.record_call("filter_providers");
            self.lookups_seen.lock().unwrap().push(lookups.to_vec());
            Vec::new()
        }
    }

    fn api_over(stub: Arc<StubStorage>) -> HealthcareApi {
        HealthcareApi::new(stub)
    }

    #[tokio::test]
    async fn test_get_routes_to_the_category_backend_method() {
        let stub = Arc::new(StubStorage::with_patient(
            Record::new().with(fields::NAME, "Joe"),
        ));
        let api = api_over(Arc::clone(&stub));

        api.patients().get(Uuid::new_v4()).await.unwrap();
        assert_eq!(stub.calls(), vec!["get_patient"]);
    }

    #[tokio::test]
    async fn test_get_missing_patient_raises_patient_not_found() {
        let stub = Arc::new(StubStorage::default());
        let api = api_over(stub);
        let id = Uuid::new_v4();

        let error = api.patients().get(id).await.unwrap_err();
        assert_eq!(
            error,
            ApiError::PatientNotFound {
                key: PatientKey::Id(id),
            }
        );
    }

    #[tokio::test]
    async fn test_get_missing_provider_raises_provider_not_found() {
        let stub = Arc::new(StubStorage::default());
        let api = api_over(stub);
        let id = Uuid::new_v4();

        let error = api.providers().get(id).await.unwrap_err();
        assert_eq!(error, ApiError::ProviderNotFound { id });
    }

    #[tokio::test]
    async fn test_get_by_identifier_missing_carries_the_locator() {
        let stub = Arc::new(StubStorage::default());
        let api = api_over(stub);

        let error = api
            .patients()
            .get_by_identifier("FOO", "BAR")
            .await
            .unwrap_err();
        assert_eq!(
            error,
            ApiError::PatientNotFound {
                key: PatientKey::Identifier {
                    source_id: "FOO".to_string(),
                    source_name: "BAR".to_string(),
                },
            }
        );
    }

    #[tokio::test]
    async fn test_create_returns_the_backend_record_as_is() {
        let stub = Arc::new(StubStorage::default());
        let api = api_over(Arc::clone(&stub));

        let created = api
            .providers()
            .create(Record::new().with(fields::NAME, "Dr. Smith"))
            .await
            .unwrap();
        assert_eq!(created.get_str(fields::NAME), Some("Dr. Smith"));
        assert_eq!(stub.calls(), vec!["create_provider"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_pass_the_boolean_through() {
        let stub = Arc::new(StubStorage::default());
        let api = api_over(Arc::clone(&stub));
        let id = Uuid::new_v4();

        assert!(!api.patients().update(id, Record::new().with(fields::NAME, "Jane")).await);
        assert!(!api.patients().delete(id).await);
        assert!(!api.providers().update(id, Record::new().with(fields::NAME, "Jane")).await);
        assert!(!api.providers().delete(id).await);
        assert_eq!(
            stub.calls(),
            vec![
                "update_patient",
                "delete_patient",
                "update_provider",
                "delete_provider",
            ]
        );
    }

    #[tokio::test]
    async fn test_filter_translates_lookup_keys_before_the_backend_call() {
        let stub = Arc::new(StubStorage::default());
        let api = api_over(Arc::clone(&stub));

        api.patients()
            .filter([("name__like", Value::from("Jane"))])
            .await
            .unwrap();

        let seen = stub.lookups_seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![vec![Lookup::new("name", Comparison::Like, "Jane")]]
        );
    }

    #[tokio::test]
    async fn test_filter_bare_key_translates_to_equal() {
        let stub = Arc::new(StubStorage::default());
        let api = api_over(Arc::clone(&stub));

        api.providers()
            .filter([("name", Value::from("Jane"))])
            .await
            .unwrap();

        let seen = stub.lookups_seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![vec![Lookup::new("name", Comparison::Equal, "Jane")]]
        );
    }

    #[tokio::test]
    async fn test_filter_invalid_suffix_fails_before_any_backend_call() {
        let stub = Arc::new(StubStorage::default());
        let api = api_over(Arc::clone(&stub));

        let error = api
            .patients()
            .filter([("name__bogus", Value::from("Jane"))])
            .await
            .unwrap_err();

        assert!(matches!(error, ApiError::InvalidLookup(_)));
        assert!(stub.calls().is_empty(), "backend must not be called");
    }

    #[tokio::test]
    async fn test_link_and_unlink_forward_to_the_backend() {
        let stub = Arc::new(StubStorage::default());
        let api = api_over(Arc::clone(&stub));
        let id = Uuid::new_v4();

        assert!(api.patients().link(id, "FOO", "BAR").await);
        assert!(api.patients().unlink(id, "FOO", "BAR").await);
        assert_eq!(stub.calls(), vec!["link_patient", "unlink_patient"]);
    }
}
