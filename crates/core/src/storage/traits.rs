use async_trait::async_trait;
use uuid::Uuid;

use crate::query::Lookup;
use crate::records::{PatientKey, Record};

/// The capability contract every storage backend implements.
///
/// The contract normalizes failure: "not found" and engine-internal errors
/// both collapse to an absent/false/empty result at this boundary, so the
/// API client can treat interchangeable backends uniformly. Backends never
/// panic on a missing record and never let a store-specific error type
/// escape; the only exceptions in the system are raised above this trait
/// (see `carestore_core::api`) or at backend construction time.
#[async_trait]
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Retrieves a patient by primary id or external identifier pair.
    async fn get_patient(&self, key: &PatientKey) -> Option<Record>;

    /// Creates a patient record, assigning `id`, `created_date`,
    /// `updated_date` and a default `status`.
    ///
    /// Returns `None` when the underlying store rejects the field set.
    async fn create_patient(&self, fields: Record) -> Option<Record>;

    /// Partially merges `fields` into the patient record, refreshing
    /// `updated_date`. False when no such record exists or the store
    /// rejects the payload.
    async fn update_patient(&self, id: Uuid, fields: Record) -> bool;

    /// Deletes a patient record. False when no such record exists.
    async fn delete_patient(&self, id: Uuid) -> bool;

    /// Finds patient records matching every lookup (logical AND).
    ///
    /// An empty lookup slice returns every patient; ordering is
    /// unspecified.
    async fn filter_patients(&self, lookups: &[Lookup]) -> Vec<Record>;

    /// Associates an external (source_id, source_name) pair with a patient.
    ///
    /// False when the pair is already taken by any patient, or when `id`
    /// does not reference an existing patient. An existing association is
    /// never overwritten.
    async fn link_patient(&self, id: Uuid, source_id: &str, source_name: &str) -> bool;

    /// Removes an identifier association. False when no association matches
    /// all of (patient id, source_id, source_name).
    async fn unlink_patient(&self, id: Uuid, source_id: &str, source_name: &str) -> bool;

    /// Retrieves a provider by id.
    async fn get_provider(&self, id: Uuid) -> Option<Record>;

    /// Creates a provider record; same contract as [`Self::create_patient`].
    async fn create_provider(&self, fields: Record) -> Option<Record>;

    /// Partially updates a provider record; same contract as
    /// [`Self::update_patient`].
    async fn update_provider(&self, id: Uuid, fields: Record) -> bool;

    /// Deletes a provider record. False when no such record exists.
    async fn delete_provider(&self, id: Uuid) -> bool;

    /// Finds provider records matching every lookup (logical AND).
    async fn filter_providers(&self, lookups: &[Lookup]) -> Vec<Record>;
}
