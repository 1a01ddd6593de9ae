use thiserror::Error;
use uuid::Uuid;

use crate::query::LookupError;
use crate::records::PatientKey;

/// Errors surfaced by the API client.
///
/// Only reads raise for a missing record; mutations report absence through
/// their boolean result instead. The not-found variants are distinct per
/// category so callers can tell them apart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Patient does not exist: {key}")]
    PatientNotFound { key: PatientKey },
    #[error("Provider does not exist: {id}")]
    ProviderNotFound { id: Uuid },
    #[error(transparent)]
    InvalidLookup(#[from] LookupError),
}
