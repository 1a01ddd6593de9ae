use thiserror::Error;

/// Errors raised while translating a field lookup.
///
/// An unrecognized suffix is a caller error: it is reported before any
/// backend call is made and is not a condition to recover from at runtime.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Unrecognized comparison suffix '{suffix}' in lookup '{lookup}'")]
    UnknownSuffix { lookup: String, suffix: String },
}
