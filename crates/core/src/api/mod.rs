mod client;
mod error;

pub use client::{Category, CategoryApi, HealthcareApi, Patients, Providers};
pub use error::ApiError;
