//! Core types and contracts for carestore.
//!
//! This crate defines the backend-agnostic pieces of the healthcare data
//! access layer: the record and value model, the field-lookup query
//! vocabulary, the storage backend trait, and the category-dispatching API
//! client. Concrete backends live in the `carestore` crate.

pub mod api;
pub mod query;
pub mod records;
pub mod storage;
