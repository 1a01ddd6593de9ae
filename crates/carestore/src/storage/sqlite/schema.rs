//! SQLite schema definitions and SQL statement constants.
//!
//! All fixed SQL lives here as pure data; the dynamic pieces (filter
//! predicates and partial-update SET lists) are assembled in
//! `query.rs`/`repository.rs` from these column tables.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
-- Patients table
CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    sex TEXT,
    birth_date TEXT,
    death_date TEXT,
    location TEXT,
    status TEXT NOT NULL,
    created_date TEXT NOT NULL,
    updated_date TEXT NOT NULL
);

-- Providers table
CREATE TABLE IF NOT EXISTS providers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    location TEXT,
    status TEXT NOT NULL,
    created_date TEXT NOT NULL,
    updated_date TEXT NOT NULL
);

-- External identifier associations; the pair is globally unique.
CREATE TABLE IF NOT EXISTS patient_identifiers (
    source_id TEXT NOT NULL,
    source_name TEXT NOT NULL,
    patient_id TEXT NOT NULL,
    created_date TEXT NOT NULL,
    PRIMARY KEY (source_id, source_name),
    FOREIGN KEY (patient_id) REFERENCES patients(id) ON DELETE CASCADE
);

-- Indexes for efficient queries
CREATE INDEX IF NOT EXISTS idx_patient_identifiers_patient_id ON patient_identifiers(patient_id);
CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);
CREATE INDEX IF NOT EXISTS idx_providers_name ON providers(name);
"#;

/// Every patients column, in SELECT/INSERT order.
pub const PATIENT_COLUMNS: &[&str] = &[
    "id",
    "name",
    "sex",
    "birth_date",
    "death_date",
    "location",
    "status",
    "created_date",
    "updated_date",
];

/// Patients columns a caller may supply on create/update; the rest are
/// backend-owned.
pub const PATIENT_WRITABLE_COLUMNS: &[&str] =
    &["name", "sex", "birth_date", "death_date", "location", "status"];

/// Every providers column, in SELECT/INSERT order.
pub const PROVIDER_COLUMNS: &[&str] = &[
    "id",
    "name",
    "location",
    "status",
    "created_date",
    "updated_date",
];

/// Providers columns a caller may supply on create/update.
pub const PROVIDER_WRITABLE_COLUMNS: &[&str] = &["name", "location", "status"];

// Patient queries
pub const INSERT_PATIENT: &str = r#"
INSERT INTO patients (id, name, sex, birth_date, death_date, location, status, created_date, updated_date)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#;

pub const SELECT_PATIENT_BY_ID: &str = r#"
SELECT id, name, sex, birth_date, death_date, location, status, created_date, updated_date
FROM patients
WHERE id = ?1
"#;

pub const SELECT_PATIENT_BY_IDENTIFIER: &str = r#"
SELECT p.id, p.name, p.sex, p.birth_date, p.death_date, p.location, p.status, p.created_date, p.updated_date
FROM patients p
INNER JOIN patient_identifiers pi ON pi.patient_id = p.id
WHERE pi.source_id = ?1 AND pi.source_name = ?2
"#;

/// Base SELECT for filters; `query::build_filter` appends the WHERE clause.
pub const SELECT_PATIENTS: &str = r#"
SELECT id, name, sex, birth_date, death_date, location, status, created_date, updated_date
FROM patients
"#;

pub const DELETE_PATIENT: &str = r#"
DELETE FROM patients
WHERE id = ?1
"#;

pub const PATIENT_EXISTS: &str = r#"
SELECT EXISTS(SELECT 1 FROM patients WHERE id = ?1)
"#;

// Identifier queries
pub const INSERT_IDENTIFIER_IF_ABSENT: &str = r#"
INSERT OR IGNORE INTO patient_identifiers (source_id, source_name, patient_id, created_date)
VALUES (?1, ?2, ?3, ?4)
"#;

pub const DELETE_IDENTIFIER: &str = r#"
DELETE FROM patient_identifiers
WHERE source_id = ?1 AND source_name = ?2 AND patient_id = ?3
"#;

// Provider queries
pub const INSERT_PROVIDER: &str = r#"
INSERT INTO providers (id, name, location, status, created_date, updated_date)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub const SELECT_PROVIDER_BY_ID: &str = r#"
SELECT id, name, location, status, created_date, updated_date
FROM providers
WHERE id = ?1
"#;

/// Base SELECT for filters; `query::build_filter` appends the WHERE clause.
pub const SELECT_PROVIDERS: &str = r#"
SELECT id, name, location, status, created_date, updated_date
FROM providers
"#;

pub const DELETE_PROVIDER: &str = r#"
DELETE FROM providers
WHERE id = ?1
"#;
