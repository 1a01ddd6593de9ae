mod types;

pub use types::{PatientKey, Record, Sex, Status, Value};

/// Well-known field names shared by every record category.
pub mod fields {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const STATUS: &str = "status";
    pub const SEX: &str = "sex";
    pub const BIRTH_DATE: &str = "birth_date";
    pub const DEATH_DATE: &str = "death_date";
    pub const LOCATION: &str = "location";
    pub const CREATED_DATE: &str = "created_date";
    pub const UPDATED_DATE: &str = "updated_date";
}
