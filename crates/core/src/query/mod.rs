mod comparisons;
mod error;
mod lookup;

pub use comparisons::Comparison;
pub use error::LookupError;
pub use lookup::Lookup;
