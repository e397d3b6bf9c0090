pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "property_analysis")]
pub mod property_analysis;

pub use error::RealtyError;
pub use types::*;

/// Standard result type for all realty-analysis operations
pub type RealtyResult<T> = Result<T, RealtyError>;
