pub mod error;
pub mod scenario;
pub mod time_value;
pub mod types;

#[cfg(feature = "financing")]
pub mod financing;

#[cfg(feature = "investment")]
pub mod investment;

#[cfg(feature = "cashflow")]
pub mod cashflow;

#[cfg(feature = "tax")]
pub mod tax;

#[cfg(feature = "budget")]
pub mod budget;

pub use error::ConstructionFinanceError;
pub use types::*;

/// Standard result type for all construction-finance operations
pub type ConstructionFinanceResult<T> = Result<T, ConstructionFinanceError>;
