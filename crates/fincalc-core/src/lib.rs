pub mod error;
pub mod periods;
pub mod time_value;
pub mod types;

#[cfg(feature = "loans")]
pub mod loans;

#[cfg(feature = "tvm")]
pub mod tvm;

#[cfg(feature = "fixed_income")]
pub mod fixed_income;

#[cfg(feature = "interest")]
pub mod interest;

#[cfg(feature = "investments")]
pub mod investments;

#[cfg(feature = "ratios")]
pub mod ratios;

#[cfg(feature = "tax")]
pub mod tax;

pub use error::FinCalcError;
pub use types::*;

/// Standard result type for all fincalc operations
pub type FinCalcResult<T> = Result<T, FinCalcError>;
