pub mod bonds;
pub mod interest;
pub mod investments;
pub mod loans;
pub mod ratios;
pub mod tax;
pub mod tvm;
