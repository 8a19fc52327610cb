pub mod compound;
pub mod deposits;
pub mod simple;
