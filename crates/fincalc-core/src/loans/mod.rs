pub mod amortization;
pub mod apr;
pub mod lease;
pub mod mortgage;
