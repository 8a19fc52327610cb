pub mod chit_fund;
pub mod dti;
pub mod real_estate;
pub mod refinance;
