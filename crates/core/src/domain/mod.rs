pub mod analysis;
pub mod business;
pub mod review;
pub mod tier;
