pub mod actuals;
pub mod variance;
