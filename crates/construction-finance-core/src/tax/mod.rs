pub mod estimator;
pub mod policy;
