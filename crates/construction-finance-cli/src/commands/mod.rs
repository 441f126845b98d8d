pub mod budget;
pub mod cashflow;
pub mod financing;
pub mod investment;
pub mod tax;
