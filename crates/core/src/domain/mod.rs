pub mod contract;
pub mod loan;
