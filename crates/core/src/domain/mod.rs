pub mod assessment;
pub mod benchmark;
pub mod contract;
pub mod history;
pub mod ratios;
