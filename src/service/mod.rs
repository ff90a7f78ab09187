pub mod aggregator;
pub mod report;
pub mod token;
