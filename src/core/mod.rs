pub mod report;
pub mod scoring;
pub mod store;
pub mod workflow;
