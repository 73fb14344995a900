pub mod classifier;
pub mod executor;
pub mod export_validator;
pub mod fixtures;
pub mod report;
pub mod source_checks;
pub mod summary;
