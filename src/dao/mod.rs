/// Database model definitions.
pub mod models;
/// Prediction persistence backends.
pub mod prediction_store;
/// Storage abstraction layer for database operations.
pub mod storage;
