/// CouchDB backend.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// In-process backend.
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{OfficialResultEntity, PredictionEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for lineup predictions and the official results
/// they are scored against.
pub trait PredictionStore: Send + Sync {
    /// Insert `prediction`, or overwrite the record already stored for its
    /// `(user_id, match_id)` pair, returning what is now persisted.
    fn upsert_prediction(
        &self,
        prediction: PredictionEntity,
    ) -> BoxFuture<'static, StorageResult<PredictionEntity>>;
    /// Prediction stored for the `(user_id, match_id)` pair.
    fn find_prediction(
        &self,
        user_id: String,
        match_id: u32,
    ) -> BoxFuture<'static, StorageResult<Option<PredictionEntity>>>;
    /// Predictions for a match, oldest first.
    fn list_by_match(&self, match_id: u32)
    -> BoxFuture<'static, StorageResult<Vec<PredictionEntity>>>;
    /// Predictions of a user, oldest first.
    fn list_by_user(&self, user_id: String)
    -> BoxFuture<'static, StorageResult<Vec<PredictionEntity>>>;
    /// Persist `result` unless its match already has one; `false` means one was in place.
    fn insert_official_result(
        &self,
        result: OfficialResultEntity,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Every persisted official result, by match id.
    fn list_official_results(&self) -> BoxFuture<'static, StorageResult<Vec<OfficialResultEntity>>>;
    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
