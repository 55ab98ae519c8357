use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

/// Server error code reported when a unique index rejects a write.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Result alias returning [`MongoDaoError`] failures.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures that can occur while interacting with MongoDB.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection string could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Rejected connection string.
        uri: String,
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// The driver refused the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered during startup.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Attempts made.
        attempts: u32,
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// A periodic health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// Creating a required index failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Target collection.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// A prediction could not be serialized into BSON.
    #[error("failed to encode prediction `{id}`: {message}")]
    Encode {
        /// Document identifier.
        id: String,
        /// Encoder message.
        message: String,
    },
    /// Writing a prediction failed.
    #[error("failed to save prediction of `{user_id}` for match {match_id}")]
    SavePrediction {
        /// Owner of the prediction.
        user_id: String,
        /// Match concerned.
        match_id: u32,
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// The upserted document was not returned.
    #[error("prediction of `{user_id}` for match {match_id} vanished during upsert")]
    UpsertLost {
        /// Owner of the prediction.
        user_id: String,
        /// Match concerned.
        match_id: u32,
    },
    /// Reading predictions failed.
    #[error("failed to load predictions ({scope})")]
    LoadPredictions {
        /// Filter that was applied.
        scope: String,
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// Writing an official result failed.
    #[error("failed to save official result of match {match_id}")]
    SaveOfficialResult {
        /// Match concerned.
        match_id: u32,
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// Reading official results failed.
    #[error("failed to load official results")]
    LoadOfficialResults {
        /// Underlying driver error.
        #[source]
        source: MongoError,
    },
    /// A stored document does not fit the domain types.
    #[error("stored document `{id}` is malformed: {reason}")]
    MalformedDocument {
        /// Document identifier.
        id: String,
        /// What did not fit.
        reason: &'static str,
    },
}

/// Whether `err` is a unique index violation raised by a racing insert.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => command.code == DUPLICATE_KEY_CODE,
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
