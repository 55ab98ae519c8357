use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc, serialize_to_document},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        MongoOfficialResultDocument, MongoPredictionDocument, match_filter, pair_filter,
        user_filter,
    },
};
use crate::dao::{
    models::{OfficialResultEntity, PredictionEntity},
    prediction_store::PredictionStore,
    storage::StorageResult,
};

const PREDICTION_COLLECTION_NAME: &str = "predictions";
const OFFICIAL_RESULT_COLLECTION_NAME: &str = "official_results";
const PAIR_INDEX_NAME: &str = "prediction_user_match_idx";

/// MongoDB-backed prediction store.
#[derive(Clone)]
pub struct MongoPredictionStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    // Kept so the connection pool lives as long as the database handle.
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.state.read().await.database.clone();
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoPredictionStore {
    /// Connect to MongoDB and make sure the `(user_id, match_id)` unique index exists.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let store = Self {
            inner: Arc::new(MongoInner {
                state: RwLock::new(MongoState { client, database }),
                config,
            }),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "match_id": 1 })
            .options(
                IndexOptions::builder()
                    .name(Some(PAIR_INDEX_NAME.to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        self.collection()
            .await
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PREDICTION_COLLECTION_NAME,
                index: PAIR_INDEX_NAME,
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoPredictionDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoPredictionDocument>(PREDICTION_COLLECTION_NAME)
    }

    async fn official_collection(&self) -> Collection<MongoOfficialResultDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoOfficialResultDocument>(OFFICIAL_RESULT_COLLECTION_NAME)
    }

    /// Insert-or-replace in a single `findAndModify`.
    ///
    /// Two racing first submissions can both miss the filter and try to
    /// insert; the unique index rejects the loser, which then applies its
    /// fields as a plain update of the winner's record.
    async fn upsert(&self, prediction: PredictionEntity) -> MongoResult<PredictionEntity> {
        let user_id = prediction.user_id.clone();
        let match_id = prediction.match_id;
        let update = upsert_update(&MongoPredictionDocument::from(prediction))?;

        let collection = self.collection().await;
        let filter = pair_filter(&user_id, match_id);
        let stored = match collection
            .find_one_and_update(filter.clone(), update.clone())
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
        {
            Ok(stored) => stored,
            Err(err) if is_duplicate_key(&err) => {
                debug!(%user_id, match_id, "concurrent insert won; applying as update");
                collection
                    .find_one_and_update(filter, without_insert_fields(update))
                    .return_document(ReturnDocument::After)
                    .await
                    .map_err(|source| MongoDaoError::SavePrediction {
                        user_id: user_id.clone(),
                        match_id,
                        source,
                    })?
            }
            Err(source) => {
                return Err(MongoDaoError::SavePrediction {
                    user_id,
                    match_id,
                    source,
                });
            }
        };

        stored
            .ok_or(MongoDaoError::UpsertLost { user_id, match_id })?
            .try_into()
    }

    async fn find(&self, user_id: &str, match_id: u32) -> MongoResult<Option<PredictionEntity>> {
        self.collection()
            .await
            .find_one(pair_filter(user_id, match_id))
            .await
            .map_err(|source| MongoDaoError::LoadPredictions {
                scope: format!("user `{user_id}`, match {match_id}"),
                source,
            })?
            .map(PredictionEntity::try_from)
            .transpose()
    }

    async fn list(&self, filter: Document, scope: String) -> MongoResult<Vec<PredictionEntity>> {
        let documents: Vec<MongoPredictionDocument> = self
            .collection()
            .await
            .find(filter)
            .sort(doc! { "created_at": 1, "match_id": 1, "user_id": 1 })
            .await
            .map_err(|source| MongoDaoError::LoadPredictions {
                scope: scope.clone(),
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadPredictions { scope, source })?;

        documents.into_iter().map(PredictionEntity::try_from).collect()
    }

    /// `_id` is the match id, so the primary key index enforces one result per match.
    async fn insert_official(&self, result: OfficialResultEntity) -> MongoResult<bool> {
        let match_id = result.match_id;
        match self
            .official_collection()
            .await
            .insert_one(MongoOfficialResultDocument::from(result))
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::SaveOfficialResult { match_id, source }),
        }
    }

    async fn list_official(&self) -> MongoResult<Vec<OfficialResultEntity>> {
        let documents: Vec<MongoOfficialResultDocument> = self
            .official_collection()
            .await
            .find(doc! {})
            .sort(doc! { "_id": 1 })
            .await
            .map_err(|source| MongoDaoError::LoadOfficialResults { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadOfficialResults { source })?;

        documents
            .into_iter()
            .map(OfficialResultEntity::try_from)
            .collect()
    }
}

/// `$set` replaces the resubmittable fields; identity and creation time are written only
/// by the insert that creates the record.
fn upsert_update(document: &MongoPredictionDocument) -> MongoResult<Document> {
    let fields = serialize_to_document(&document.body).map_err(|err| MongoDaoError::Encode {
        id: document.id.clone(),
        message: err.to_string(),
    })?;
    Ok(doc! {
        "$set": fields,
        "$setOnInsert": {
            "_id": document.id.clone(),
            "created_at": document.created_at,
        },
    })
}

fn without_insert_fields(mut update: Document) -> Document {
    update.remove("$setOnInsert");
    update
}

impl PredictionStore for MongoPredictionStore {
    fn upsert_prediction(
        &self,
        prediction: PredictionEntity,
    ) -> BoxFuture<'static, StorageResult<PredictionEntity>> {
        let store = self.clone();
        Box::pin(async move { store.upsert(prediction).await.map_err(Into::into) })
    }

    fn find_prediction(
        &self,
        user_id: String,
        match_id: u32,
    ) -> BoxFuture<'static, StorageResult<Option<PredictionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find(&user_id, match_id).await.map_err(Into::into) })
    }

    fn list_by_match(
        &self,
        match_id: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<PredictionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list(match_filter(match_id), format!("match {match_id}"))
                .await
                .map_err(Into::into)
        })
    }

    fn list_by_user(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<PredictionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list(user_filter(&user_id), format!("user `{user_id}`"))
                .await
                .map_err(Into::into)
        })
    }

    fn insert_official_result(
        &self,
        result: OfficialResultEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.insert_official(result).await.map_err(Into::into) })
    }

    fn list_official_results(&self) -> BoxFuture<'static, StorageResult<Vec<OfficialResultEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_official().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use indexmap::IndexMap;
    use uuid::Uuid;

    use super::*;
    use crate::dao::models::PlayerSlotEntity;

    fn document() -> MongoPredictionDocument {
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        PredictionEntity {
            id: Uuid::new_v4(),
            user_id: "amy".into(),
            match_id: 1,
            team_id: 1,
            formation: "4-3-3".into(),
            players: vec![PlayerSlotEntity {
                position: None,
                name: "Pedri".into(),
            }],
            tactics: IndexMap::from([("pressing".to_string(), 55)]),
            created_at: at,
            updated_at: at,
        }
        .into()
    }

    #[test]
    fn update_sets_body_and_inserts_identity_once() {
        let document = document();
        let update = upsert_update(&document).unwrap();

        let set = update.get_document("$set").unwrap();
        for field in ["team_id", "formation", "players", "tactics", "updated_at"] {
            assert!(set.contains_key(field), "missing `{field}` in $set");
        }

        let on_insert = update.get_document("$setOnInsert").unwrap();
        assert_eq!(on_insert.get_str("_id").unwrap(), document.id);
        assert!(on_insert.contains_key("created_at"));

        // Mongo rejects an update touching the same path in both operators.
        assert!(on_insert.keys().all(|key| !set.contains_key(key)));
        for identity in ["user_id", "match_id"] {
            assert!(!set.contains_key(identity));
        }
    }

    #[test]
    fn retry_after_duplicate_key_keeps_only_set() {
        let update = without_insert_fields(upsert_update(&document()).unwrap());
        assert!(update.contains_key("$set"));
        assert!(!update.contains_key("$setOnInsert"));
    }
}
