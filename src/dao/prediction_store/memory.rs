//! Process-local prediction store used by tests and the `memory` backend.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;

use crate::dao::{
    models::{OfficialResultEntity, PredictionEntity},
    prediction_store::PredictionStore,
    storage::StorageResult,
};

type PredictionKey = (String, u32);

/// Keeps predictions in a sharded map keyed by `(user_id, match_id)`.
///
/// Each upsert holds the shard lock for its key for the whole
/// read-check-write, so concurrent submissions for one pair collapse into a
/// single record.
#[derive(Clone, Default)]
pub struct MemoryPredictionStore {
    predictions: Arc<DashMap<PredictionKey, PredictionEntity>>,
    official_results: Arc<DashMap<u32, OfficialResultEntity>>,
}

impl MemoryPredictionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn upsert(&self, prediction: PredictionEntity) -> PredictionEntity {
        let key = (prediction.user_id.clone(), prediction.match_id);
        match self.predictions.entry(key) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().overwrite_with(prediction);
                occupied.get().clone()
            }
            Entry::Vacant(vacant) => vacant.insert(prediction).clone(),
        }
    }

    fn collect_sorted<F>(&self, filter: F) -> Vec<PredictionEntity>
    where
        F: Fn(&PredictionEntity) -> bool,
    {
        let mut found = self
            .predictions
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>();
        found.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.match_id.cmp(&b.match_id))
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        found
    }
}

impl PredictionStore for MemoryPredictionStore {
    fn upsert_prediction(
        &self,
        prediction: PredictionEntity,
    ) -> BoxFuture<'static, StorageResult<PredictionEntity>> {
        let stored = self.upsert(prediction);
        Box::pin(async move { Ok(stored) })
    }

    fn find_prediction(
        &self,
        user_id: String,
        match_id: u32,
    ) -> BoxFuture<'static, StorageResult<Option<PredictionEntity>>> {
        let found = self
            .predictions
            .get(&(user_id, match_id))
            .map(|entry| entry.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn list_by_match(
        &self,
        match_id: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<PredictionEntity>>> {
        let found = self.collect_sorted(|prediction| prediction.match_id == match_id);
        Box::pin(async move { Ok(found) })
    }

    fn list_by_user(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<PredictionEntity>>> {
        let found = self.collect_sorted(|prediction| prediction.user_id == user_id);
        Box::pin(async move { Ok(found) })
    }

    fn insert_official_result(
        &self,
        result: OfficialResultEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inserted = match self.official_results.entry(result.match_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(result);
                true
            }
        };
        Box::pin(async move { Ok(inserted) })
    }

    fn list_official_results(&self) -> BoxFuture<'static, StorageResult<Vec<OfficialResultEntity>>> {
        let mut results = self
            .official_results
            .iter()
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>();
        results.sort_by_key(|result| result.match_id);
        Box::pin(async move { Ok(results) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use indexmap::IndexMap;
    use uuid::Uuid;

    use super::*;
    use crate::dao::models::PlayerSlotEntity;

    fn entity(user_id: &str, match_id: u32, formation: &str, at: SystemTime) -> PredictionEntity {
        PredictionEntity {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            match_id,
            team_id: 1,
            formation: formation.into(),
            players: (1..=11)
                .map(|n| PlayerSlotEntity {
                    position: None,
                    name: format!("Player {n}"),
                })
                .collect(),
            tactics: IndexMap::new(),
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn upsert_keeps_identity_of_first_submission() {
        let store = MemoryPredictionStore::new();
        let first_at = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let second_at = first_at + Duration::from_secs(60);

        let first = store
            .upsert_prediction(entity("amy", 1, "4-3-3", first_at))
            .await
            .unwrap();
        let second = store
            .upsert_prediction(entity("amy", 1, "3-5-2", second_at))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first_at);
        assert_eq!(second.updated_at, second_at);
        assert_eq!(second.formation, "3-5-2");
        assert_eq!(store.list_by_match(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listings_filter_by_key_component() {
        let store = MemoryPredictionStore::new();
        let at = SystemTime::UNIX_EPOCH;
        store.upsert_prediction(entity("amy", 1, "4-3-3", at)).await.unwrap();
        store.upsert_prediction(entity("amy", 2, "4-3-3", at)).await.unwrap();
        store.upsert_prediction(entity("bob", 1, "4-4-2", at)).await.unwrap();

        let match_one = store.list_by_match(1).await.unwrap();
        assert_eq!(match_one.len(), 2);
        assert!(match_one.iter().all(|p| p.match_id == 1));

        let amy = store.list_by_user("amy".into()).await.unwrap();
        assert_eq!(
            amy.iter().map(|p| p.match_id).collect::<Vec<_>>(),
            vec![1, 2]
        );

        assert!(store.find_prediction("zack".into(), 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn official_results_are_inserted_once() {
        let store = MemoryPredictionStore::new();
        let result = |match_id, formation: &str| OfficialResultEntity {
            match_id,
            players: vec!["Pedri".into()],
            formation: Some(formation.into()),
            tactics: IndexMap::new(),
            recorded_at: SystemTime::UNIX_EPOCH,
        };

        assert!(store.insert_official_result(result(3, "4-3-3")).await.unwrap());
        assert!(store.insert_official_result(result(1, "4-3-3")).await.unwrap());
        assert!(!store.insert_official_result(result(3, "5-3-2")).await.unwrap());

        let stored = store.list_official_results().await.unwrap();
        assert_eq!(
            stored.iter().map(|r| r.match_id).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(stored[1].formation.as_deref(), Some("4-3-3"));
    }
}
