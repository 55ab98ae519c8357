use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::debug;

use crate::dao::{
    models::{OfficialResultEntity, PredictionEntity},
    prediction_store::PredictionStore,
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchOfficialResultDocument, CouchPredictionDocument, END_SUFFIX,
        OFFICIAL_RESULT_PREFIX, PREDICTION_PREFIX, match_prefix, official_result_doc_id,
        prediction_doc_id,
    },
};

/// How many times an upsert re-reads the revision after a 409 before giving up.
const MAX_CONFLICT_ATTEMPTS: u32 = 5;
const ALL_DOCS: &str = "_all_docs";

/// Outcome of a document write.
enum PutOutcome {
    Stored,
    Conflict,
}

/// CouchDB-backed prediction store.
///
/// The document id is derived from `(match_id, user_id)`, so the database
/// itself guarantees at most one document per pair.
#[derive(Clone)]
pub struct CouchPredictionStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchPredictionStore {
    /// Build the HTTP client and create the database when it does not exist yet.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            database: Arc::from(config.database),
            auth: config
                .credentials
                .map(|(user, pass)| (Arc::from(user), Arc::from(pass))),
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.authorized(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorized(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                // 412: another instance created it first.
                if create.status().is_success() || create.status() == StatusCode::PRECONDITION_FAILED
                {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<PutOutcome>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Ok(PutOutcome::Conflict),
            status if status.is_success() => Ok(PutOutcome::Stored),
            status => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status,
            }),
        }
    }

    /// Read the current revision, merge, write; a 409 means someone else
    /// wrote in between, so the cycle restarts from a fresh read.
    async fn upsert(&self, candidate: PredictionEntity) -> CouchResult<PredictionEntity> {
        let doc_id = prediction_doc_id(candidate.match_id, &candidate.user_id);

        for attempt in 1..=MAX_CONFLICT_ATTEMPTS {
            let document = match self.get_document::<CouchPredictionDocument>(&doc_id).await? {
                Some(mut existing) => {
                    existing.prediction.overwrite_with(candidate.clone());
                    existing
                }
                None => CouchPredictionDocument::from((candidate.clone(), None)),
            };

            match self.put_document(&doc_id, &document).await? {
                PutOutcome::Stored => return Ok(document.prediction),
                PutOutcome::Conflict => {
                    debug!(doc_id = %doc_id, attempt, "CouchDB revision conflict; retrying upsert");
                }
            }
        }

        Err(CouchDaoError::Conflict {
            path: doc_id,
            attempts: MAX_CONFLICT_ATTEMPTS,
        })
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc)
            .map(|doc| {
                from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: ALL_DOCS.to_string(),
                    source,
                })
            })
            .collect()
    }

    async fn insert_official(&self, result: OfficialResultEntity) -> CouchResult<bool> {
        let doc_id = official_result_doc_id(result.match_id);
        let document = CouchOfficialResultDocument::from(result);
        match self.put_document(&doc_id, &document).await? {
            PutOutcome::Stored => Ok(true),
            PutOutcome::Conflict => Ok(false),
        }
    }

    async fn list_official(&self) -> CouchResult<Vec<OfficialResultEntity>> {
        Ok(self
            .list_documents::<CouchOfficialResultDocument>(OFFICIAL_RESULT_PREFIX)
            .await?
            .into_iter()
            .map(|doc| doc.result)
            .collect())
    }

    async fn list_predictions<F>(&self, prefix: &str, keep: F) -> CouchResult<Vec<PredictionEntity>>
    where
        F: Fn(&PredictionEntity) -> bool,
    {
        let mut predictions = self
            .list_documents::<CouchPredictionDocument>(prefix)
            .await?
            .into_iter()
            .map(|doc| doc.prediction)
            .filter(|prediction| keep(prediction))
            .collect::<Vec<_>>();
        predictions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.match_id.cmp(&b.match_id))
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(predictions)
    }
}

impl PredictionStore for CouchPredictionStore {
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
        Box::pin(async move {
            let doc_id = prediction_doc_id(match_id, &user_id);
            let maybe_doc = store
                .get_document::<CouchPredictionDocument>(&doc_id)
                .await?;
            Ok(maybe_doc.map(|doc| doc.prediction))
        })
    }

    fn list_by_match(
        &self,
        match_id: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<PredictionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_predictions(&match_prefix(match_id), |_| true)
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
                .list_predictions(PREDICTION_PREFIX, |prediction| prediction.user_id == user_id)
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
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .authorized(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
