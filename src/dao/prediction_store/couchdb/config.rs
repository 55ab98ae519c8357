const DEFAULT_BASE_URL: &str = "http://localhost:5984";
const DEFAULT_DATABASE: &str = "fanxi";

/// Connection settings for the CouchDB prediction store.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server root, without a trailing slash.
    pub base_url: String,
    /// Database holding predictions and official results.
    pub database: String,
    /// Basic auth username and password.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Read `COUCH_BASE_URL`, `COUCH_DB` and the optional
    /// `COUCH_USERNAME`/`COUCH_PASSWORD` pair.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());

        Self {
            base_url: var("COUCH_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            database: var("COUCH_DB").unwrap_or_else(|| DEFAULT_DATABASE.into()),
            credentials: var("COUCH_USERNAME").zip(var("COUCH_PASSWORD")),
        }
    }
}
