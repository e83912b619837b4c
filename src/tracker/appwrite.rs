//! Appwrite-backed popularity counters.
//!
//! Counters are documents in a single collection with the attributes
//! `searchTerm` (string), `count` (integer), `movie_id` (integer), and
//! `poster_url` (url).

use super::{rank, PopularityTracker};
use crate::config::TrackerConfig;
use anyhow::{Context, Result};
use marquee_common::{normalize_query, MovieRecord, TrendingEntry};
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

/// Connection timeout for Appwrite API requests
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

const QUERY_ATTRIBUTE: &str = "searchTerm";
const COUNT_ATTRIBUTE: &str = "count";

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<CounterDocument>,
}

#[derive(Debug, Deserialize)]
struct CounterDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "searchTerm")]
    search_term: String,
    #[serde(default)]
    count: u64,
    #[serde(default)]
    movie_id: u64,
    poster_url: Option<String>,
}

impl From<CounterDocument> for TrendingEntry {
    fn from(doc: CounterDocument) -> Self {
        TrendingEntry {
            id: doc.id,
            query_text: doc.search_term,
            count: doc.count,
            movie_id: doc.movie_id,
            poster_url: doc.poster_url,
        }
    }
}

#[derive(Serialize)]
struct NewCounter<'a> {
    #[serde(rename = "searchTerm")]
    search_term: &'a str,
    count: u64,
    movie_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    poster_url: Option<String>,
}

pub struct AppwriteTracker {
    client: Client,
    documents_url: String,
    project_id: String,
    api_key: Option<String>,
    poster_base: String,
}

impl AppwriteTracker {
    pub fn new(config: &TrackerConfig, poster_base: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(CONNECTION_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        let documents_url = format!(
            "{}/databases/{}/collections/{}/documents",
            config.endpoint.trim_end_matches('/'),
            config.database_id,
            config.collection_id
        );

        Self {
            client,
            documents_url,
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            poster_base: poster_base.into(),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("X-Appwrite-Project", &self.project_id);
        match self.api_key {
            Some(ref key) => builder.header("X-Appwrite-Key", key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, context_msg: &str) -> Result<reqwest::Response> {
        let response = builder.send().await.context(context_msg.to_string())?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} ({}): {}", context_msg, status, body);
        }
        Ok(response)
    }

    async fn list(&self, queries: &[serde_json::Value], context_msg: &str) -> Result<Vec<CounterDocument>> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.to_string()))
            .collect();

        let response = self
            .send(
                self.request(Method::GET, &self.documents_url).query(&params),
                context_msg,
            )
            .await?;

        let list: DocumentList = response
            .json()
            .await
            .context("Failed to parse Appwrite document list")?;
        Ok(list.documents)
    }

    async fn find(&self, query_text: &str) -> Result<Option<CounterDocument>> {
        let filter = json!({
            "method": "equal",
            "attribute": QUERY_ATTRIBUTE,
            "values": [query_text],
        });
        let documents = self
            .list(&[filter], "Failed to look up search counter")
            .await?;
        Ok(documents.into_iter().next())
    }

    async fn create(&self, query_text: &str, top_result: &MovieRecord) -> Result<()> {
        let body = json!({
            "documentId": Uuid::new_v4().simple().to_string(),
            "data": NewCounter {
                search_term: query_text,
                count: 1,
                movie_id: top_result.id,
                poster_url: top_result.poster_url(&self.poster_base),
            },
        });

        self.send(
            self.request(Method::POST, &self.documents_url).json(&body),
            "Failed to create search counter",
        )
        .await?;
        Ok(())
    }

    async fn increment(&self, doc: &CounterDocument) -> Result<()> {
        let url = format!("{}/{}", self.documents_url, doc.id);
        let body = json!({ "data": { "count": doc.count + 1 } });

        self.send(
            self.request(Method::PATCH, &url).json(&body),
            "Failed to update search counter",
        )
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PopularityTracker for AppwriteTracker {
    fn name(&self) -> &'static str {
        "appwrite"
    }

    async fn record_search(&self, query: &str, top_result: &MovieRecord) -> Result<()> {
        let key = normalize_query(query);
        if key.is_empty() {
            anyhow::bail!("Cannot record a blank query");
        }

        match self.find(&key).await? {
            Some(doc) => {
                tracing::debug!(query = %key, count = doc.count + 1, "Incrementing search counter");
                self.increment(&doc).await
            }
            None => {
                tracing::debug!(query = %key, movie_id = top_result.id, "Creating search counter");
                self.create(&key, top_result).await
            }
        }
    }

    async fn trending(&self, limit: usize) -> Result<Vec<TrendingEntry>> {
        let queries = [
            json!({ "method": "orderDesc", "attribute": COUNT_ATTRIBUTE }),
            json!({ "method": "limit", "values": [limit] }),
        ];
        let documents = self
            .list(&queries, "Failed to fetch trending searches")
            .await?;

        Ok(rank(
            documents.into_iter().map(TrendingEntry::from).collect(),
            limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TrackerConfig {
        TrackerConfig {
            endpoint: "https://cloud.appwrite.io/v1/".into(),
            project_id: "proj".into(),
            database_id: "db".into(),
            collection_id: "metrics".into(),
            ..TrackerConfig::default()
        }
    }

    #[test]
    fn documents_url_is_built_from_identifiers() {
        let tracker = AppwriteTracker::new(&config(), "https://img");
        assert_eq!(
            tracker.documents_url,
            "https://cloud.appwrite.io/v1/databases/db/collections/metrics/documents"
        );
    }

    #[test]
    fn empty_api_key_is_treated_as_absent() {
        let mut cfg = config();
        cfg.api_key = Some(String::new());
        let tracker = AppwriteTracker::new(&cfg, "https://img");
        assert!(tracker.api_key.is_none());
    }

    #[test]
    fn counter_document_parses_appwrite_shape() {
        let doc: CounterDocument = serde_json::from_str(
            r#"{
                "$id": "abc",
                "$collectionId": "metrics",
                "$createdAt": "2024-05-01T10:00:00.000+00:00",
                "searchTerm": "dune",
                "count": 4,
                "movie_id": 438631,
                "poster_url": "https://image.tmdb.org/t/p/w500/d5NXSklXo0qyIYkgV94XAgMIckC.jpg"
            }"#,
        )
        .unwrap();

        let entry = TrendingEntry::from(doc);
        assert_eq!(entry.id, "abc");
        assert_eq!(entry.query_text, "dune");
        assert_eq!(entry.count, 4);
        assert_eq!(entry.movie_id, 438631);
    }

    #[test]
    fn new_counter_serializes_wire_names() {
        let value = serde_json::to_value(NewCounter {
            search_term: "heat",
            count: 1,
            movie_id: 949,
            poster_url: None,
        })
        .unwrap();
        assert_eq!(value, json!({"searchTerm": "heat", "count": 1, "movie_id": 949}));
    }
}
