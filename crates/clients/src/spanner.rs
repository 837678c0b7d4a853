//! Structured-store binding: every write is a single-use read-write
//! transaction committed through a short-lived session.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::auth;
use crate::errors::{check_response, ClientError};
use crate::normalize_endpoint;

#[async_trait]
pub trait StructuredStore: Send + Sync {
    /// Remove every row of `table`.
    async fn delete_all(&self, table: &str) -> Result<(), ClientError>;

    /// Insert `rows` into `table`. Row values are JSON-encoded in column
    /// order; all values travel as strings on the wire.
    async fn insert(
        &self,
        table: &str,
        columns: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> Result<(), ClientError>;
}

#[derive(Debug, Deserialize)]
struct Session {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    #[serde(default)]
    pub commit_timestamp: String,
}

pub struct SpannerClient {
    http: reqwest::Client,
    endpoint: String,
    database_path: String,
    token: Option<String>,
}

impl SpannerClient {
    pub fn new(
        endpoint: impl Into<String>,
        project_id: &str,
        instance: &str,
        database: &str,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: normalize_endpoint(endpoint),
            database_path: format!(
                "projects/{project_id}/instances/{instance}/databases/{database}"
            ),
            token: auth::bearer_token(),
        }
    }

    async fn create_session(&self) -> Result<Session, ClientError> {
        let url = format!("{}/v1/{}/sessions", self.endpoint, self.database_path);
        let req = auth::authorize(self.http.post(&url).json(&json!({})), &self.token);
        let resp = check_response(req.send().await?).await?;
        Ok(resp.json().await?)
    }

    async fn delete_session(&self, name: &str) {
        let url = format!("{}/v1/{}", self.endpoint, name);
        let req = auth::authorize(self.http.delete(&url), &self.token);
        match req.send().await {
            Ok(resp) => {
                if let Err(e) = check_response(resp).await {
                    warn!(error = %e, session = %name, "session delete failed");
                }
            }
            Err(e) => warn!(error = %e, session = %name, "session delete failed"),
        }
    }

    async fn commit_in_session(
        &self,
        session: &str,
        mutations: Vec<Value>,
    ) -> Result<CommitResponse, ClientError> {
        let url = format!("{}/v1/{}:commit", self.endpoint, session);
        let body = json!({
            "singleUseTransaction": { "readWrite": {} },
            "mutations": mutations,
        });
        let req = auth::authorize(self.http.post(&url).json(&body), &self.token);
        let resp = check_response(req.send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Commit mutations in a fresh session; the session is deleted
    /// afterwards whether or not the commit succeeded.
    pub async fn commit(&self, mutations: Vec<Value>) -> Result<CommitResponse, ClientError> {
        let session = self.create_session().await?;
        let result = self.commit_in_session(&session.name, mutations).await;
        self.delete_session(&session.name).await;
        if let Ok(committed) = &result {
            debug!(commit_timestamp = %committed.commit_timestamp, "commit applied");
        }
        result
    }
}

#[async_trait]
impl StructuredStore for SpannerClient {
    async fn delete_all(&self, table: &str) -> Result<(), ClientError> {
        let mutation = json!({ "delete": { "table": table, "keySet": { "all": true } } });
        self.commit(vec![mutation]).await.map(|_| ())
    }

    async fn insert(
        &self,
        table: &str,
        columns: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> Result<(), ClientError> {
        let mutation = json!({ "insert": { "table": table, "columns": columns, "values": rows } });
        self.commit(vec![mutation]).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DB_PATH: &str = "projects/demo-project/instances/demo-instance/databases/demo";

    async fn mock_session(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("POST", format!("/v1/{DB_PATH}/sessions").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "name": format!("{DB_PATH}/sessions/s1") }).to_string())
            .create_async()
            .await
    }

    #[tokio::test]
    async fn insert_commits_through_a_session() {
        let mut server = mockito::Server::new_async().await;
        let session = mock_session(&mut server).await;
        let commit = server
            .mock("POST", format!("/v1/{DB_PATH}/sessions/s1:commit").as_str())
            .match_body(mockito::Matcher::PartialJson(json!({
                "singleUseTransaction": { "readWrite": {} },
                "mutations": [{
                    "insert": {
                        "table": "reservations",
                        "columns": ["id", "name"],
                        "values": [["u-1", "Ray"]],
                    }
                }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"commitTimestamp":"2024-01-01T00:00:00Z"}"#)
            .create_async()
            .await;
        let cleanup = server
            .mock("DELETE", format!("/v1/{DB_PATH}/sessions/s1").as_str())
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client =
            SpannerClient::new(server.url(), "demo-project", "demo-instance", "demo");
        client
            .insert("reservations", &["id", "name"], vec![vec![json!("u-1"), json!("Ray")]])
            .await
            .expect("insert");

        session.assert_async().await;
        commit.assert_async().await;
        cleanup.assert_async().await;
    }

    #[tokio::test]
    async fn delete_all_sends_all_keys_mutation() {
        let mut server = mockito::Server::new_async().await;
        mock_session(&mut server).await;
        let commit = server
            .mock("POST", format!("/v1/{DB_PATH}/sessions/s1:commit").as_str())
            .match_body(mockito::Matcher::PartialJson(json!({
                "mutations": [{ "delete": { "table": "reservations", "keySet": { "all": true } } }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"commitTimestamp":"2024-01-01T00:00:00Z"}"#)
            .create_async()
            .await;
        server
            .mock("DELETE", format!("/v1/{DB_PATH}/sessions/s1").as_str())
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client =
            SpannerClient::new(server.url(), "demo-project", "demo-instance", "demo");
        client.delete_all("reservations").await.expect("delete all");
        commit.assert_async().await;
    }

    #[tokio::test]
    async fn commit_failure_still_deletes_session() {
        let mut server = mockito::Server::new_async().await;
        mock_session(&mut server).await;
        server
            .mock("POST", format!("/v1/{DB_PATH}/sessions/s1:commit").as_str())
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":{"code":10,"message":"Transaction aborted."}}"#)
            .create_async()
            .await;
        let cleanup = server
            .mock("DELETE", format!("/v1/{DB_PATH}/sessions/s1").as_str())
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client =
            SpannerClient::new(server.url(), "demo-project", "demo-instance", "demo");
        let err = client.delete_all("reservations").await.expect_err("must fail");
        assert!(matches!(err, ClientError::Api { code: 10, .. }));
        cleanup.assert_async().await;
    }
}
