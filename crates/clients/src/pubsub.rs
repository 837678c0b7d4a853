//! Publish/subscribe binding: topic publish plus a pull/acknowledge
//! subscriber loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth;
use crate::errors::{check_response, ClientError};
use crate::normalize_endpoint;

const MAX_PULL_MESSAGES: u32 = 16;
const EMPTY_PULL_PAUSE: Duration = Duration::from_millis(500);
const ERROR_PAUSE: Duration = Duration::from_secs(2);

#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish one payload to a topic and return the provider message id.
    async fn publish(&self, topic: &str, data: &[u8]) -> Result<String, ClientError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubsubMessage {
    /// Base64-encoded payload, as it travels on the wire.
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub message_id: String,
    #[serde(default)]
    pub publish_time: String,
}

impl PubsubMessage {
    pub fn payload(&self) -> Result<Vec<u8>, ClientError> {
        BASE64
            .decode(&self.data)
            .map_err(|e| ClientError::Unexpected(format!("invalid base64 payload: {e}")))
    }

    /// Payload as text, replacing any non-UTF-8 bytes.
    pub fn text(&self) -> String {
        match self.payload() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedMessage {
    pub ack_id: String,
    #[serde(default)]
    pub message: PubsubMessage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullResponse {
    #[serde(default)]
    received_messages: Vec<ReceivedMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

pub struct PubSubClient {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    token: Option<String>,
}

impl PubSubClient {
    pub fn new(endpoint: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: normalize_endpoint(endpoint),
            project_id: project_id.into(),
            token: auth::bearer_token(),
        }
    }

    fn topic_url(&self, topic: &str, verb: &str) -> String {
        format!("{}/v1/projects/{}/topics/{}:{}", self.endpoint, self.project_id, topic, verb)
    }

    fn subscription_url(&self, subscription: &str, verb: &str) -> String {
        format!(
            "{}/v1/projects/{}/subscriptions/{}:{}",
            self.endpoint, self.project_id, subscription, verb
        )
    }

    /// Pull up to `max_messages` messages; may legitimately return none.
    pub async fn pull(
        &self,
        subscription: &str,
        max_messages: u32,
    ) -> Result<Vec<ReceivedMessage>, ClientError> {
        let url = self.subscription_url(subscription, "pull");
        let body = json!({ "maxMessages": max_messages, "returnImmediately": true });
        let req = auth::authorize(self.http.post(&url).json(&body), &self.token);
        let resp = check_response(req.send().await?).await?;
        let pulled: PullResponse = resp.json().await?;
        Ok(pulled.received_messages)
    }

    pub async fn acknowledge(
        &self,
        subscription: &str,
        ack_ids: &[String],
    ) -> Result<(), ClientError> {
        if ack_ids.is_empty() {
            return Ok(());
        }
        let url = self.subscription_url(subscription, "acknowledge");
        let body = json!({ "ackIds": ack_ids });
        let req = auth::authorize(self.http.post(&url).json(&body), &self.token);
        check_response(req.send().await?).await?;
        debug!(count = ack_ids.len(), %subscription, "acknowledged");
        Ok(())
    }

    /// Spawn the subscriber loop: pull, hand each message to `handler`,
    /// then acknowledge the whole batch unconditionally. Pauses briefly on
    /// empty pulls and transport errors; redelivery of unacked messages is
    /// the provider's concern.
    pub fn subscribe<F>(self: Arc<Self>, subscription: &str, handler: F) -> JoinHandle<()>
    where
        F: Fn(PubsubMessage) + Send + Sync + 'static,
    {
        let client = self;
        let subscription = subscription.to_string();
        tokio::spawn(async move {
            info!(%subscription, "subscriber loop started");
            loop {
                match client.pull(&subscription, MAX_PULL_MESSAGES).await {
                    Ok(received) if received.is_empty() => {
                        tokio::time::sleep(EMPTY_PULL_PAUSE).await;
                    }
                    Ok(received) => {
                        let ack_ids: Vec<String> =
                            received.iter().map(|m| m.ack_id.clone()).collect();
                        for rm in received {
                            handler(rm.message);
                        }
                        if let Err(e) = client.acknowledge(&subscription, &ack_ids).await {
                            warn!(error = %e, %subscription, "acknowledge failed");
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, %subscription, "pull failed");
                        tokio::time::sleep(ERROR_PAUSE).await;
                    }
                }
            }
        })
    }
}

#[async_trait]
impl MessagePublisher for PubSubClient {
    async fn publish(&self, topic: &str, data: &[u8]) -> Result<String, ClientError> {
        let url = self.topic_url(topic, "publish");
        let body = json!({ "messages": [{ "data": BASE64.encode(data) }] });
        let req = auth::authorize(self.http.post(&url).json(&body), &self.token);
        let resp = check_response(req.send().await?).await?;
        let published: PublishResponse = resp.json().await?;
        published
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Unexpected("publish returned no message id".into()))
    }
}
