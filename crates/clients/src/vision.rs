//! Image annotation binding: one `images:annotate` batch request carrying
//! a single `LABEL_DETECTION` feature.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth;
use crate::errors::{check_response, ClientError, RpcStatus};
use crate::normalize_endpoint;

pub const LABEL_DETECTION: &str = "LABEL_DETECTION";

#[async_trait]
pub trait ImageAnnotator: Send + Sync {
    /// Run label detection over raw image bytes and return the first
    /// annotation of the batch.
    async fn annotate_labels(&self, image: &[u8]) -> Result<AnnotateImageResponse, ClientError>;
}

#[derive(Debug, Serialize)]
struct BatchAnnotateImagesRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest {
    image: Image,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct Image {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    feature_type: &'static str,
    max_results: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BatchAnnotateImagesResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    #[serde(default)]
    pub label_annotations: Vec<LabelAnnotation>,
    #[serde(default)]
    pub error: Option<RpcStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelAnnotation {
    #[serde(default)]
    pub mid: String,
    pub description: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub topicality: f32,
}

pub struct ImageAnnotatorClient {
    http: reqwest::Client,
    endpoint: String,
    max_results: u32,
    token: Option<String>,
}

impl ImageAnnotatorClient {
    pub fn new(endpoint: impl Into<String>, max_results: u32) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: normalize_endpoint(endpoint),
            max_results,
            token: auth::bearer_token(),
        }
    }
}

#[async_trait]
impl ImageAnnotator for ImageAnnotatorClient {
    async fn annotate_labels(&self, image: &[u8]) -> Result<AnnotateImageResponse, ClientError> {
        let body = BatchAnnotateImagesRequest {
            requests: vec![AnnotateImageRequest {
                image: Image { content: BASE64.encode(image) },
                features: vec![Feature { feature_type: LABEL_DETECTION, max_results: self.max_results }],
            }],
        };
        let url = format!("{}/v1/images:annotate", self.endpoint);
        let req = auth::authorize(self.http.post(&url).json(&body), &self.token);
        let resp = check_response(req.send().await?).await?;
        let batch: BatchAnnotateImagesResponse = resp.json().await?;
        let reply = batch
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Unexpected("empty annotation batch".into()))?;
        if let Some(status) = &reply.error {
            return Err(ClientError::Api { code: status.code, message: status.message.clone() });
        }
        debug!(labels = reply.label_annotations.len(), "annotation received");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PNG_STUB: &[u8] = &[0x89, b'P', b'N', b'G'];

    #[tokio::test]
    async fn annotate_labels_parses_first_response() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/v1/images:annotate")
            .match_body(mockito::Matcher::PartialJson(json!({
                "requests": [{
                    "image": { "content": BASE64.encode(PNG_STUB) },
                    "features": [{ "type": "LABEL_DETECTION", "maxResults": 5 }],
                }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"responses":[{"labelAnnotations":[
                    {"mid":"/m/01yrx","description":"Cat","score":0.98,"topicality":0.98},
                    {"description":"Whiskers","score":0.91}
                ]}]}"#,
            )
            .create_async()
            .await;

        let client = ImageAnnotatorClient::new(server.url(), 5);
        let reply = client.annotate_labels(PNG_STUB).await.expect("annotate");

        assert_eq!(reply.label_annotations.len(), 2);
        assert_eq!(reply.label_annotations[0].description, "Cat");
        assert!(reply.label_annotations[0].score > 0.9);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn annotate_labels_surfaces_per_image_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/images:annotate")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"responses":[{"error":{"code":3,"message":"Bad image data."}}]}"#)
            .create_async()
            .await;

        let client = ImageAnnotatorClient::new(server.url(), 10);
        let err = client.annotate_labels(b"not an image").await.expect_err("must fail");
        match err {
            ClientError::Api { code, message } => {
                assert_eq!(code, 3);
                assert!(message.contains("Bad image data"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn annotate_labels_maps_http_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/images:annotate")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":{"code":401,"message":"Request had invalid credentials."}}"#)
            .create_async()
            .await;

        let client = ImageAnnotatorClient::new(server.url(), 10);
        let err = client.annotate_labels(PNG_STUB).await.expect_err("must fail");
        assert!(matches!(err, ClientError::Api { code: 401, .. }));
    }
}
