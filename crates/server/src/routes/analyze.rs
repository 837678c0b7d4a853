use axum::extract::{Multipart, State};
use tracing::info;

use clients::vision::AnnotateImageResponse;

use crate::errors::ApiError;
use crate::observability;
use crate::state::DynAnnotator;

/// Accept an uploaded image and forward it to label detection. The reply
/// is the provider's annotations rendered one label per line.
pub async fn analyze(
    State(annotator): State<DynAnnotator>,
    mut multipart: Multipart,
) -> Result<String, ApiError> {
    let (filename, data) = extract_image(&mut multipart).await?;
    info!(filename = %filename, size = data.len(), "analyzing uploaded image");

    let reply = {
        let _timer = observability::ANNOTATE_DURATION.start_timer();
        annotator.annotate_labels(&data).await?
    };
    observability::ANNOTATE_REQUESTS_TOTAL.inc();
    Ok(render_labels(&reply))
}

async fn extract_image(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart form: {e}")))?
    {
        if field.name() == Some("image") {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("failed to read image field: {e}")))?;
            return Ok((filename, data.to_vec()));
        }
    }
    Err(ApiError::bad_request("expected an 'image' field in the multipart form"))
}

fn render_labels(reply: &AnnotateImageResponse) -> String {
    reply
        .label_annotations
        .iter()
        .map(|label| format!("{} (score {:.3})", label.description, label.score))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clients::vision::LabelAnnotation;

    #[test]
    fn labels_render_one_per_line() {
        let reply = AnnotateImageResponse {
            label_annotations: vec![
                LabelAnnotation {
                    mid: "/m/01yrx".into(),
                    description: "Cat".into(),
                    score: 0.987,
                    topicality: 0.98,
                },
                LabelAnnotation {
                    mid: String::new(),
                    description: "Whiskers".into(),
                    score: 0.91,
                    topicality: 0.9,
                },
            ],
            error: None,
        };
        let text = render_labels(&reply);
        assert_eq!(text, "Cat (score 0.987)\nWhiskers (score 0.910)");
    }

    #[test]
    fn no_labels_renders_empty() {
        let reply = AnnotateImageResponse::default();
        assert_eq!(render_labels(&reply), "");
    }
}
