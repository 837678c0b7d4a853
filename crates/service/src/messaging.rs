use chrono::Utc;
use clients::pubsub::MessagePublisher;
use tracing::info;

use crate::errors::ServiceError;

/// Publish the reservation message backing `GET /publish`.
pub async fn publish_reservation(
    publisher: &dyn MessagePublisher,
    topic: &str,
    name: &str,
) -> Result<String, ServiceError> {
    let payload = format!("reservation for {name}");
    let message_id = publisher.publish(topic, payload.as_bytes()).await?;
    info!(%topic, %message_id, "published reservation");
    Ok(message_id)
}

/// Startup demo: publish one timestamped greeting.
pub async fn publish_greeting(
    publisher: &dyn MessagePublisher,
    topic: &str,
) -> Result<String, ServiceError> {
    let payload = format!("bonjour @ {}", Utc::now().to_rfc3339());
    let message_id = publisher.publish(topic, payload.as_bytes()).await?;
    info!(%topic, %message_id, "published greeting");
    Ok(message_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clients::errors::ClientError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl MessagePublisher for RecordingPublisher {
        async fn publish(&self, topic: &str, data: &[u8]) -> Result<String, ClientError> {
            let mut published = self.published.lock().unwrap();
            published.push((topic.to_string(), String::from_utf8_lossy(data).into_owned()));
            Ok(format!("id-{}", published.len()))
        }
    }

    #[tokio::test]
    async fn publish_reservation_sends_expected_payload_once() {
        let publisher = RecordingPublisher::default();
        let id = publish_reservation(&publisher, "reservations", "Ray").await.expect("publish");

        assert_eq!(id, "id-1");
        let published = publisher.published.lock().unwrap();
        assert_eq!(
            *published,
            vec![("reservations".to_string(), "reservation for Ray".to_string())]
        );
    }

    #[tokio::test]
    async fn publish_greeting_is_timestamped() {
        let publisher = RecordingPublisher::default();
        publish_greeting(&publisher, "reservations").await.expect("publish");

        let published = publisher.published.lock().unwrap();
        assert_eq!(published[0].0, "reservations");
        assert!(published[0].1.starts_with("bonjour @ "));
    }
}
