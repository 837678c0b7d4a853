use clients::spanner::StructuredStore;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::errors::ServiceError;

pub const RESERVATIONS_TABLE: &str = "reservations";

pub const SEED_NAMES: [&str; 6] = ["Ray", "Josh", "Jisha", "Cornelia", "Madhura", "Nabil"];

/// Startup demo: clear the structured store's reservations and insert a
/// fresh UUID-keyed row per seed name. Returns how many rows were written.
pub async fn seed_reservations(store: &dyn StructuredStore) -> Result<usize, ServiceError> {
    store.delete_all(RESERVATIONS_TABLE).await?;

    let mut rows = Vec::with_capacity(SEED_NAMES.len());
    for name in SEED_NAMES {
        let id = Uuid::new_v4().to_string();
        info!(%id, %name, "seeding reservation");
        rows.push(vec![json!(id), json!(name)]);
    }
    store.insert(RESERVATIONS_TABLE, &["id", "name"], rows).await?;
    Ok(SEED_NAMES.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clients::errors::ClientError;
    use serde_json::Value;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<String>>,
        rows: Mutex<Vec<Vec<Value>>>,
    }

    #[async_trait]
    impl StructuredStore for RecordingStore {
        async fn delete_all(&self, table: &str) -> Result<(), ClientError> {
            self.calls.lock().unwrap().push(format!("delete_all:{table}"));
            Ok(())
        }

        async fn insert(
            &self,
            table: &str,
            columns: &[&str],
            rows: Vec<Vec<Value>>,
        ) -> Result<(), ClientError> {
            self.calls.lock().unwrap().push(format!("insert:{table}:{}", columns.join(",")));
            self.rows.lock().unwrap().extend(rows);
            Ok(())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl StructuredStore for FailingStore {
        async fn delete_all(&self, _table: &str) -> Result<(), ClientError> {
            Err(ClientError::Api { code: 14, message: "unavailable".into() })
        }

        async fn insert(
            &self,
            _table: &str,
            _columns: &[&str],
            _rows: Vec<Vec<Value>>,
        ) -> Result<(), ClientError> {
            panic!("insert must not run when delete_all fails");
        }
    }

    #[tokio::test]
    async fn seed_clears_then_inserts_every_name() {
        let store = RecordingStore::default();
        let count = seed_reservations(&store).await.expect("seed");

        assert_eq!(count, SEED_NAMES.len());
        let calls = store.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec!["delete_all:reservations".to_string(), "insert:reservations:id,name".to_string()]
        );

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), SEED_NAMES.len());
        for (row, name) in rows.iter().zip(SEED_NAMES) {
            assert_eq!(row.len(), 2);
            // id is a fresh uuid string
            let id = row[0].as_str().expect("string id");
            assert_eq!(Uuid::parse_str(id).expect("uuid").get_version_num(), 4);
            assert_eq!(row[1], json!(name));
        }
    }

    #[tokio::test]
    async fn seed_propagates_store_failure() {
        let err = seed_reservations(&FailingStore).await.expect_err("must fail");
        assert!(matches!(err, ServiceError::Client(ClientError::Api { code: 14, .. })));
    }
}
