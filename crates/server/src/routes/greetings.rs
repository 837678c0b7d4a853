use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::ApiError;
use crate::state::ServerState;

pub const GREETER_NAMES: [&str; 3] = ["Ray", "Badhr", "Hanae"];
pub const HELLO_NAMES: [&str; 4] = ["josh", "ray", "jisha", "madhura"];

#[derive(Debug, Deserialize)]
pub struct NameParam {
    pub name: String,
}

pub async fn hello(Query(NameParam { name }): Query<NameParam>) -> String {
    info!("Hello {name}");
    format!("Hello {name}")
}

pub async fn salut(Path(name): Path<String>) -> String {
    info!("greeting {name}.");
    format!("bonjour {name}!")
}

/// Call our own `/salut/{name}` once per name and collect the replies,
/// exercising the tracing middleware across a request chain.
pub async fn greeter(State(state): State<ServerState>) -> Result<Json<Vec<String>>, ApiError> {
    let mut replies = Vec::with_capacity(GREETER_NAMES.len());
    for name in GREETER_NAMES {
        let url = format!("{}/salut/{name}", state.self_base_url);
        let resp = state.http.get(&url).send().await?.error_for_status()?;
        replies.push(resp.text().await?);
    }
    Ok(Json(replies))
}

/// Fire-and-forget loopback `/hello` calls; failures are logged only.
pub async fn all(State(state): State<ServerState>) -> StatusCode {
    info!("Hello to all!");
    for name in HELLO_NAMES {
        let url = format!("{}/hello?name={name}", state.self_base_url);
        if let Err(e) = state.http.get(&url).send().await.and_then(|r| r.error_for_status()) {
            warn!(error = %e, %name, "hello call failed");
        }
    }
    StatusCode::OK
}
