//! Ambient credentials.
//!
//! The services authenticate with a pre-issued OAuth bearer token supplied
//! by the environment. No token is fine: emulators and test servers take
//! no credentials.

use std::env;

pub const ACCESS_TOKEN_ENV: &str = "GCP_ACCESS_TOKEN";

pub fn bearer_token() -> Option<String> {
    env::var(ACCESS_TOKEN_ENV).ok().filter(|t| !t.trim().is_empty())
}

/// Attach the bearer token to a request when one is configured.
pub(crate) fn authorize(
    req: reqwest::RequestBuilder,
    token: &Option<String>,
) -> reqwest::RequestBuilder {
    match token {
        Some(token) => req.bearer_auth(token),
        None => req,
    }
}
