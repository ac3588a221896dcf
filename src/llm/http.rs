//! Shared HTTP plumbing for provider adapters.

use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::config::http_timeout;
use crate::error::ProviderError;
use crate::llm::message::ProviderResponse;

/// Error bodies longer than this are cut before being put in an error.
const MAX_ERROR_BODY_CHARS: usize = 2000;

/// Build a client with the configured round-trip timeout.
pub fn build_client() -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(http_timeout())
        .build()
        .map_err(ProviderError::ClientBuild)
}

/// Send one request and decode the body.
///
/// Transport failures and non-2xx statuses are errors. A 2xx body that is not
/// JSON is kept as text (see [`ProviderResponse::from_body_text`]).
pub async fn send_request(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<ProviderResponse, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|source| ProviderError::Transport { provider, source })?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|source| ProviderError::Transport { provider, source })?;

    if !status.is_success() {
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
            body: truncate(&text),
        });
    }

    debug!("{} responded with {} bytes", provider, text.len());
    Ok(ProviderResponse::from_body_text(&text))
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    cut.push_str("...");
    cut
}

/// Join a base URL and a path without doubling the slash.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
