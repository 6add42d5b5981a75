//! HTTP implementations of the collaborator traits.

mod bridge;
mod home_assistant;
mod npm;
mod ntfy;

pub use bridge::BridgeClient;
pub use home_assistant::HomeAssistantClient;
pub use npm::{DEFAULT_NPM_REGISTRY, NpmRegistryClient};
pub use ntfy::{DEFAULT_NTFY_SERVER, NtfyNotifier};

use homewatch_traits::{CollaboratorError, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("Homewatch/", env!("CARGO_PKG_VERSION"));

fn http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
}

fn parse_base_url(base: &str) -> Result<Url> {
    Url::parse(base).map_err(|e| CollaboratorError::Other(format!("Invalid URL '{}': {}", base, e)))
}

/// `base` with `segments` appended, each one percent-encoded.
///
/// Package names such as `@scope/name` stay a single segment.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| CollaboratorError::Other(format!("URL '{}' cannot be a base", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn with_bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) if !token.is_empty() => request.bearer_auth(token),
        _ => request,
    }
}

/// Send and turn non-success statuses into `CollaboratorError::Http`.
async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| CollaboratorError::Network(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(CollaboratorError::Http {
        status: status.as_u16(),
        message: if message.is_empty() {
            status.to_string()
        } else {
            message
        },
    })
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    send(request)
        .await?
        .json::<T>()
        .await
        .map_err(|e| CollaboratorError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let base = parse_base_url("http://host:8080/api/").unwrap();
        let url = endpoint(&base, &["plugins", "@scrypted/nvr", "restart"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://host:8080/api/plugins/@scrypted%2Fnvr/restart"
        );
    }

    #[test]
    fn test_endpoint_without_trailing_slash() {
        let base = parse_base_url("http://host").unwrap();
        let url = endpoint(&base, &["api", "states"]).unwrap();
        assert_eq!(url.as_str(), "http://host/api/states");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(CollaboratorError::Other(_))
        ));
    }
}
