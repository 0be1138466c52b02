use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::ProviderError;

/// Send a provider request and decode the JSON body. Only 2xx responses are
/// decoded; anything else is `ProviderError::Unavailable`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let res = request
        .send()
        .await
        .map_err(|e| ProviderError::Transport {
            provider,
            message: e.to_string(),
        })?;

    let status = res.status();
    if !status.is_success() {
        warn!("{} provider responded with HTTP {}", provider, status.as_u16());
        return Err(ProviderError::Unavailable {
            provider,
            status: status.as_u16(),
        });
    }

    res.json::<T>().await.map_err(|e| ProviderError::Decode {
        provider,
        message: e.to_string(),
    })
}
