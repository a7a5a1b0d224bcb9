//! HTTP client for the game provider's wish history API.

use crate::error::{Error, Result};
use crate::model::{BannerType, Wish};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::config::{
    resolve_gacha_endpoint, resolve_identity_endpoint, resolve_lang, resolve_page_size,
};
use super::mapper::from_provider;
use super::types::{ApiResponse, GachaLogData, GachaLogEntry, UserInfoData};
use super::{IdentityResolver, PageFetcher, RemoteIdentity};

/// Provider retcodes meaning the authkey was rejected.
const AUTHKEY_ERROR: i32 = -100;
const AUTHKEY_TIMEOUT: i32 = -101;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider API client.
pub struct MihoyoClient {
    client: reqwest::Client,
    gacha_endpoint: String,
    identity_endpoint: String,
    lang: String,
    page_size: u32,
}

impl MihoyoClient {
    /// Create a client with configuration resolved from env and config file.
    pub fn new() -> Self {
        Self::with_config(None, None, None, None)
    }

    /// Create a client with explicit overrides; `None` falls back to resolution.
    pub fn with_config(
        gacha_endpoint: Option<String>,
        identity_endpoint: Option<String>,
        lang: Option<String>,
        page_size: Option<u32>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            gacha_endpoint: gacha_endpoint.unwrap_or_else(resolve_gacha_endpoint),
            identity_endpoint: identity_endpoint.unwrap_or_else(resolve_identity_endpoint),
            lang: lang.unwrap_or_else(resolve_lang),
            page_size: page_size.unwrap_or_else(resolve_page_size),
        }
    }

    /// Gacha log endpoint in use.
    #[must_use]
    pub fn gacha_endpoint(&self) -> &str {
        &self.gacha_endpoint
    }

    /// Account info endpoint in use.
    #[must_use]
    pub fn identity_endpoint(&self) -> &str {
        &self.identity_endpoint
    }

    /// Item name language in use.
    #[must_use]
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Records requested per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Query parameters for one gacha log page.
    fn gacha_log_query(&self, authkey: &str, banner: BannerType, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("authkey_ver", "1".to_string()),
            ("authkey", authkey.to_string()),
            ("lang", self.lang.clone()),
            ("gacha_type", banner.gacha_type().to_string()),
            ("page", page.to_string()),
            ("size", self.page_size.to_string()),
        ]
    }

    /// Fetch one page of provider-native records.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for page 0, `InvalidCredentials` if the
    /// authkey is rejected, and `UpstreamUnavailable` for anything else.
    pub async fn get_wishes(
        &self,
        authkey: &str,
        banner: BannerType,
        page: u32,
    ) -> Result<Vec<GachaLogEntry>> {
        if page == 0 {
            return Err(Error::InvalidArgument("page numbers start at 1".to_string()));
        }

        let query = self.gacha_log_query(authkey, banner, page);
        let data: GachaLogData = self.get(&self.gacha_endpoint, &query).await?;
        debug!(%banner, page, records = data.list.len(), "Fetched gacha log page");
        Ok(data.list)
    }

    /// Check whether the gacha endpoint answers with a provider envelope.
    pub async fn is_reachable(&self) -> bool {
        let response = match self
            .client
            .get(&self.gacha_endpoint)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(r) => r,
            Err(_) => return false,
        };

        response
            .json::<ApiResponse<serde_json::Value>>()
            .await
            .is_ok()
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamUnavailable(format!("HTTP {status}: {body}")));
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("failed to parse response: {e}")))?;

        unwrap_envelope(envelope)
    }
}

impl Default for MihoyoClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Check the provider retcode and extract the payload.
pub(crate) fn unwrap_envelope<T>(envelope: ApiResponse<T>) -> Result<T> {
    match envelope.retcode {
        0 => envelope
            .data
            .ok_or_else(|| Error::UpstreamUnavailable("response has no data".to_string())),
        AUTHKEY_ERROR | AUTHKEY_TIMEOUT => {
            warn!(retcode = envelope.retcode, "Provider rejected authkey");
            Err(Error::InvalidCredentials(envelope.message))
        }
        retcode => {
            warn!(retcode, message = %envelope.message, "Provider returned an error");
            Err(Error::UpstreamUnavailable(format!(
                "retcode {retcode}: {}",
                envelope.message
            )))
        }
    }
}

impl IdentityResolver for MihoyoClient {
    async fn resolve_identity(&self, authkey: &str) -> Result<RemoteIdentity> {
        let query = [
            ("authkey_ver", "1".to_string()),
            ("authkey", authkey.to_string()),
            ("lang", self.lang.clone()),
        ];
        let data: UserInfoData = self.get(&self.identity_endpoint, &query).await?;

        Ok(RemoteIdentity {
            uid: data.user_id,
            nickname: data.nickname,
        })
    }
}

impl PageFetcher for MihoyoClient {
    async fn fetch_page(&self, authkey: &str, banner: BannerType, page: u32) -> Result<Vec<Wish>> {
        self.get_wishes(authkey, banner, page)
            .await?
            .into_iter()
            .map(|entry| from_provider(entry, banner))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> MihoyoClient {
        MihoyoClient::with_config(
            Some("http://localhost:9/gacha".to_string()),
            Some("http://localhost:9/im".to_string()),
            Some("en-us".to_string()),
            Some(20),
        )
    }

    #[test]
    fn test_custom_config() {
        let client = client();
        assert_eq!(client.gacha_endpoint(), "http://localhost:9/gacha");
        assert_eq!(client.identity_endpoint(), "http://localhost:9/im");
        assert_eq!(client.lang(), "en-us");
        assert_eq!(client.page_size(), 20);
    }

    #[test]
    fn test_gacha_log_query() {
        let query = client().gacha_log_query("KEY", BannerType::WeaponEvent, 3);
        assert!(query.contains(&("gacha_type", "302".to_string())));
        assert!(query.contains(&("page", "3".to_string())));
        assert!(query.contains(&("size", "20".to_string())));
        assert!(query.contains(&("authkey", "KEY".to_string())));
    }

    #[test]
    fn test_unwrap_envelope_retcodes() {
        let ok = ApiResponse {
            retcode: 0,
            message: "OK".to_string(),
            data: Some(5),
        };
        assert_eq!(unwrap_envelope(ok).unwrap(), 5);

        let expired: ApiResponse<i32> = ApiResponse {
            retcode: -101,
            message: "authkey timeout".to_string(),
            data: None,
        };
        assert!(matches!(unwrap_envelope(expired), Err(Error::InvalidCredentials(_))));

        let throttled: ApiResponse<i32> = ApiResponse {
            retcode: -110,
            message: "visit too frequently".to_string(),
            data: None,
        };
        assert!(matches!(unwrap_envelope(throttled), Err(Error::UpstreamUnavailable(_))));

        let empty: ApiResponse<i32> = ApiResponse {
            retcode: 0,
            message: "OK".to_string(),
            data: None,
        };
        assert!(matches!(unwrap_envelope(empty), Err(Error::UpstreamUnavailable(_))));
    }

    #[tokio::test]
    async fn test_page_zero_rejected_without_request() {
        let err = client()
            .get_wishes("KEY", BannerType::Novice, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_upstream_error() {
        let err = client()
            .fetch_page("KEY", BannerType::Novice, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }
}
