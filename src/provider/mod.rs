//! Wish history provider.
//!
//! The importer consumes the provider through two narrow traits:
//! - [`IdentityResolver`] - turn an authkey into the remote account it belongs to
//! - [`PageFetcher`] - fetch one page of a banner's history, already mapped to [`Wish`]
//!
//! [`MihoyoClient`] implements both over HTTP.
//!
//! # Configuration
//!
//! Settings are loaded from `~/.wishsync/config.json`. Environment variables
//! take precedence:
//! - `WISHSYNC_GACHA_ENDPOINT` - gacha log endpoint
//! - `WISHSYNC_IDENTITY_ENDPOINT` - account info endpoint
//! - `WISHSYNC_LANG` - language for item names (default: `en-us`); for an
//!   import it also beats the user's preferred language
//! - `WISHSYNC_PAGE_SIZE` - records per page (default: `20`)

pub mod config;
pub mod mapper;
pub mod mihoyo;
pub mod types;

pub use config::{
    get_provider_settings, resolve_gacha_endpoint, resolve_identity_endpoint, resolve_lang,
    resolve_lang_for, resolve_page_size, save_provider_settings,
};
pub use mihoyo::MihoyoClient;
pub use types::{ProviderSettings, WishsyncConfig};

use crate::error::Result;
use crate::model::{BannerType, Wish};
use serde::{Deserialize, Serialize};

/// The provider account an authkey was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIdentity {
    /// Provider account uid
    pub uid: String,
    /// Display name, when the provider reports one
    pub nickname: Option<String>,
}

/// Resolves credentials to a provider identity.
pub trait IdentityResolver: Send + Sync {
    /// Look up the account the authkey belongs to.
    ///
    /// Fails with `InvalidCredentials` when the provider rejects the key and
    /// `UpstreamUnavailable` on transport or provider errors.
    fn resolve_identity(
        &self,
        authkey: &str,
    ) -> impl std::future::Future<Output = Result<RemoteIdentity>> + Send;
}

/// Fetches pages of a banner's wish history.
///
/// Pages are 1-indexed and ordered newest-first. An empty page is the only
/// end-of-history signal; a short page is not. Errors are not retried.
pub trait PageFetcher: Send + Sync {
    /// Fetch one page, translated into [`Wish`] records without an owner.
    fn fetch_page(
        &self,
        authkey: &str,
        banner: BannerType,
        page: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Wish>>> + Send;
}
