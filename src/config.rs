//! Startup configuration.
//!
//! The storefront needs the backend URL and its publishable key; both are
//! required and their absence is fatal. A user access token, the discount
//! policy and the cart directory are optional.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::{Result, WholesaleError};
use crate::pricing::DiscountPolicy;

/// Backend base URL.
pub const URL_VAR: &str = "SUPABASE_URL";
/// Publishable (anonymous) API key.
pub const PUBLISHABLE_KEY_VAR: &str = "SUPABASE_PUBLISHABLE_KEY";
/// Signed-in user's access token.
pub const ACCESS_TOKEN_VAR: &str = "WHOLESALE_ACCESS_TOKEN";
/// Discount policy name (`threshold`, `ten-by-ten` or `none`).
pub const DISCOUNT_POLICY_VAR: &str = "WHOLESALE_DISCOUNT_POLICY";
/// Directory holding the persisted cart.
pub const DATA_DIR_VAR: &str = "WHOLESALE_DATA_DIR";

/// Resolved startup configuration.
#[derive(Debug)]
pub struct Config {
    /// Backend base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Publishable API key sent as `apikey` on every request.
    pub publishable_key: SecretString,
    /// Access token of the signed-in user, if any.
    pub access_token: Option<SecretString>,
    /// Cart discount policy.
    pub discount_policy: DiscountPolicy,
    /// Cart directory override.
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`WholesaleError::MissingConfig`] if the backend URL or the
    /// publishable key is unset, and [`WholesaleError::InvalidConfig`] if a
    /// value cannot be parsed.
    #[inline]
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary lookup function.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    #[inline]
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let raw_url = read(URL_VAR).ok_or(WholesaleError::MissingConfig(URL_VAR))?;
        let url = raw_url.trim_end_matches('/').to_owned();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(WholesaleError::InvalidConfig {
                name: URL_VAR,
                reason: format!("`{url}` is not an http(s) URL"),
            });
        }
        let publishable_key = read(PUBLISHABLE_KEY_VAR)
            .map(SecretString::from)
            .ok_or(WholesaleError::MissingConfig(PUBLISHABLE_KEY_VAR))?;
        let access_token = read(ACCESS_TOKEN_VAR).map(SecretString::from);
        let discount_policy = read(DISCOUNT_POLICY_VAR)
            .map(|raw| raw.parse::<DiscountPolicy>())
            .transpose()
            .map_err(|reason| WholesaleError::InvalidConfig {
                name: DISCOUNT_POLICY_VAR,
                reason,
            })?
            .unwrap_or_default();
        let data_dir = read(DATA_DIR_VAR).map(PathBuf::from);

        tracing::debug!(
            url = %url,
            has_access_token = access_token.is_some(),
            discount_policy = ?discount_policy,
            "configuration loaded"
        );

        Ok(Self {
            url,
            publishable_key,
            access_token,
            discount_policy,
            data_dir,
        })
    }
}
