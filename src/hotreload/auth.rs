//! Capability check for the update trigger.
//!
//! The only credential is the last path segment of `DEPLOY_URL`, generated by
//! `hostship setup`. A request is authorised when it is `POST /update/<key>`
//! and `<key>` equals that segment exactly. Checks run in a fixed order so
//! that callers without a key learn nothing about the server configuration:
//!
//! 1. path shape: `update/<key>` or 404 / 401
//! 2. stored URL: present, parsable and itself shaped `update/<key>`, or 500
//! 3. key equality, or 403

use reqwest::Url;

use crate::config::ConfigSource;
use crate::constants::{DEPLOY_URL_KEY, UPDATE_ROUTE};
use crate::core::HostshipError;
use crate::utils::redact;

/// Extract the presented key from a request path.
///
/// Leading and trailing slashes are ignored, so `/update/`, `/update` and
/// `update` are all a missing key.
pub fn presented_key(path: &str) -> Result<&str, HostshipError> {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match segments.as_slice() {
        [route, key] if *route == UPDATE_ROUTE && !key.is_empty() => Ok(*key),
        [route] if *route == UPDATE_ROUTE => Err(HostshipError::MissingKey),
        _ => Err(HostshipError::UnknownEndpoint),
    }
}

/// The key embedded in the stored `DEPLOY_URL`.
pub fn expected_key(config: &dyn ConfigSource) -> Result<String, HostshipError> {
    let raw = config
        .get(DEPLOY_URL_KEY)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HostshipError::DeployUrl {
            reason: format!("{DEPLOY_URL_KEY} not set"),
        })?;

    let url = Url::parse(&raw).map_err(|e| HostshipError::DeployUrl {
        reason: e.to_string(),
    })?;

    presented_key(url.path()).map(str::to_string).map_err(|_| HostshipError::DeployUrl {
        reason: format!("expected path /{UPDATE_ROUTE}/<key>, got {}", redact(url.path())),
    })
}

/// Authorise a request path. Returns the (verified) key.
pub fn authorize<'a>(path: &'a str, config: &dyn ConfigSource) -> Result<&'a str, HostshipError> {
    let presented = presented_key(path)?;
    let expected = expected_key(config)?;
    if presented != expected {
        return Err(HostshipError::InvalidKey);
    }
    Ok(presented)
}
