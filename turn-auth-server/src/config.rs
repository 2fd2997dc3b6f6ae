// Copyright (C) 2025 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration of the authentication decision.

use std::time::Duration;

use turn_auth_types::TurnCredentials;

/// The realm used when none is configured.
pub const DEFAULT_REALM: &str = "pion.ly";

/// The default upper bound on a single authorization callback request.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors produced while parsing the static user list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StaticUserError {
    /// The entry does not consist of exactly one username and one password separated by `:`.
    #[error("Could not parse username:password pair: {0:?}")]
    MalformedPair(String),
}

/// Configuration for an [`AuthManager`](crate::manager::AuthManager).
///
/// # Examples
/// ```
/// # use std::time::Duration;
/// # use turn_auth_server::config::AuthConfig;
/// let config = AuthConfig::new("example.com")
///     .with_users("alice:password1, bob:password2")
///     .with_auth_secret("secret")
///     .with_callback_url("https://auth.example.com/turn")
///     .with_callback_timeout(Duration::from_secs(2));
/// assert_eq!(config.realm(), "example.com");
/// assert_eq!(config.auth_secret(), Some("secret"));
/// ```
#[derive(Clone)]
pub struct AuthConfig {
    realm: String,
    users: String,
    auth_secret: Option<String>,
    callback_url: Option<String>,
    callback_authorization: Option<String>,
    callback_timeout: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("realm", &self.realm)
            .field("auth_secret", &self.auth_secret.as_ref().map(|_| ".."))
            .field("callback_url", &self.callback_url)
            .field(
                "callback_authorization",
                &self.callback_authorization.as_ref().map(|_| ".."),
            )
            .field("callback_timeout", &self.callback_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REALM)
    }
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    Some(value.into()).filter(|value| !value.is_empty())
}

impl AuthConfig {
    /// Construct a new [`AuthConfig`] for `realm` without any users, with token usernames
    /// disabled and without an authorization callback.
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            users: String::new(),
            auth_secret: None,
            callback_url: None,
            callback_authorization: None,
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
        }
    }

    /// Set the static users as a comma separated list of `username:password` pairs.
    pub fn with_users(mut self, users: impl Into<String>) -> Self {
        self.users = users.into();
        self
    }

    /// Set the secret shared with the application server issuing token usernames.  An empty
    /// secret disables token usernames.
    pub fn with_auth_secret(mut self, secret: impl Into<String>) -> Self {
        self.auth_secret = non_empty(secret);
        self
    }

    /// Set the URL of the authorization callback.  An empty URL disables the callback.
    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = non_empty(url);
        self
    }

    /// Set the value of the `Authorization` header sent to the authorization callback.
    pub fn with_callback_authorization(mut self, authorization: impl Into<String>) -> Self {
        self.callback_authorization = non_empty(authorization);
        self
    }

    /// Set the maximum duration of a single authorization callback request.
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// The realm used to derive keys.
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// The configured static users string.
    pub fn users(&self) -> &str {
        &self.users
    }

    /// The secret for token usernames, if token usernames are enabled.
    pub fn auth_secret(&self) -> Option<&str> {
        self.auth_secret.as_deref()
    }

    /// The authorization callback URL, if any.
    pub fn callback_url(&self) -> Option<&str> {
        self.callback_url.as_deref()
    }

    /// The `Authorization` header value for the authorization callback, if any.
    pub fn callback_authorization(&self) -> Option<&str> {
        self.callback_authorization.as_deref()
    }

    /// The maximum duration of a single authorization callback request.
    pub fn callback_timeout(&self) -> Duration {
        self.callback_timeout
    }

    /// Parse the static users.  See [`parse_static_users`].
    pub fn static_users(
        &self,
    ) -> impl Iterator<Item = Result<TurnCredentials, StaticUserError>> + '_ {
        parse_static_users(&self.users)
    }
}

/// Parse a comma separated list of `username:password` pairs.
///
/// Whitespace around the username and password is removed.  Each malformed entry produces an
/// error without affecting the other entries.
///
/// # Examples
/// ```
/// # use turn_auth_server::config::{parse_static_users, StaticUserError};
/// let users: Vec<_> = parse_static_users(" alice : pass1 ,bob,carol:pass3").collect();
/// assert_eq!(users.len(), 3);
/// assert_eq!(users[0].as_ref().unwrap().username(), "alice");
/// assert_eq!(users[0].as_ref().unwrap().password(), "pass1");
/// assert_eq!(users[1], Err(StaticUserError::MalformedPair("bob".to_string())));
/// assert_eq!(users[2].as_ref().unwrap().username(), "carol");
/// ```
pub fn parse_static_users(
    users: &str,
) -> impl Iterator<Item = Result<TurnCredentials, StaticUserError>> + '_ {
    users
        .split(',')
        .filter(move |_| !users.trim().is_empty())
        .map(|entry| {
            let mut parts = entry.split(':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(username), Some(password), None) => Ok(TurnCredentials::new(
                    username.trim(),
                    password.trim(),
                )),
                _ => Err(StaticUserError::MalformedPair(entry.to_string())),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(users: &str) -> Vec<Result<(String, String), StaticUserError>> {
        parse_static_users(users)
            .map(|user| {
                user.map(|user| (user.username().to_string(), user.password().to_string()))
            })
            .collect()
    }

    #[test]
    fn empty_users() {
        let _log = crate::tests::test_init_log();
        assert!(pairs("").is_empty());
        assert!(pairs("   ").is_empty());
    }

    #[test]
    fn users_trimmed() {
        let _log = crate::tests::test_init_log();
        assert_eq!(
            pairs("alice:pass1,  bob : pass2 ,carol:\tpass3"),
            vec![
                Ok(("alice".to_string(), "pass1".to_string())),
                Ok(("bob".to_string(), "pass2".to_string())),
                Ok(("carol".to_string(), "pass3".to_string())),
            ]
        );
    }

    #[test]
    fn malformed_users_skipped() {
        let _log = crate::tests::test_init_log();
        assert_eq!(
            pairs("alice,bob:pass:word,carol:pass3,"),
            vec![
                Err(StaticUserError::MalformedPair("alice".to_string())),
                Err(StaticUserError::MalformedPair("bob:pass:word".to_string())),
                Ok(("carol".to_string(), "pass3".to_string())),
                Err(StaticUserError::MalformedPair(String::new())),
            ]
        );
    }

    #[test]
    fn users_case_preserved() {
        let _log = crate::tests::test_init_log();
        assert_eq!(
            pairs("Alice:Pass"),
            vec![Ok(("Alice".to_string(), "Pass".to_string()))]
        );
    }

    #[test]
    fn empty_values_disable() {
        let _log = crate::tests::test_init_log();
        let config = AuthConfig::new("realm")
            .with_auth_secret("")
            .with_callback_url("")
            .with_callback_authorization("");
        assert_eq!(config.auth_secret(), None);
        assert_eq!(config.callback_url(), None);
        assert_eq!(config.callback_authorization(), None);
        assert_eq!(config.callback_timeout(), DEFAULT_CALLBACK_TIMEOUT);
    }

    #[test]
    fn debug_hides_secrets() {
        let _log = crate::tests::test_init_log();
        let config = AuthConfig::default()
            .with_users("alice:hunter2")
            .with_auth_secret("top-secret")
            .with_callback_authorization("Bearer abcdef");
        assert_eq!(config.realm(), DEFAULT_REALM);
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("top-secret"));
        assert!(!debug.contains("abcdef"));
    }
}
