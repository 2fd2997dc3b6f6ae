// Copyright (C) 2025 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The authentication decision.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::SystemTime;

use turn_auth_types::{derive_key, generate_auth_password, parse_username, LongTermKey};

use tracing::{debug, error, trace, warn};

use crate::api::{AuthCallback, AuthHandler};
use crate::callback::HttpAuthCallback;
use crate::config::AuthConfig;

/// Decides which long-term credential key a TURN server should use for a request.
///
/// A request is accepted when either:
/// 1. the username is one of the static users, or
/// 2. token usernames are enabled (an auth secret is configured), the username is a valid token
///    that has not expired, and the authorization callback (if any) allows the token's user.
///
/// The [`AuthManager`] is immutable once constructed and can be shared between threads.
pub struct AuthManager {
    realm: String,
    // username -> key mapping.
    users: HashMap<String, LongTermKey>,
    auth_secret: Option<String>,
    callback: Option<Box<dyn AuthCallback>>,
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("realm", &self.realm)
            .field("users", &self.users.keys().collect::<Vec<_>>())
            .field("tokens_enabled", &self.auth_secret.is_some())
            .field("callback", &self.callback)
            .finish()
    }
}

impl AuthManager {
    /// Construct a new [`AuthManager`] from `config`.
    ///
    /// Configuration problems are logged and do not prevent construction: malformed static user
    /// entries are skipped and an unusable callback configuration disables the callback.
    ///
    /// # Examples
    /// ```
    /// # use std::time::SystemTime;
    /// # use turn_auth_server::api::AuthHandler;
    /// # use turn_auth_server::config::AuthConfig;
    /// # use turn_auth_server::manager::AuthManager;
    /// # use turn_auth_server::types::derive_key;
    /// let manager = AuthManager::new(AuthConfig::new("realm").with_users("alice:password"));
    /// let from = "192.0.2.1:4000".parse().unwrap();
    /// let key = manager.auth_key("alice", "realm", from, SystemTime::now());
    /// assert_eq!(key, Some(derive_key("alice", "realm", "password")));
    /// assert!(manager.auth_key("bob", "realm", from, SystemTime::now()).is_none());
    /// ```
    pub fn new(config: AuthConfig) -> Self {
        let callback = match HttpAuthCallback::from_config(&config) {
            Ok(callback) => callback.map(|callback| Box::new(callback) as Box<dyn AuthCallback>),
            Err(e) => {
                error!(
                    "Invalid callback configuration for {:?}, callback disabled: {e}",
                    config.callback_url()
                );
                None
            }
        };
        Self::with_callback(config, callback)
    }

    /// Construct a new [`AuthManager`] from `config` that uses `callback` instead of the
    /// callback described by `config`.
    pub fn with_callback(config: AuthConfig, callback: Option<Box<dyn AuthCallback>>) -> Self {
        let mut users = HashMap::new();
        for user in config.static_users() {
            match user {
                Ok(credentials) => {
                    let key = credentials.long_term_key(config.realm());
                    users.insert(credentials.username().to_string(), key);
                }
                Err(e) => warn!("{e}"),
            }
        }
        debug!(
            "configured {} static users, tokens {}, callback {}",
            users.len(),
            if config.auth_secret().is_some() {
                "enabled"
            } else {
                "disabled"
            },
            if callback.is_some() {
                "enabled"
            } else {
                "disabled"
            },
        );

        Self {
            realm: config.realm().to_string(),
            auth_secret: config.auth_secret().map(ToOwned::to_owned),
            users,
            callback,
        }
    }

    /// The realm used to derive keys.
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Whether `username` is one of the static users.
    pub fn is_static_user(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    /// Whether token usernames are accepted.
    pub fn tokens_enabled(&self) -> bool {
        self.auth_secret.is_some()
    }
}

impl AuthHandler for AuthManager {
    #[tracing::instrument(name = "turn_auth_key", level = "debug", skip(self, now))]
    fn auth_key(
        &self,
        username: &str,
        realm: &str,
        from: SocketAddr,
        now: SystemTime,
    ) -> Option<LongTermKey> {
        if realm != self.realm {
            debug!("Requested realm differs from the configured realm {}", self.realm);
        }

        if let Some(key) = self.users.get(username) {
            trace!("static user");
            return Some(*key);
        }
        debug!("Username not found in the list of users");

        let Some(secret) = self.auth_secret.as_deref() else {
            debug!("Authentication tokens are disabled");
            return None;
        };

        let token = parse_username(username, now);
        if !token.is_valid() {
            debug!("Invalid token username");
            return None;
        }
        if token.is_expired() {
            debug!("Expired token username");
            return None;
        }

        if let Some(callback) = &self.callback {
            if !callback.authorize(token.user_id(), from) {
                debug!(uid = token.user_id(), "Not allowed by the authorization callback");
                return None;
            }
        }

        let password = generate_auth_password(username, secret);
        trace!("generated password for token user {}", token.user_id());
        Some(derive_key(username, &self.realm, &password))
    }
}
