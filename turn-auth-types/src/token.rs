// Copyright (C) 2025 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Token usernames.
//!
//! A token username is a self-describing username of the form
//!
//! ```text
//! turn/<nonce>/<expiry-unix-seconds>/<user-id>
//! ```
//!
//! where `<user-id>` may itself contain `/`.  The password for a token username is computed with
//! [`generate_auth_password`](crate::generate_auth_password), so a TURN server can validate a
//! token without keeping any per-token state.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use tracing::trace;

use crate::password::generate_auth_password;
use crate::TurnCredentials;

/// The literal (compared case-insensitively) that starts a token username.
pub const TOKEN_PREFIX: &str = "turn";

const TOKEN_SEPARATOR: char = '/';
const TOKEN_FIELDS: usize = 4;
const NONCE_LEN: usize = 16;

/// Errors that can be produced when constructing a [`DynamicToken`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The nonce is empty or contains the field separator.
    #[error("Invalid token nonce {0:?}")]
    InvalidNonce(String),
    /// The expiry cannot be represented.
    #[error("Token expiry out of range")]
    ExpiryOutOfRange,
}

/// The result of [`parse_username`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedToken<'a> {
    valid: bool,
    expired: bool,
    user_id: &'a str,
}

impl<'a> ParsedToken<'a> {
    /// Whether the username is a well formed token username.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether the expiry of the token has passed.  Only meaningful when
    /// [`is_valid`](Self::is_valid) returns `true`.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// The user identifier contained in the token.
    ///
    /// This is also filled in for malformed tokens for diagnostic purposes and must not be
    /// treated as authenticated.
    pub fn user_id(&self) -> &'a str {
        self.user_id
    }
}

/// Convert `time` into whole seconds since the Unix epoch, saturating at the bounds of `i64`.
pub fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => i64::try_from(since.as_secs()).unwrap_or(i64::MAX),
        Err(before) => 0i64.saturating_sub_unsigned(before.duration().as_secs()),
    }
}

/// Parse a token username at the time `now`.
///
/// A token is expired when `now` is strictly after the embedded expiry; a token is still valid
/// during the expiry second itself.
///
/// # Examples
/// ```
/// # use std::time::{Duration, UNIX_EPOCH};
/// # use turn_auth_types::parse_username;
/// let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
/// let token = parse_username("turn/nonce/9999999999/user/1", now);
/// assert!(token.is_valid());
/// assert!(!token.is_expired());
/// assert_eq!(token.user_id(), "user/1");
///
/// let token = parse_username("alice", now);
/// assert!(!token.is_valid());
/// ```
pub fn parse_username(username: &str, now: SystemTime) -> ParsedToken<'_> {
    let mut fields = username.splitn(TOKEN_FIELDS, TOKEN_SEPARATOR);
    let (Some(prefix), Some(_nonce), Some(expiry), Some(user_id)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        trace!("username has too few fields for a token");
        return ParsedToken {
            valid: false,
            expired: false,
            user_id: "",
        };
    };

    let invalid = ParsedToken {
        valid: false,
        expired: false,
        user_id,
    };

    if !prefix.eq_ignore_ascii_case(TOKEN_PREFIX) {
        trace!("username prefix {prefix:?} is not a token prefix");
        return invalid;
    }

    let Ok(expiry) = expiry.parse::<i64>() else {
        trace!("token expiry {expiry:?} is not a number");
        return invalid;
    };

    ParsedToken {
        valid: true,
        expired: unix_seconds(now) > expiry,
        user_id,
    }
}

/// A token username as issued by an application server.
///
/// # Examples
/// ```
/// # use std::time::{Duration, SystemTime};
/// # use turn_auth_types::{generate_auth_password, parse_username, DynamicToken};
/// let now = SystemTime::now();
/// let token = DynamicToken::new("user-1", now + Duration::from_secs(3600));
/// let credentials = token.credentials("secret");
/// assert_eq!(credentials.username(), token.username());
/// assert_eq!(
///     credentials.password(),
///     generate_auth_password(credentials.username(), "secret")
/// );
///
/// let parsed = parse_username(credentials.username(), now);
/// assert!(parsed.is_valid() && !parsed.is_expired());
/// assert_eq!(parsed.user_id(), "user-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicToken {
    nonce: String,
    expires_at: i64,
    user_id: String,
}

impl DynamicToken {
    /// Construct a new [`DynamicToken`] for `user_id` valid for `ttl` after `now`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::ExpiryOutOfRange`] if `now + ttl` cannot be represented.
    pub fn expiring_in(
        user_id: impl Into<String>,
        now: SystemTime,
        ttl: Duration,
    ) -> Result<Self, TokenError> {
        let expires_at = now.checked_add(ttl).ok_or(TokenError::ExpiryOutOfRange)?;
        Ok(Self::new(user_id, expires_at))
    }

    /// Construct a new [`DynamicToken`] for `user_id` with a random nonce.
    pub fn new(user_id: impl Into<String>, expires_at: SystemTime) -> Self {
        Self {
            nonce: Self::generate_nonce(),
            expires_at: unix_seconds(expires_at),
            user_id: user_id.into(),
        }
    }

    fn generate_nonce() -> String {
        let mut rng = rand::rng();
        String::from_iter((0..NONCE_LEN).map(|_| rng.sample(rand::distr::Alphanumeric) as char))
    }

    /// Replace the random nonce with `nonce`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InvalidNonce`] if `nonce` is empty or contains a `/`.
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Result<Self, TokenError> {
        let nonce = nonce.into();
        if nonce.is_empty() || nonce.contains(TOKEN_SEPARATOR) {
            return Err(TokenError::InvalidNonce(nonce));
        }
        self.nonce = nonce;
        Ok(self)
    }

    /// The nonce of this token.
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// The expiry of this token in seconds since the Unix epoch.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// The user identifier of this token.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The username a client should present to the TURN server.
    pub fn username(&self) -> String {
        self.to_string()
    }

    /// The username and password a client should present to the TURN server when `secret` is
    /// shared with the TURN server.
    pub fn credentials(&self, secret: &str) -> TurnCredentials {
        let username = self.username();
        let password = generate_auth_password(&username, secret);
        TurnCredentials::new(&username, &password)
    }
}

impl std::fmt::Display for DynamicToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{TOKEN_PREFIX}{TOKEN_SEPARATOR}{}{TOKEN_SEPARATOR}{}{TOKEN_SEPARATOR}{}",
            self.nonce, self.expires_at, self.user_id
        )
    }
}
