// Copyright (C) 2025 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![deny(missing_debug_implementations)]
#![deny(missing_docs)]

//! # turn-auth-types
//!
//! `turn-auth-types` provides the credential primitives shared between a TURN server and the
//! application server handing out TURN credentials:
//! 1. The long-term credential key derivation used by STUN/TURN message integrity.
//! 2. Parsing (and minting) of self-describing, expiring token usernames.
//! 3. The secret-keyed password that accompanies a token username.
//!
//! This is based on the following standards:
//! - [RFC5389]
//! - [RFC5766]
//!
//! [RFC5389]: https://tools.ietf.org/html/rfc5389#section-15.4
//! [RFC5766]: https://tools.ietf.org/html/rfc5766

pub use stun_types as stun;
use stun_types::message::LongTermCredentials;

pub mod key;
pub mod password;
pub mod token;

pub use key::{derive_key, LongTermKey};
pub use password::generate_auth_password;
pub use token::{parse_username, DynamicToken, ParsedToken, TokenError};

/// Credentials used for a TURN user.
#[derive(Clone, PartialEq, Eq)]
pub struct TurnCredentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for TurnCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl TurnCredentials {
    /// Transform these credentials into some `LongTermCredentials` for use in a STUN context.
    pub fn into_long_term_credentials(self, realm: &str) -> LongTermCredentials {
        LongTermCredentials::new(self.username, self.password, realm.to_string())
    }

    /// The [`LongTermKey`] a TURN server and client derive from these credentials in `realm`.
    ///
    /// # Examples
    /// ```
    /// # use turn_auth_types::{derive_key, TurnCredentials};
    /// let credentials = TurnCredentials::new("user", "pass");
    /// assert_eq!(credentials.long_term_key("realm"), derive_key("user", "realm", "pass"));
    /// ```
    pub fn long_term_key(&self, realm: &str) -> LongTermKey {
        derive_key(&self.username, realm, &self.password)
    }

    /// Construct a new set of [`TurnCredentials`]
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }

    /// The username of the credentials.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password of the credentials.
    pub fn password(&self) -> &str {
        &self.password
    }
}
