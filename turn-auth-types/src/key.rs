// Copyright (C) 2025 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Long-term credential key derivation.
//!
//! Reference: [RFC5389 Section 15.4](https://datatracker.ietf.org/doc/html/rfc5389#section-15.4).

use stun_types::message::LongTermCredentials;

/// The length in bytes of a [`LongTermKey`].
pub const LONG_TERM_KEY_LEN: usize = 16;

/// The key a TURN server and client both compute from a username, realm and password.
///
/// The key is used as the HMAC key for the MESSAGE-INTEGRITY attribute and never leaves the
/// process, so its [`Debug`](std::fmt::Debug) implementation does not print the key material.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LongTermKey([u8; LONG_TERM_KEY_LEN]);

impl LongTermKey {
    /// The raw bytes of this key.
    pub fn as_bytes(&self) -> &[u8; LONG_TERM_KEY_LEN] {
        &self.0
    }

    /// The key as a lowercase hexadecimal string.
    ///
    /// # Examples
    /// ```
    /// # use turn_auth_types::derive_key;
    /// let key = derive_key("user", "realm", "pass");
    /// assert_eq!(key.to_hex(), "8493fbc53ba582fb4c044c456bdc40eb");
    /// ```
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for LongTermKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<LongTermKey> for Vec<u8> {
    fn from(key: LongTermKey) -> Self {
        key.0.to_vec()
    }
}

impl From<&LongTermCredentials> for LongTermKey {
    fn from(credentials: &LongTermCredentials) -> Self {
        derive_key(
            credentials.username(),
            credentials.realm(),
            credentials.password(),
        )
    }
}

impl std::fmt::Debug for LongTermKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LongTermKey(..)")
    }
}

/// Derive the long-term credential key: `MD5(username ":" realm ":" password)`.
///
/// The digest is fixed by the STUN/TURN specifications as every conforming client computes the
/// same value independently.
///
/// # Examples
/// ```
/// # use turn_auth_types::derive_key;
/// let key = derive_key("user", "realm", "pass");
/// assert_eq!(key, derive_key("user", "realm", "pass"));
/// assert_ne!(key, derive_key("user", "other-realm", "pass"));
/// ```
pub fn derive_key(username: &str, realm: &str, password: &str) -> LongTermKey {
    let mut context = md5::Context::new();
    context.consume(username.as_bytes());
    context.consume(b":");
    context.consume(realm.as_bytes());
    context.consume(b":");
    context.consume(password.as_bytes());
    LongTermKey(context.compute().0)
}
