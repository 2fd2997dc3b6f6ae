// Copyright (C) 2025 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Password generation for token usernames.

use sha2::{Digest, Sha256};

/// The length of a password returned by [`generate_auth_password`].
pub const AUTH_PASSWORD_LEN: usize = 64;

/// Generate the password that belongs to a token `username`.
///
/// The password is the lowercase hex encoding of `SHA-256(username || secret)`, where `secret` is
/// shared between the TURN server and the application server that issued the username.  Both
/// sides can therefore compute the same long-term key without sharing any session state.
///
/// # Examples
/// ```
/// # use turn_auth_types::generate_auth_password;
/// let password = generate_auth_password("turn/abc/9999999999/user-1", "secret");
/// assert_eq!(
///     password,
///     "062034b4dbe02ae159b4e5f764e31b23e30d9248e5df2557c179a5cbd39c24a3"
/// );
/// ```
pub fn generate_auth_password(username: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_lower_hex(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    #[test]
    fn deterministic() {
        let _log = crate::tests::test_init_log();
        for (username, secret) in [
            ("turn/n/1/u", "s"),
            ("alice", ""),
            ("", "secret"),
            ("turn/nonce/9999999999/a/b/c", "another secret"),
        ] {
            let first = generate_auth_password(username, secret);
            let second = generate_auth_password(username, secret);
            assert_eq!(first, second);
            assert_eq!(first.len(), AUTH_PASSWORD_LEN);
            assert!(is_lower_hex(&first), "{first}");
        }
    }

    #[test]
    fn empty_input() {
        let _log = crate::tests::test_init_log();
        assert_eq!(
            generate_auth_password("", ""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn concatenated_without_separator() {
        let _log = crate::tests::test_init_log();
        assert_eq!(
            generate_auth_password("turn/abc/9999999999/user-1", "secret"),
            generate_auth_password("turn/abc/9999999999/user-1secret", "")
        );
        assert_ne!(
            generate_auth_password("user", "secret"),
            generate_auth_password("user", "secret2")
        );
    }
}
