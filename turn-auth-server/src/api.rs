// Copyright (C) 2025 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! API between a TURN server and the authentication decision.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;

use turn_auth_types::LongTermKey;

/// Produces the long-term credential key for requests received by a TURN server.
///
/// Implementations must be callable concurrently from any number of request handlers.
pub trait AuthHandler: Send + Sync + std::fmt::Debug {
    /// The key to validate (and sign responses to) a request from `from` using `username` in
    /// `realm` at the time `now`, or `None` if the request must be rejected.
    ///
    /// A rejection is final for this request; the TURN server decides whether the client is
    /// asked to authenticate again.
    fn auth_key(
        &self,
        username: &str,
        realm: &str,
        from: SocketAddr,
        now: SystemTime,
    ) -> Option<LongTermKey>;
}

impl<T: AuthHandler + ?Sized> AuthHandler for Arc<T> {
    fn auth_key(
        &self,
        username: &str,
        realm: &str,
        from: SocketAddr,
        now: SystemTime,
    ) -> Option<LongTermKey> {
        (**self).auth_key(username, realm, from, now)
    }
}

/// An external authorization check for users of token usernames.
pub trait AuthCallback: Send + Sync + std::fmt::Debug {
    /// Whether `user_id` connecting from `from` is allowed to use the TURN server.
    ///
    /// Any failure to reach a decision must return `false`.
    fn authorize(&self, user_id: &str, from: SocketAddr) -> bool;
}

impl<T: AuthCallback + ?Sized> AuthCallback for Arc<T> {
    fn authorize(&self, user_id: &str, from: SocketAddr) -> bool {
        (**self).authorize(user_id, from)
    }
}
