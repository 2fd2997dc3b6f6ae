// Copyright (C) 2025 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # turn-auth-server
//!
//! `turn-auth-server` decides, for every request a TURN server needs to authenticate, which
//! long-term credential key to use or whether to reject the request.
//!
//! A decision combines, in order:
//! 1. a static table of `username:password` pairs,
//! 2. expiring token usernames whose password is derived from a shared secret, and
//! 3. an optional HTTP authorization callback consulted for token users.
//!
//! The TURN protocol handling itself is left to a TURN server implementation which calls
//! [`AuthHandler::auth_key`](api::AuthHandler::auth_key).
//!
//! Relevant standards:
//! - [RFC5389]: Session Traversal Utilities for NAT (STUN), Section 10.2 Long-Term Credential
//!   Mechanism.
//! - [RFC5766]: Traversal Using Relays around NAT (TURN).
//!
//! [RFC5389]: https://datatracker.ietf.org/doc/html/rfc5389#section-10.2
//! [RFC5766]: https://datatracker.ietf.org/doc/html/rfc5766

#![deny(missing_debug_implementations)]
#![deny(missing_docs)]

pub mod api;
pub mod callback;
pub mod config;
pub mod manager;
pub mod net;

pub use turn_auth_types as types;
