// SPDX-FileCopyrightText: 2025 Matthew Waters <matthew@centricular.com>
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![no_main]
use std::net::SocketAddr;
use std::sync::{Once, OnceLock};
use std::time::{Duration, UNIX_EPOCH};

use libfuzzer_sys::fuzz_target;

#[macro_use]
extern crate tracing;
use tracing_subscriber::EnvFilter;

use turn_auth_server::api::AuthHandler;
use turn_auth_server::config::AuthConfig;
use turn_auth_server::manager::AuthManager;
use turn_auth_types::{derive_key, generate_auth_password, parse_username};

#[derive(arbitrary::Arbitrary, Debug)]
struct Request<'data> {
    username: &'data str,
    realm: &'data str,
    from: SocketAddr,
    now: u32,
}

pub fn debug_init() {
    static TRACING: Once = Once::new();

    TRACING.call_once(|| {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    });
}

fn manager() -> &'static AuthManager {
    static MANAGER: OnceLock<AuthManager> = OnceLock::new();
    MANAGER.get_or_init(|| {
        AuthManager::new(
            AuthConfig::new("realm")
                .with_users("alice:password")
                .with_auth_secret("secret"),
        )
    })
}

fuzz_target!(|request: Request| {
    debug_init();
    let now = UNIX_EPOCH + Duration::from_secs(request.now.into());
    let key = manager().auth_key(request.username, request.realm, request.from, now);
    debug!("{request:?} resulted in {key:?}");
    if request.username == "alice" {
        assert_eq!(key, Some(derive_key("alice", "realm", "password")));
        return;
    }
    let token = parse_username(request.username, now);
    if token.is_valid() && !token.is_expired() {
        let password = generate_auth_password(request.username, "secret");
        assert_eq!(key, Some(derive_key(request.username, "realm", &password)));
    } else {
        assert_eq!(key, None);
    }
});
