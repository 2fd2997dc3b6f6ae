// SPDX-FileCopyrightText: 2025 Matthew Waters <matthew@centricular.com>
//
// SPDX-License-Identifier: MIT OR Apache-2.0
#![no_main]
use std::sync::Once;
use std::time::{Duration, UNIX_EPOCH};

use libfuzzer_sys::fuzz_target;

#[macro_use]
extern crate tracing;
use tracing_subscriber::EnvFilter;

use turn_auth_types::parse_username;

#[derive(arbitrary::Arbitrary, Debug)]
struct UsernameAndTime<'data> {
    username: &'data str,
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

fuzz_target!(|input: UsernameAndTime| {
    debug_init();
    let now = UNIX_EPOCH + Duration::from_secs(input.now.into());
    let token = parse_username(input.username, now);
    debug!("parsed {:?} into {:?}", input.username, token);
    assert!(input.username.ends_with(token.user_id()));
    if token.is_valid() {
        assert!(input.username.len() >= token.user_id().len() + 3);
    } else {
        assert!(!token.is_expired());
    }
});
