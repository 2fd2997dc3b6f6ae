// Copyright (C) 2025 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Check and mint TURN credentials with the same configuration a TURN server uses.
//!
//! ## Example
//!
//! ```sh
//! # issue a token username and password valid for one hour
//! $ AUTH_SECRET=secret turn-auth mint user-1 --ttl 3600
//! username: turn/4fG1k2l8aZ0qPq1x/1700003600/user-1
//! password: 5d1c...
//!
//! # ask the authentication decision for the key of that username
//! $ AUTH_SECRET=secret REALM=example.com turn-auth check turn/4fG1k2l8aZ0qPq1x/1700003600/user-1
//! accepted 0c5a...
//!
//! # the public address relayed allocations would be advertised on
//! $ turn-auth relay-address
//! 203.0.113.5
//! ```

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::{Duration, SystemTime};

use clap::{Args, Parser, Subcommand};

use turn_auth_server::api::AuthHandler;
use turn_auth_server::config::{AuthConfig, DEFAULT_REALM};
use turn_auth_server::manager::AuthManager;
use turn_auth_server::net::{resolve_relay_address, NetError};
use turn_auth_server::types::{DynamicToken, LongTermKey, TokenError};

use tracing::info;

fn init_logs() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Layer;

    let level_filter = std::env::var("TURN_LOG")
        .ok()
        .and_then(|var| var.parse::<tracing_subscriber::filter::Targets>().ok())
        .unwrap_or(tracing_subscriber::filter::Targets::new().with_default(tracing::Level::ERROR));
    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_level(true)
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(level_filter),
    );
    if let Err(e) = tracing::subscriber::set_global_default(registry) {
        eprintln!("Failed to install logging: {e}");
    }
}

#[derive(Args, Debug)]
struct AuthArgs {
    #[arg(long, env = "REALM", default_value = DEFAULT_REALM, help = "The TURN realm")]
    realm: String,
    #[arg(
        long,
        env = "USERS",
        default_value = "",
        hide_env_values = true,
        help = "Comma separated list of username:password pairs"
    )]
    users: String,
    #[arg(
        long,
        env = "AUTH_SECRET",
        default_value = "",
        hide_env_values = true,
        help = "Secret shared with the application server issuing token usernames"
    )]
    auth_secret: String,
    #[arg(
        long,
        env = "AUTH_CALLBACK_URL",
        default_value = "",
        help = "URL asked to authorize token users"
    )]
    callback_url: String,
    #[arg(
        long,
        env = "AUTH_CALLBACK_AUTHORIZATION",
        default_value = "",
        hide_env_values = true,
        help = "Authorization header value sent to the callback URL"
    )]
    callback_authorization: String,
    #[arg(
        long,
        env = "AUTH_CALLBACK_TIMEOUT_SECONDS",
        default_value = "5",
        help = "Timeout in seconds of a callback request"
    )]
    callback_timeout: u64,
}

impl AuthArgs {
    fn config(&self) -> AuthConfig {
        AuthConfig::new(self.realm.as_str())
            .with_users(self.users.as_str())
            .with_auth_secret(self.auth_secret.as_str())
            .with_callback_url(self.callback_url.as_str())
            .with_callback_authorization(self.callback_authorization.as_str())
            .with_callback_timeout(Duration::from_secs(self.callback_timeout))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide whether a username is accepted and print the resulting key.
    Check {
        #[command(flatten)]
        auth: AuthArgs,
        #[arg(help = "The username a client presents")]
        username: String,
        #[arg(
            long,
            default_value = "127.0.0.1:0",
            help = "The address the client connects from"
        )]
        source: SocketAddr,
    },
    /// Issue a token username and its password.
    Mint {
        #[arg(help = "The user identifier to embed in the token")]
        user_id: String,
        #[arg(long, default_value = "86400", help = "Lifetime of the token in seconds")]
        ttl: u64,
        #[arg(long, help = "Use this nonce instead of a random one")]
        nonce: Option<String>,
        #[arg(
            long,
            env = "AUTH_SECRET",
            hide_env_values = true,
            help = "Secret shared with the TURN server"
        )]
        secret: String,
    },
    /// Print the public address relayed allocations are advertised on.
    RelayAddress {
        #[arg(long, env = "PUBLIC_IP", help = "Use this address instead of detecting one")]
        public_ip: Option<String>,
    },
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn decision(key: Option<&LongTermKey>) -> String {
    match key {
        Some(key) => format!("accepted {}", key.to_hex()),
        None => "rejected".to_string(),
    }
}

fn check(auth: &AuthArgs, username: &str, source: SocketAddr) -> ExitCode {
    let manager = AuthManager::new(auth.config());
    info!("checking {username} from {source} with {manager:?}");
    let key = manager.auth_key(username, manager.realm(), source, SystemTime::now());
    println!("{}", decision(key.as_ref()));
    match key {
        Some(_) => ExitCode::SUCCESS,
        None => ExitCode::FAILURE,
    }
}

fn relay_address(public_ip: Option<&str>) -> Result<String, String> {
    match resolve_relay_address(public_ip) {
        Ok(ip) => Ok(ip.to_string()),
        Err(NetError::NoPublicAddress) => Err(
            "Could not detect a public IP - Please set the PUBLIC_IP environment variable"
                .to_string(),
        ),
        Err(e) => Err(e.to_string()),
    }
}

fn mint(
    user_id: String,
    ttl: Duration,
    nonce: Option<String>,
) -> Result<DynamicToken, TokenError> {
    let token = DynamicToken::expiring_in(user_id, SystemTime::now(), ttl)?;
    let token = match nonce {
        Some(nonce) => token.with_nonce(nonce)?,
        None => token,
    };
    info!(
        "minted token for {} expiring at {}",
        token.user_id(),
        token.expires_at()
    );
    Ok(token)
}

fn main() -> ExitCode {
    init_logs();

    let cli = Cli::parse();

    match cli.command {
        Command::Check {
            auth,
            username,
            source,
        } => check(&auth, &username, source),
        Command::Mint {
            user_id,
            ttl,
            nonce,
            secret,
        } => {
            if secret.is_empty() {
                eprintln!("A non-empty secret is required (--secret or AUTH_SECRET)");
                return ExitCode::FAILURE;
            }
            match mint(user_id, Duration::from_secs(ttl), nonce) {
                Ok(token) => {
                    let credentials = token.credentials(&secret);
                    println!("username: {}", credentials.username());
                    println!("password: {}", credentials.password());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
        Command::RelayAddress { public_ip } => match relay_address(public_ip.as_deref()) {
            Ok(ip) => {
                println!("{ip}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        },
    }
}
