// Copyright (C) 2025 Matthew Waters <matthew@centricular.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! HTTP authorization callback.
//!
//! For every request using a token username, an HTTP `GET` request is sent to the configured
//! URL with the `uid` and `ip` query parameters added.  Only a `200 OK` response allows the
//! request.

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use url::Url;

use tracing::{debug, error};

use crate::api::AuthCallback;
use crate::config::AuthConfig;

const USER_ID_PARAM: &str = "uid";
const ADDRESS_PARAM: &str = "ip";

/// Errors that can occur when constructing a [`HttpAuthCallback`].
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// The callback URL could not be parsed.
    #[error("Invalid callback URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The callback URL does not use HTTP or HTTPS.
    #[error("Unsupported callback URL scheme {0:?}")]
    UnsupportedScheme(String),
    /// The authorization value cannot be sent as an HTTP header.
    #[error("Invalid callback authorization header value")]
    InvalidAuthorization(#[from] reqwest::header::InvalidHeaderValue),
    /// The HTTP client could not be constructed.
    #[error("Failed to construct HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// An [`AuthCallback`] asking an HTTP service.
///
/// The HTTP client is created once and shared by all calls to
/// [`authorize`](AuthCallback::authorize), which block the calling thread until a response is
/// received or the configured timeout expires.  As with any blocking `reqwest` client, it must
/// not be used from within an asynchronous runtime's worker threads.
#[derive(Debug)]
pub struct HttpAuthCallback {
    url: Url,
    authorization: Option<HeaderValue>,
    client: Client,
}

impl HttpAuthCallback {
    /// Construct a new [`HttpAuthCallback`].
    ///
    /// `timeout` bounds both connection establishment and the complete request.
    ///
    /// # Errors
    ///
    /// - [`CallbackError::InvalidUrl`] or [`CallbackError::UnsupportedScheme`] if `url` is not an
    ///   absolute HTTP(S) URL.
    /// - [`CallbackError::InvalidAuthorization`] if `authorization` contains characters that are
    ///   not allowed in an HTTP header.
    /// - [`CallbackError::Client`] if the HTTP client could not be constructed.
    pub fn new(
        url: &str,
        authorization: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, CallbackError> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CallbackError::UnsupportedScheme(url.scheme().to_string()));
        }
        let authorization = authorization
            .map(|value| {
                let mut value = HeaderValue::from_str(value)?;
                value.set_sensitive(true);
                Ok::<_, CallbackError>(value)
            })
            .transpose()?;
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            url,
            authorization,
            client,
        })
    }

    /// Construct the [`HttpAuthCallback`] described by `config`, or `None` if no callback URL
    /// is configured.
    pub fn from_config(config: &AuthConfig) -> Result<Option<Self>, CallbackError> {
        config
            .callback_url()
            .map(|url| {
                Self::new(
                    url,
                    config.callback_authorization(),
                    config.callback_timeout(),
                )
            })
            .transpose()
    }

    /// The URL that is requested to authorize `user_id` connecting from `from`.
    ///
    /// Query parameters of the configured URL are kept, apart from any existing `uid` or `ip`
    /// parameters which are replaced.
    ///
    /// # Examples
    /// ```
    /// # use std::time::Duration;
    /// # use turn_auth_server::callback::HttpAuthCallback;
    /// let callback = HttpAuthCallback::new(
    ///     "https://auth.example.com/turn?service=relay",
    ///     None,
    ///     Duration::from_secs(5),
    /// )
    /// .unwrap();
    /// let url = callback.request_url("user-1", "192.0.2.1:4000".parse().unwrap());
    /// assert_eq!(
    ///     url.as_str(),
    ///     "https://auth.example.com/turn?service=relay&uid=user-1&ip=192.0.2.1%3A4000"
    /// );
    /// ```
    pub fn request_url(&self, user_id: &str, from: SocketAddr) -> Url {
        let mut url = self.url.clone();
        let retained: Vec<(String, String)> = url
            .query_pairs()
            .into_owned()
            .filter(|(key, _)| key != USER_ID_PARAM && key != ADDRESS_PARAM)
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair(USER_ID_PARAM, user_id)
            .append_pair(ADDRESS_PARAM, &from.to_string());
        url
    }
}

impl AuthCallback for HttpAuthCallback {
    fn authorize(&self, user_id: &str, from: SocketAddr) -> bool {
        let url = self.request_url(user_id, from);
        debug!("Calling authentication callback: GET {url}");

        let mut request = self.client.get(url.clone());
        if let Some(authorization) = &self.authorization {
            request = request.header(AUTHORIZATION, authorization.clone());
        }

        match request.send() {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                debug!(
                    "Status code {} as a response of GET {url}",
                    response.status()
                );
                false
            }
            Err(e) => {
                error!("Error sending GET request to {url}: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn from() -> SocketAddr {
        "192.0.2.1:4000".parse().unwrap()
    }

    fn callback(url: &str, authorization: Option<&str>) -> HttpAuthCallback {
        HttpAuthCallback::new(url, authorization, Duration::from_secs(5)).unwrap()
    }

    fn params(url: &Url, name: &str) -> Vec<String> {
        url.query_pairs()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .collect()
    }

    #[test]
    fn request_url_without_query() {
        let _log = crate::tests::test_init_log();
        let callback = callback("http://localhost:8080/auth", None);
        let url = callback.request_url("user-1", from());
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/auth?uid=user-1&ip=192.0.2.1%3A4000"
        );
    }

    #[test]
    fn request_url_replaces_parameters() {
        let _log = crate::tests::test_init_log();
        let callback = callback("http://localhost/auth?uid=evil&a=1&ip=1.1.1.1&b=2", None);
        let url = callback.request_url("org/user 1", "[2001:db8::1]:3478".parse().unwrap());
        assert_eq!(params(&url, "uid"), vec!["org/user 1".to_string()]);
        assert_eq!(params(&url, "ip"), vec!["[2001:db8::1]:3478".to_string()]);
        assert_eq!(params(&url, "a"), vec!["1".to_string()]);
        assert_eq!(params(&url, "b"), vec!["2".to_string()]);
    }

    #[test]
    fn request_url_does_not_modify_configured_url() {
        let _log = crate::tests::test_init_log();
        let callback = callback("http://localhost/auth?a=1", None);
        let _ = callback.request_url("first", from());
        let url = callback.request_url("second", from());
        assert_eq!(params(&url, "uid"), vec!["second".to_string()]);
    }

    #[test]
    fn invalid_configuration() {
        let _log = crate::tests::test_init_log();
        let timeout = Duration::from_secs(1);
        assert!(matches!(
            HttpAuthCallback::new("not a url", None, timeout),
            Err(CallbackError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpAuthCallback::new("/relative/path", None, timeout),
            Err(CallbackError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpAuthCallback::new("ftp://example.com/auth", None, timeout),
            Err(CallbackError::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
        assert!(matches!(
            HttpAuthCallback::new("http://example.com/auth", Some("bad\nvalue"), timeout),
            Err(CallbackError::InvalidAuthorization(_))
        ));
    }

    #[test]
    fn from_config() {
        let _log = crate::tests::test_init_log();
        let config = AuthConfig::new("realm");
        assert!(HttpAuthCallback::from_config(&config).unwrap().is_none());
        let config = config.with_callback_url("http://localhost/auth");
        assert!(HttpAuthCallback::from_config(&config).unwrap().is_some());
        let config = config.with_callback_url("::");
        assert!(HttpAuthCallback::from_config(&config).is_err());
    }

    #[test]
    fn authorized() {
        let _log = crate::tests::test_init_log();
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/auth")
                .query_param("uid", "user-1")
                .query_param("ip", "192.0.2.1:4000")
                .query_param("service", "relay")
                .header("authorization", "Bearer token");
            then.status(200).body("ignored");
        });

        let callback = callback(&server.url("/auth?service=relay"), Some("Bearer token"));
        assert!(callback.authorize("user-1", from()));
        mock.assert();
    }

    #[test]
    fn every_call_reaches_the_service() {
        let _log = crate::tests::test_init_log();
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/auth");
            then.status(200);
        });

        let callback = callback(&server.url("/auth"), None);
        for _ in 0..3 {
            assert!(callback.authorize("user-1", from()));
        }
        mock.assert_hits(3);
    }

    #[test]
    fn missing_authorization_header_denied() {
        let _log = crate::tests::test_init_log();
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/auth")
                .header("authorization", "Bearer token");
            then.status(200);
        });

        let callback = callback(&server.url("/auth"), None);
        assert!(!callback.authorize("user-1", from()));
        mock.assert_hits(0);
    }

    #[test]
    fn non_ok_status_denied() {
        let _log = crate::tests::test_init_log();
        for status in [201, 204, 301, 401, 403, 500] {
            let server = MockServer::start();
            let mock = server.mock(|when, then| {
                when.method(GET).path("/auth");
                then.status(status);
            });

            let callback = callback(&server.url("/auth"), None);
            assert!(!callback.authorize("user-1", from()), "status {status}");
            mock.assert();
        }
    }

    #[test]
    fn unreachable_service_denied() {
        let _log = crate::tests::test_init_log();
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let callback = callback(&format!("http://127.0.0.1:{port}/auth"), None);
        assert!(!callback.authorize("user-1", from()));
    }

    #[test]
    fn slow_service_denied() {
        let _log = crate::tests::test_init_log();
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/auth");
            then.status(200).delay(Duration::from_secs(3));
        });

        let callback = HttpAuthCallback::new(
            &server.url("/auth"),
            None,
            Duration::from_millis(200),
        )
        .unwrap();
        let start = std::time::Instant::now();
        assert!(!callback.authorize("user-1", from()));
        assert!(start.elapsed() < Duration::from_secs(3));
    }
}
