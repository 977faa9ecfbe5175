//! See the client, scheme and port of a request the way they were before it went through your reverse proxies.
//!
//! This uses the "x-forwarded-for" header (or any header with the same format) and, optionally, a header
//! such as "x-forwarded-proto" set by the proxies.
//!
//! ## Internal and trusted proxies
//!
//! To stop clients from being able to spoof their address, the forwarded-for chain is only considered when
//! the request comes straight from an *internal* proxy. The chain is then read from the proxy nearest to
//! us towards the client:
//!
//! - internal proxies are removed from the chain,
//! - *trusted* proxies are removed from the chain and listed in the "x-forwarded-by" header,
//! - the first hop that is neither is the client, everything left of it stays in the "x-forwarded-for" header.
//!
//! Both kinds of proxies are configured as regular expressions that have to match the full hop. Internal
//! proxies default to the private, loopback and link-local addresses, there are no trusted proxies by default.
//!
//! ## Examples
//!
//! A request originating from 140.211.11.130, going through the trusted proxies proxy1 and proxy2 before
//! reaching our internal proxy at 192.168.0.10
//!
//! ```
//! # use http::Request;
//! # use x_forwarded::{ConnectionInfo, XForwarded};
//! # use x_forwarded::config::params;
//! #
//! let x_forwarded = XForwarded::from_params([(params::TRUSTED_PROXIES, "proxy1, proxy2")]).unwrap();
//!
//! // in a real program this info would of course come from the http server
//! let connection = ConnectionInfo::new("192.168.0.10");
//! let request = Request::builder()
//!     .header("x-forwarded-for", "140.211.11.130, proxy1, proxy2")
//!     .body(())
//!     .unwrap();
//!
//! let request = x_forwarded.wrap_request(&request, &connection);
//! assert_eq!("140.211.11.130", request.remote_addr());
//! assert_eq!(None, request.header("x-forwarded-for"));
//! assert_eq!(Some("proxy1, proxy2"), request.header("x-forwarded-by"));
//! ```
//!
//! The same request arriving from 203.0.113.10, which is not an internal proxy, is taken as is
//!
//! ```
//! # use http::Request;
//! # use x_forwarded::{ConnectionInfo, XForwarded};
//! # use x_forwarded::config::params;
//! #
//! let x_forwarded = XForwarded::from_params([(params::TRUSTED_PROXIES, "proxy1, proxy2")]).unwrap();
//!
//! let connection = ConnectionInfo::new("203.0.113.10");
//! let request = Request::builder()
//!     .header("x-forwarded-for", "140.211.11.130, proxy1, proxy2")
//!     .body(())
//!     .unwrap();
//!
//! let request = x_forwarded.wrap_request(&request, &connection);
//! assert_eq!("203.0.113.10", request.remote_addr());
//! assert_eq!(Some("140.211.11.130, proxy1, proxy2"), request.header("x-forwarded-for"));
//! ```

pub mod chain;
pub mod config;
mod connection;
pub mod error;
pub mod headers;
mod overlay;
pub mod patterns;
pub mod protocol;
mod request;
pub mod response;

pub use crate::config::ForwardedConfig;
pub use crate::connection::ConnectionInfo;
pub use crate::error::{ConfigurationError, RedirectError};
pub use crate::overlay::HeaderOverlay;
pub use crate::request::ForwardedRequest;
pub use crate::response::{ForwardedResponse, ResponseSink, UrlBase};

use http::Request;
use tracing::debug;

/// Rewrites requests coming through reverse proxies, and the redirects answering them.
///
/// Holds nothing but the immutable [`ForwardedConfig`], share it between requests (behind an `Arc` if needed).
#[derive(Debug, Clone, Default)]
pub struct XForwarded {
    config: ForwardedConfig,
}

impl XForwarded {
    pub fn new(config: ForwardedConfig) -> Self {
        XForwarded { config }
    }

    /// Build from string keyed parameters, see [`config::params`].
    pub fn from_params<I, K, V>(params: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        ForwardedConfig::from_params(params).map(XForwarded::new)
    }

    pub fn config(&self) -> &ForwardedConfig {
        &self.config
    }

    /// Resolve the client of `request` and rewrite its forwarded headers.
    pub fn wrap_request<'a, B>(
        &self,
        request: &'a Request<B>,
        connection: &'a ConnectionInfo,
    ) -> ForwardedRequest<'a, B> {
        let forwarded = ForwardedRequest::new(request, connection, &self.config);

        if !forwarded.chain().is_identity() || forwarded.scheme() != connection.scheme() {
            debug!(
                original_remote_addr = connection.remote_addr(),
                remote_addr = forwarded.remote_addr(),
                original_scheme = %connection.scheme(),
                scheme = %forwarded.scheme(),
                server_port = forwarded.server_port(),
                forwarded_for = ?forwarded.header(self.config.remote_ip_header().as_str()),
                forwarded_by = ?forwarded.header(self.config.proxies_header().as_str()),
                "rewrote forwarded request"
            );
        }

        forwarded
    }

    /// Make the redirects of `response` absolute against the resolved url of `request`.
    pub fn wrap_response<B, R: ResponseSink>(
        &self,
        request: &ForwardedRequest<'_, B>,
        response: R,
    ) -> ForwardedResponse<R> {
        ForwardedResponse::new(response, UrlBase::of(request))
    }

    /// Wrap `request` and `response` and hand them to the next stage.
    ///
    /// ```
    /// # use http::{Request, Response, StatusCode};
    /// # use x_forwarded::{ConnectionInfo, XForwarded};
    /// # use x_forwarded::config::params;
    /// let x_forwarded = XForwarded::from_params([(params::PROTOCOL_HEADER, "x-forwarded-proto")]).unwrap();
    /// let connection = ConnectionInfo::new("127.0.0.1").with_server_port(8080);
    /// let request = Request::builder()
    ///     .uri("/app/login")
    ///     .header("x-forwarded-for", "140.211.11.130")
    ///     .header("x-forwarded-proto", "https")
    ///     .body(())
    ///     .unwrap();
    /// let mut response = Response::new(());
    ///
    /// x_forwarded
    ///     .process(&request, &connection, &mut response, |request, response| {
    ///         assert_eq!("140.211.11.130", request.remote_addr());
    ///         response.send_redirect("home")
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(StatusCode::FOUND, response.status());
    /// assert_eq!("https://localhost/app/home", response.headers()["location"]);
    /// ```
    pub fn process<'a, B, R, F, T>(
        &self,
        request: &'a Request<B>,
        connection: &'a ConnectionInfo,
        response: R,
        next: F,
    ) -> T
    where
        R: ResponseSink,
        F: FnOnce(&ForwardedRequest<'a, B>, &mut ForwardedResponse<R>) -> T,
    {
        let request = self.wrap_request(request, connection);
        let mut response = self.wrap_response(&request, response);
        next(&request, &mut response)
    }
}

#[allow(dead_code)]
#[doc = include_str!("../README.md")]
fn test_readme_examples() {}
