use crate::chain::{resolve_chain, ChainResolution};
use crate::config::ForwardedConfig;
use crate::connection::ConnectionInfo;
use crate::headers::combined_header_value;
use crate::overlay::HeaderOverlay;
use crate::patterns::join_comma_delimited;
use crate::protocol::{resolve_protocol, ProtocolResolution};
use http::header::HOST;
use http::uri::{Authority, Scheme};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use std::borrow::Cow;

/// A request as seen from behind the proxies.
///
/// Remote address, scheme and port are the resolved ones, and the forwarded headers are
/// rewritten in a [`HeaderOverlay`] without touching the wrapped request.
#[derive(Debug)]
pub struct ForwardedRequest<'a, B> {
    inner: &'a Request<B>,
    connection: &'a ConnectionInfo,
    chain: ChainResolution,
    protocol: ProtocolResolution,
    overlay: HeaderOverlay,
}

impl<'a, B> ForwardedRequest<'a, B> {
    pub fn new(
        inner: &'a Request<B>,
        connection: &'a ConnectionInfo,
        config: &ForwardedConfig,
    ) -> Self {
        let forwarded_for = combined_header_value(inner.headers(), config.remote_ip_header());
        let chain = resolve_chain(
            connection.remote_addr(),
            connection.remote_host(),
            forwarded_for.as_deref(),
            config.internal_proxies(),
            config.trusted_proxies(),
        );
        let protocol = resolve_protocol(connection, inner.headers(), config);

        let remaining_forwarded_for = chain.remaining_forwarded_for().map(join_comma_delimited);
        let forwarded_by = chain.forwarded_by().map(join_comma_delimited);
        let rewrite = !chain.is_identity();

        let mut request = ForwardedRequest {
            inner,
            connection,
            chain,
            protocol,
            overlay: HeaderOverlay::new(),
        };
        if rewrite {
            request.rewrite_header(config.remote_ip_header(), remaining_forwarded_for);
            request.rewrite_header(config.proxies_header(), forwarded_by);
        }
        request
    }

    /// The wrapped request.
    pub fn inner(&self) -> &'a Request<B> {
        self.inner
    }

    pub fn connection(&self) -> &'a ConnectionInfo {
        self.connection
    }

    pub fn chain(&self) -> &ChainResolution {
        &self.chain
    }

    pub fn protocol(&self) -> &ProtocolResolution {
        &self.protocol
    }

    pub fn overlay(&self) -> &HeaderOverlay {
        &self.overlay
    }

    pub fn remote_addr(&self) -> &str {
        self.chain.remote_addr()
    }

    pub fn remote_host(&self) -> &str {
        self.chain.remote_host()
    }

    pub fn is_secure(&self) -> bool {
        self.protocol.is_secure()
    }

    pub fn scheme(&self) -> &Scheme {
        self.protocol.scheme()
    }

    pub fn server_port(&self) -> u16 {
        self.protocol.server_port()
    }

    /// Host the request was sent to, without port.
    ///
    /// Taken from the request uri when it is absolute, from the `Host` header otherwise, and
    /// from the connection when the request names no host at all.
    pub fn server_name(&self) -> Cow<'a, str> {
        if let Some(host) = self.inner.uri().host() {
            return host.into();
        }
        self.inner
            .headers()
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<Authority>().ok())
            .map(|authority| Cow::Owned(authority.host().to_owned()))
            .unwrap_or_else(|| self.connection.server_name().into())
    }

    pub fn method(&self) -> &'a Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &'a Uri {
        self.inner.uri()
    }

    /// Path of the request, without query.
    pub fn request_uri(&self) -> &'a str {
        self.inner.uri().path()
    }

    /// First value of the header `name`, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        match self.overlay.get(name) {
            Some(values) => values.first().map(String::as_str),
            None => self
                .inner
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok()),
        }
    }

    /// All values of the header `name`, ignoring case.
    pub fn headers(&self, name: &str) -> Vec<&str> {
        match self.overlay.get(name) {
            Some(values) => values.iter().map(String::as_str).collect(),
            None => self
                .inner
                .headers()
                .get_all(name)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .collect(),
        }
    }

    /// Names of all headers present on the request, once per name.
    pub fn header_names(&self) -> Vec<&str> {
        let overlay = &self.overlay;
        let present = |values: &[String]| !values.is_empty();

        let mut names: Vec<&str> = self
            .inner
            .headers()
            .keys()
            .filter(|name| overlay.get(name.as_str()).map_or(true, present))
            .map(HeaderName::as_str)
            .collect();
        names.extend(
            overlay
                .iter()
                .filter(|(name, values)| {
                    present(values) && !self.inner.headers().contains_key(*name)
                })
                .map(|(name, _)| name),
        );
        names
    }

    /// The headers of the wrapped request with the overlay applied, to be passed on to an
    /// upstream server.
    ///
    /// Overlay values that are not valid header values are dropped.
    pub fn rewritten_headers(&self) -> HeaderMap {
        let mut headers = self.inner.headers().clone();
        for (name, values) in self.overlay.iter() {
            let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                continue;
            };
            headers.remove(&name);
            for value in values {
                if let Ok(value) = HeaderValue::from_str(value) {
                    headers.append(&name, value);
                }
            }
        }
        headers
    }

    /// Replace the values of a header, ignoring case.
    fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.overlay.set(name, value);
    }

    fn remove_header(&mut self, name: &str) {
        self.overlay.remove(name);
    }

    fn rewrite_header(&mut self, header: &HeaderName, value: Option<String>) {
        match value {
            Some(value) => self.set_header(header.as_str(), value),
            None => self.remove_header(header.as_str()),
        }
    }
}
