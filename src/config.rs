//! Configuration of the [`XForwarded`](crate::XForwarded) layer.

use crate::error::ConfigurationError;
use crate::patterns::{ProxyKind, ProxyPatterns};
use http::HeaderName;
use tracing::{debug, warn};

/// Names of the string keyed parameters accepted by [`ForwardedConfig::from_params`].
pub mod params {
    /// Comma delimited regular expressions matching internal proxies.
    pub const INTERNAL_PROXIES: &str = "internalProxies";
    /// Comma delimited regular expressions matching trusted proxies.
    pub const TRUSTED_PROXIES: &str = "trustedProxies";
    /// Header holding the forwarded-for chain.
    pub const REMOTE_IP_HEADER: &str = "remoteIpHeader";
    /// Header receiving the trusted proxies a request went through.
    pub const PROXIES_HEADER: &str = "proxiesHeader";
    /// Header holding the protocol used by the client, disabled when empty.
    pub const PROTOCOL_HEADER: &str = "protocolHeader";
    /// Value of the protocol header that marks a request as https.
    pub const PROTOCOL_HEADER_HTTPS_VALUE: &str = "protocolHeaderHttpsValue";
    pub const HTTP_SERVER_PORT: &str = "httpServerPort";
    pub const HTTPS_SERVER_PORT: &str = "httpsServerPort";
}

/// Private (RFC 1918), loopback and link-local addresses.
pub const DEFAULT_INTERNAL_PROXIES: &[&str] = &[
    r"10\.\d{1,3}\.\d{1,3}\.\d{1,3}",
    r"192\.168\.\d{1,3}\.\d{1,3}",
    r"172\.(?:1[6-9]|2\d|3[0-1])\.\d{1,3}\.\d{1,3}",
    r"169\.254\.\d{1,3}\.\d{1,3}",
    r"127\.\d{1,3}\.\d{1,3}\.\d{1,3}",
    r"::1",
    r"0:0:0:0:0:0:0:1",
];

pub const DEFAULT_REMOTE_IP_HEADER: &str = "x-forwarded-for";
pub const DEFAULT_PROXIES_HEADER: &str = "x-forwarded-by";
pub const DEFAULT_PROTOCOL_HEADER_HTTPS_VALUE: &str = "https";
pub const DEFAULT_HTTP_SERVER_PORT: u16 = 80;
pub const DEFAULT_HTTPS_SERVER_PORT: u16 = 443;

/// Immutable configuration, built once and shared by every request.
///
/// # Example
///
/// ```rust
/// # use x_forwarded::ForwardedConfig;
/// # use x_forwarded::config::params;
/// let config = ForwardedConfig::from_params([
///     (params::TRUSTED_PROXIES, "proxy1, proxy2"),
///     (params::PROTOCOL_HEADER, "X-Forwarded-Proto"),
/// ])
/// .unwrap();
///
/// assert_eq!("x-forwarded-for", config.remote_ip_header());
/// assert_eq!(Some("x-forwarded-proto"), config.protocol_header().map(|h| h.as_str()));
/// assert!(config.trusted_proxies().matches_any("proxy2"));
/// assert!(config.internal_proxies().matches_any("192.168.0.10"));
/// ```
#[derive(Debug, Clone)]
pub struct ForwardedConfig {
    remote_ip_header: HeaderName,
    proxies_header: HeaderName,
    protocol_header: Option<HeaderName>,
    protocol_header_https_value: String,
    http_server_port: u16,
    https_server_port: u16,
    internal_proxies: ProxyPatterns,
    trusted_proxies: ProxyPatterns,
}

impl Default for ForwardedConfig {
    fn default() -> Self {
        ForwardedConfig {
            remote_ip_header: HeaderName::from_static(DEFAULT_REMOTE_IP_HEADER),
            proxies_header: HeaderName::from_static(DEFAULT_PROXIES_HEADER),
            protocol_header: None,
            protocol_header_https_value: DEFAULT_PROTOCOL_HEADER_HTTPS_VALUE.to_owned(),
            http_server_port: DEFAULT_HTTP_SERVER_PORT,
            https_server_port: DEFAULT_HTTPS_SERVER_PORT,
            internal_proxies: default_internal_proxies(),
            trusted_proxies: ProxyPatterns::empty(ProxyKind::Trusted),
        }
    }
}

fn default_internal_proxies() -> ProxyPatterns {
    ProxyPatterns::from_sources(ProxyKind::Internal, DEFAULT_INTERNAL_PROXIES)
        .expect("default internal proxy patterns are valid")
}

impl ForwardedConfig {
    /// Build the configuration from string keyed parameters, see [`params`] for the keys.
    ///
    /// Parameters that are not given keep their default, unknown parameters are ignored.
    pub fn from_params<I, K, V>(params: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = ForwardedConfig::default();

        for (key, value) in params {
            let value = value.as_ref();
            match key.as_ref() {
                params::INTERNAL_PROXIES => {
                    config.internal_proxies = ProxyPatterns::compile(ProxyKind::Internal, value)?;
                }
                params::TRUSTED_PROXIES => {
                    config.trusted_proxies = ProxyPatterns::compile(ProxyKind::Trusted, value)?;
                }
                params::REMOTE_IP_HEADER => {
                    config.remote_ip_header = parse_header_name(params::REMOTE_IP_HEADER, value)?;
                }
                params::PROXIES_HEADER => {
                    config.proxies_header = parse_header_name(params::PROXIES_HEADER, value)?;
                }
                params::PROTOCOL_HEADER => {
                    config.protocol_header = if value.trim().is_empty() {
                        None
                    } else {
                        Some(parse_header_name(params::PROTOCOL_HEADER, value)?)
                    };
                }
                params::PROTOCOL_HEADER_HTTPS_VALUE => {
                    config.protocol_header_https_value = value.trim().to_owned();
                }
                params::HTTP_SERVER_PORT => {
                    config.http_server_port = parse_port(params::HTTP_SERVER_PORT, value)?;
                }
                params::HTTPS_SERVER_PORT => {
                    config.https_server_port = parse_port(params::HTTPS_SERVER_PORT, value)?;
                }
                unknown => warn!(parameter = unknown, "ignoring unknown parameter"),
            }
        }

        debug!(
            internal_proxies = %config.internal_proxies,
            trusted_proxies = %config.trusted_proxies,
            remote_ip_header = %config.remote_ip_header,
            proxies_header = %config.proxies_header,
            protocol_header = ?config.protocol_header,
            http_server_port = config.http_server_port,
            https_server_port = config.https_server_port,
            "x-forwarded configuration built"
        );

        Ok(config)
    }

    pub fn with_internal_proxies(mut self, patterns: ProxyPatterns) -> Self {
        self.internal_proxies = patterns;
        self
    }

    pub fn with_trusted_proxies(mut self, patterns: ProxyPatterns) -> Self {
        self.trusted_proxies = patterns;
        self
    }

    pub fn with_remote_ip_header(mut self, header: HeaderName) -> Self {
        self.remote_ip_header = header;
        self
    }

    pub fn with_proxies_header(mut self, header: HeaderName) -> Self {
        self.proxies_header = header;
        self
    }

    /// Enable (or with `None`, disable) the protocol header.
    pub fn with_protocol_header(mut self, header: Option<HeaderName>) -> Self {
        self.protocol_header = header;
        self
    }

    pub fn with_protocol_header_https_value(mut self, value: impl Into<String>) -> Self {
        self.protocol_header_https_value = value.into();
        self
    }

    pub fn with_http_server_port(mut self, port: u16) -> Self {
        self.http_server_port = port;
        self
    }

    pub fn with_https_server_port(mut self, port: u16) -> Self {
        self.https_server_port = port;
        self
    }

    pub fn remote_ip_header(&self) -> &HeaderName {
        &self.remote_ip_header
    }

    pub fn proxies_header(&self) -> &HeaderName {
        &self.proxies_header
    }

    pub fn protocol_header(&self) -> Option<&HeaderName> {
        self.protocol_header.as_ref()
    }

    pub fn protocol_header_https_value(&self) -> &str {
        &self.protocol_header_https_value
    }

    pub fn http_server_port(&self) -> u16 {
        self.http_server_port
    }

    pub fn https_server_port(&self) -> u16 {
        self.https_server_port
    }

    pub fn internal_proxies(&self) -> &ProxyPatterns {
        &self.internal_proxies
    }

    pub fn trusted_proxies(&self) -> &ProxyPatterns {
        &self.trusted_proxies
    }
}

fn parse_header_name(
    parameter: &'static str,
    value: &str,
) -> Result<HeaderName, ConfigurationError> {
    HeaderName::from_bytes(value.trim().as_bytes()).map_err(|source| {
        ConfigurationError::InvalidHeaderName {
            parameter,
            value: value.to_owned(),
            source,
        }
    })
}

fn parse_port(parameter: &'static str, value: &str) -> Result<u16, ConfigurationError> {
    value
        .trim()
        .parse()
        .map_err(|source| ConfigurationError::InvalidPort {
            parameter,
            value: value.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ForwardedConfig::default();
        assert_eq!(config.remote_ip_header(), "x-forwarded-for");
        assert_eq!(config.proxies_header(), "x-forwarded-by");
        assert!(config.protocol_header().is_none());
        assert_eq!(config.protocol_header_https_value(), "https");
        assert_eq!(config.http_server_port(), 80);
        assert_eq!(config.https_server_port(), 443);
        assert!(config.trusted_proxies().is_empty());
    }

    #[test]
    fn test_default_internal_proxies() {
        let internal = ForwardedConfig::default().internal_proxies().clone();
        for addr in [
            "10.0.0.1",
            "192.168.0.10",
            "172.16.0.1",
            "172.31.255.255",
            "169.254.1.1",
            "127.0.0.1",
            "::1",
            "0:0:0:0:0:0:0:1",
        ] {
            assert!(internal.matches_any(addr), "{addr} should be internal");
        }
        for addr in [
            "172.32.0.1",
            "172.15.0.1",
            "140.211.11.130",
            "8.8.8.8",
            "proxy1",
        ] {
            assert!(!internal.matches_any(addr), "{addr} should not be internal");
        }
    }

    #[test]
    fn test_from_params() {
        let config = ForwardedConfig::from_params([
            (params::INTERNAL_PROXIES, r"192\.168\.0\.10, 192\.168\.0\.11"),
            (params::TRUSTED_PROXIES, "proxy1, proxy2, proxy3"),
            (params::REMOTE_IP_HEADER, "X-Real-IP"),
            (params::PROXIES_HEADER, "x-forwarded-by"),
            (params::PROTOCOL_HEADER, "X-Secure"),
            (params::PROTOCOL_HEADER_HTTPS_VALUE, "on"),
            (params::HTTP_SERVER_PORT, "8080"),
            (params::HTTPS_SERVER_PORT, " 8443 "),
        ])
        .unwrap();

        assert_eq!(config.internal_proxies().len(), 2);
        assert!(!config.internal_proxies().matches_any("10.0.0.1"));
        assert_eq!(config.trusted_proxies().len(), 3);
        assert_eq!(config.remote_ip_header(), "x-real-ip");
        assert_eq!(config.protocol_header().unwrap(), "x-secure");
        assert_eq!(config.protocol_header_https_value(), "on");
        assert_eq!(config.http_server_port(), 8080);
        assert_eq!(config.https_server_port(), 8443);
    }

    #[test]
    fn test_empty_protocol_header_disables_it() {
        let config = ForwardedConfig::from_params([(params::PROTOCOL_HEADER, "")]).unwrap();
        assert!(config.protocol_header().is_none());
    }

    #[test]
    fn test_unknown_parameter_is_ignored() {
        let config = ForwardedConfig::from_params([("allowedInternalProxies", "foo")]).unwrap();
        assert!(config.internal_proxies().matches_any("127.0.0.1"));
    }

    #[test]
    fn test_invalid_port() {
        let err = ForwardedConfig::from_params([(params::HTTPS_SERVER_PORT, "70000")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidPort {
                parameter: params::HTTPS_SERVER_PORT,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_header_name() {
        let err = ForwardedConfig::from_params([(params::REMOTE_IP_HEADER, "x forwarded for")])
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidHeaderName { .. }));
    }

    #[test]
    fn test_invalid_pattern_prevents_activation() {
        let err = ForwardedConfig::from_params([(params::TRUSTED_PROXIES, "proxy1, [proxy2")])
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidPattern { ref pattern, .. } if pattern == "[proxy2"
        ));
    }
}
