use crate::config::ForwardedConfig;
use crate::connection::ConnectionInfo;
use http::uri::Scheme;
use http::HeaderMap;

/// Scheme, secure flag and server port of a request as the client sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolResolution {
    secure: bool,
    scheme: Scheme,
    server_port: u16,
}

impl ProtocolResolution {
    /// The state of the connection itself.
    pub fn from_connection(connection: &ConnectionInfo) -> Self {
        ProtocolResolution {
            secure: connection.is_secure(),
            scheme: connection.scheme().clone(),
            server_port: connection.server_port(),
        }
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }
}

/// Resolve the protocol from the configured protocol header.
///
/// Without a protocol header configured, or when the request doesn't carry it, the state of
/// the connection is kept. This doesn't depend on the peer being an internal proxy.
///
/// # Example
///
/// ```rust
/// # use http::Request;
/// # use http::header::HeaderName;
/// # use x_forwarded::{ConnectionInfo, ForwardedConfig};
/// # use x_forwarded::protocol::resolve_protocol;
/// let config = ForwardedConfig::default()
///     .with_protocol_header(Some(HeaderName::from_static("x-forwarded-proto")));
/// let request = Request::builder().header("X-Forwarded-Proto", "HTTPS").body(()).unwrap();
///
/// let protocol = resolve_protocol(&ConnectionInfo::new("192.168.0.10"), request.headers(), &config);
/// assert!(protocol.is_secure());
/// assert_eq!("https", protocol.scheme().as_str());
/// assert_eq!(443, protocol.server_port());
/// ```
pub fn resolve_protocol(
    connection: &ConnectionInfo,
    headers: &HeaderMap,
    config: &ForwardedConfig,
) -> ProtocolResolution {
    let protocol = config
        .protocol_header()
        .and_then(|name| headers.get(name))
        .and_then(|value| value.to_str().ok());

    match protocol {
        Some(protocol) if protocol.eq_ignore_ascii_case(config.protocol_header_https_value()) => {
            ProtocolResolution {
                secure: true,
                scheme: Scheme::HTTPS,
                server_port: config.https_server_port(),
            }
        }
        Some(_) => ProtocolResolution {
            secure: false,
            scheme: Scheme::HTTP,
            server_port: config.http_server_port(),
        },
        None => ProtocolResolution::from_connection(connection),
    }
}
