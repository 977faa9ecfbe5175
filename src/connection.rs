use http::uri::Scheme;
use std::net::SocketAddr;

/// State of the connection a request arrived on, as seen by the server.
///
/// Defaults to a plain http connection to `localhost:80`, with the peer host equal to the peer
/// address.
///
/// ```rust
/// # use x_forwarded::ConnectionInfo;
/// # use http::uri::Scheme;
/// let connection = ConnectionInfo::new("192.168.0.10")
///     .with_secure(true)
///     .with_scheme(Scheme::HTTPS)
///     .with_server_port(443);
/// assert_eq!("192.168.0.10", connection.remote_host());
/// assert_eq!("https", connection.scheme().as_str());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    remote_addr: String,
    remote_host: String,
    secure: bool,
    scheme: Scheme,
    server_name: String,
    server_port: u16,
}

impl ConnectionInfo {
    pub fn new(remote_addr: impl Into<String>) -> Self {
        let remote_addr = remote_addr.into();
        ConnectionInfo {
            remote_host: remote_addr.clone(),
            remote_addr,
            secure: false,
            scheme: Scheme::HTTP,
            server_name: "localhost".to_owned(),
            server_port: 80,
        }
    }

    /// Connection info for the peer of an accepted socket.
    pub fn from_peer(peer: SocketAddr) -> Self {
        ConnectionInfo::new(peer.ip().to_string())
    }

    /// Set the reverse-dns name of the peer.
    pub fn with_remote_host(mut self, remote_host: impl Into<String>) -> Self {
        self.remote_host = remote_host.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Name of this server, used for requests that carry neither an absolute uri nor a `Host`
    /// header.
    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = server_name.into();
        self
    }

    pub fn with_server_port(mut self, server_port: u16) -> Self {
        self.server_port = server_port;
        self
    }

    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    pub fn remote_host(&self) -> &str {
        &self.remote_host
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }
}
