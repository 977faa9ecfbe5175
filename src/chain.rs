//! Trust walk over the forwarded-for chain.
//!
//! Only a request coming straight from an internal proxy may present a forwarded-for chain.
//! The chain is then read from the hop nearest to us towards the original client: internal
//! proxies are dropped, trusted proxies are recorded as "forwarded by" and the first hop
//! that is neither is taken as the client. Anything further left was written by that client
//! and is passed on untouched.

use crate::headers::extract_forwarded_for;
use crate::patterns::{ProxyKind, ProxyPatterns};
use std::collections::VecDeque;
use tracing::trace;

/// Outcome of the trust walk for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainResolution {
    remote_addr: String,
    remote_host: String,
    rewrite: Option<HeaderRewrite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderRewrite {
    remaining_forwarded_for: Vec<String>,
    forwarded_by: Vec<String>,
}

impl ChainResolution {
    /// The request is left as it is: the peer is the client and no header is touched.
    pub fn identity(peer_addr: &str, peer_host: &str) -> Self {
        ChainResolution {
            remote_addr: peer_addr.to_owned(),
            remote_host: peer_host.to_owned(),
            rewrite: None,
        }
    }

    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    pub fn remote_host(&self) -> &str {
        &self.remote_host
    }

    /// `true` if the forwarded headers have to be left untouched.
    pub fn is_identity(&self) -> bool {
        self.rewrite.is_none()
    }

    /// Hops left of the client, `None` when the remote-ip header should be removed (or left
    /// untouched, see [`is_identity`](Self::is_identity)).
    pub fn remaining_forwarded_for(&self) -> Option<&[String]> {
        self.rewrite
            .as_ref()
            .map(|rewrite| rewrite.remaining_forwarded_for.as_slice())
            .filter(|hops| !hops.is_empty())
    }

    /// Trusted proxies the request went through, from the client towards us.
    pub fn forwarded_by(&self) -> Option<&[String]> {
        self.rewrite
            .as_ref()
            .map(|rewrite| rewrite.forwarded_by.as_slice())
            .filter(|hops| !hops.is_empty())
    }
}

/// Classify a hop, internal proxies take precedence over trusted ones.
pub fn classify(hop: &str, internal: &ProxyPatterns, trusted: &ProxyPatterns) -> Option<ProxyKind> {
    if internal.matches_any(hop) {
        Some(ProxyKind::Internal)
    } else if trusted.matches_any(hop) {
        Some(ProxyKind::Trusted)
    } else {
        None
    }
}

/// Resolve the client of a request.
///
/// `forwarded_for` is the raw value of the remote-ip header, if any.
///
/// # Example
///
/// ```rust
/// # use x_forwarded::chain::resolve_chain;
/// # use x_forwarded::patterns::{ProxyKind, ProxyPatterns};
/// let internal = ProxyPatterns::compile(ProxyKind::Internal, r"192\.168\.0\.10, 192\.168\.0\.11").unwrap();
/// let trusted = ProxyPatterns::compile(ProxyKind::Trusted, "proxy1, proxy2").unwrap();
///
/// let resolution = resolve_chain(
///     "192.168.0.10",
///     "192.168.0.10",
///     Some("140.211.11.130, proxy1, untrusted-proxy, proxy2"),
///     &internal,
///     &trusted,
/// );
/// assert_eq!("untrusted-proxy", resolution.remote_addr());
/// assert_eq!(Some(&["140.211.11.130".to_string(), "proxy1".to_string()][..]), resolution.remaining_forwarded_for());
/// assert_eq!(Some(&["proxy2".to_string()][..]), resolution.forwarded_by());
/// ```
pub fn resolve_chain(
    peer_addr: &str,
    peer_host: &str,
    forwarded_for: Option<&str>,
    internal: &ProxyPatterns,
    trusted: &ProxyPatterns,
) -> ChainResolution {
    if !internal.matches_any(peer_addr) {
        trace!(
            peer_addr,
            "peer is not an internal proxy, ignoring forwarded headers"
        );
        return ChainResolution::identity(peer_addr, peer_host);
    }

    let hops: Vec<&str> = match forwarded_for {
        Some(value) => extract_forwarded_for(value).collect(),
        None => Vec::new(),
    };
    if hops.is_empty() {
        return ChainResolution::identity(peer_addr, peer_host);
    }

    let mut forwarded_by = VecDeque::new();
    let mut client = None;
    for (index, hop) in hops.iter().enumerate().rev() {
        match classify(hop, internal, trusted) {
            Some(ProxyKind::Internal) => {}
            Some(ProxyKind::Trusted) => forwarded_by.push_front((*hop).to_owned()),
            None => {
                client = Some(index);
                break;
            }
        }
    }

    let (remote_addr, remote_host, remaining) = match client {
        Some(index) => (hops[index], hops[index], &hops[..index]),
        None => (peer_addr, peer_host, &hops[..0]),
    };

    ChainResolution {
        remote_addr: remote_addr.to_owned(),
        remote_host: remote_host.to_owned(),
        rewrite: Some(HeaderRewrite {
            remaining_forwarded_for: remaining.iter().map(|hop| (*hop).to_owned()).collect(),
            forwarded_by: forwarded_by.into(),
        }),
    }
}
