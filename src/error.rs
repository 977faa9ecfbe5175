use http::header::InvalidHeaderName;
use std::num::ParseIntError;
use thiserror::Error;

/// Error raised while building a [`ForwardedConfig`](crate::ForwardedConfig).
///
/// Configuration is validated once, up front; a configuration that fails to build must keep
/// the [`XForwarded`](crate::XForwarded) layer from being installed at all.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A proxy pattern is not a valid regular expression.
    #[error("illegal pattern syntax '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A configured header name is not a valid http header name.
    #[error("invalid header name '{value}' for parameter '{parameter}'")]
    InvalidHeaderName {
        parameter: &'static str,
        value: String,
        #[source]
        source: InvalidHeaderName,
    },

    /// A configured port is not a number between 0 and 65535.
    #[error("invalid port '{value}' for parameter '{parameter}'")]
    InvalidPort {
        parameter: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Error returned by [`ForwardedResponse::send_redirect`](crate::ForwardedResponse::send_redirect).
#[derive(Debug, Error)]
pub enum RedirectError<E> {
    /// The location can't be resolved against the url of the request.
    #[error("can't resolve redirect location '{location}'")]
    InvalidLocation {
        location: String,
        #[source]
        source: url::ParseError,
    },

    /// The response refused the resolved location.
    #[error("failed to send redirect")]
    Sink(#[source] E),
}
