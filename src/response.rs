//! Redirects relative to the resolved scheme, host and port.
//!
//! A relative `Location` is resolved by the client against the url it requested, which is
//! the url of the outermost proxy and not the one of the connection we received. Locations
//! are therefore made absolute here, using the resolved scheme and port and the host the
//! request was sent to.

use crate::error::RedirectError;
use crate::request::ForwardedRequest;
use http::header::{InvalidHeaderValue, LOCATION};
use http::uri::Scheme;
use http::{HeaderValue, Response, StatusCode};
use url::{ParseError, Url};

/// Where redirects and urls produced by the application end up.
pub trait ResponseSink {
    type Error;

    /// Redirect the client to `location`.
    fn send_redirect(&mut self, location: &str) -> Result<(), Self::Error>;

    /// Encode a url to be embedded in a response.
    fn encode_url(&self, url: &str) -> String {
        url.to_owned()
    }

    /// Encode a url to be used as redirect location.
    fn encode_redirect_url(&self, url: &str) -> String {
        url.to_owned()
    }
}

/// Answers with `302 Found`.
impl<B> ResponseSink for Response<B> {
    type Error = InvalidHeaderValue;

    fn send_redirect(&mut self, location: &str) -> Result<(), Self::Error> {
        let location = HeaderValue::from_str(location)?;
        *self.status_mut() = StatusCode::FOUND;
        self.headers_mut().insert(LOCATION, location);
        Ok(())
    }
}

impl<R: ResponseSink + ?Sized> ResponseSink for &mut R {
    type Error = R::Error;

    fn send_redirect(&mut self, location: &str) -> Result<(), Self::Error> {
        (**self).send_redirect(location)
    }

    fn encode_url(&self, url: &str) -> String {
        (**self).encode_url(url)
    }

    fn encode_redirect_url(&self, url: &str) -> String {
        (**self).encode_redirect_url(url)
    }
}

/// Scheme, host, port and path that relative locations are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBase {
    scheme: Scheme,
    server_name: String,
    server_port: u16,
    request_uri: String,
}

impl UrlBase {
    pub fn new(
        scheme: Scheme,
        server_name: impl Into<String>,
        server_port: u16,
        request_uri: impl Into<String>,
    ) -> Self {
        UrlBase {
            scheme,
            server_name: server_name.into(),
            server_port,
            request_uri: request_uri.into(),
        }
    }

    /// The base of a request, using its resolved scheme and port and the host it was sent to.
    pub fn of<B>(request: &ForwardedRequest<'_, B>) -> Self {
        UrlBase::new(
            request.scheme().clone(),
            request.server_name(),
            request.server_port(),
            request.request_uri(),
        )
    }

    /// `scheme://host[:port]`, the port is left out when it's the default for the scheme.
    pub fn origin(&self) -> String {
        let default_port = (self.scheme == Scheme::HTTP && self.server_port == 80)
            || (self.scheme == Scheme::HTTPS && self.server_port == 443);
        if default_port {
            format!("{}://{}", self.scheme, self.server_name)
        } else {
            format!(
                "{}://{}:{}",
                self.scheme, self.server_name, self.server_port
            )
        }
    }

    /// The url of the request itself.
    pub fn url(&self) -> Result<Url, ParseError> {
        Url::parse(&format!("{}{}", self.origin(), self.request_uri))
    }

    /// Make `location` absolute.
    ///
    /// A location that already has a scheme is returned as is, no location at all points to
    /// the directory of the request. Anything else is resolved as a reference relative to
    /// the url of the request.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use http::uri::Scheme;
    /// # use x_forwarded::response::UrlBase;
    /// let base = UrlBase::new(Scheme::HTTP, "localhost", 80, "/context/dir/test");
    ///
    /// assert_eq!("http://localhost/context/dir/relativeURI", base.to_absolute(Some("relativeURI")).unwrap());
    /// assert_eq!("http://localhost/relativeURI", base.to_absolute(Some("/relativeURI")).unwrap());
    /// assert_eq!("https://server/othercontext/uri", base.to_absolute(Some("https://server/othercontext/uri")).unwrap());
    /// assert_eq!("http://localhost/context/dir/", base.to_absolute(None).unwrap());
    /// ```
    pub fn to_absolute(&self, location: Option<&str>) -> Result<String, ParseError> {
        let location = match location {
            None | Some("") => ".",
            Some(location) => location,
        };
        match Url::parse(location) {
            Ok(_) => Ok(location.to_owned()),
            Err(ParseError::RelativeUrlWithoutBase) => Ok(self.url()?.join(location)?.into()),
            Err(err) => Err(err),
        }
    }
}

/// The application's response, with urls made absolute against a [`UrlBase`].
#[derive(Debug)]
pub struct ForwardedResponse<R> {
    inner: R,
    base: UrlBase,
}

impl<R: ResponseSink> ForwardedResponse<R> {
    pub fn new(inner: R, base: UrlBase) -> Self {
        ForwardedResponse { inner, base }
    }

    pub fn base(&self) -> &UrlBase {
        &self.base
    }

    pub fn to_absolute(&self, location: Option<&str>) -> Result<String, ParseError> {
        self.base.to_absolute(location)
    }

    pub fn send_redirect(&mut self, location: &str) -> Result<(), RedirectError<R::Error>> {
        let absolute = self
            .to_absolute(Some(location))
            .map_err(|source| RedirectError::InvalidLocation {
                location: location.to_owned(),
                source,
            })?;
        self.inner
            .send_redirect(&absolute)
            .map_err(RedirectError::Sink)
    }

    pub fn encode_url(&self, url: &str) -> Result<String, ParseError> {
        let absolute = self.to_absolute(Some(url))?;
        Ok(self.inner.encode_url(&absolute))
    }

    pub fn encode_redirect_url(&self, url: &str) -> Result<String, ParseError> {
        let absolute = self.to_absolute(Some(url))?;
        Ok(self.inner.encode_redirect_url(&absolute))
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}
