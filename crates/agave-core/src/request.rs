// ── Inbound request ──
//
// Transport-neutral view of one HTTP request hitting the sensor. Whatever
// server front-end the sensor uses fills this in; the body is a stream so
// the event builder can drain it exactly once.

use std::fmt;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt, stream};
use indexmap::IndexMap;

/// Canonical header name -> values, in arrival order.
pub type HeaderMap = IndexMap<String, Vec<String>>;

/// Request body as it arrives from the transport.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

// ── HttpVersion ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpVersion {
    pub major: u8,
    pub minor: u8,
}

impl HttpVersion {
    pub const HTTP_10: Self = Self { major: 1, minor: 0 };
    pub const HTTP_11: Self = Self { major: 1, minor: 1 };
    pub const HTTP_2: Self = Self { major: 2, minor: 0 };
}

impl Default for HttpVersion {
    fn default() -> Self {
        Self::HTTP_11
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP/{}.{}", self.major, self.minor)
    }
}

// ── InboundRequest ───────────────────────────────────────────────────

/// One request as received by the sensor.
pub struct InboundRequest {
    /// Peer address, `"ip:port"`.
    pub remote_addr: String,
    pub method: String,
    /// Request-target exactly as sent (`/login?next=%2F`, `*`, absolute URL...).
    pub target: String,
    pub version: HttpVersion,
    pub headers: HeaderMap,
    pub transfer_encoding: Vec<String>,
    /// Host the client asked for (`Host` header or URL authority).
    pub host: String,
    body: BodyStream,
}

impl InboundRequest {
    /// A request with HTTP/1.1, no headers and an empty body.
    pub fn new(
        remote_addr: impl Into<String>,
        method: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            remote_addr: remote_addr.into(),
            method: method.into(),
            target: target.into(),
            version: HttpVersion::default(),
            headers: HeaderMap::new(),
            transfer_encoding: Vec::new(),
            host: String::new(),
            body: Box::pin(stream::empty::<Result<Bytes, std::io::Error>>()),
        }
    }

    pub fn with_version(mut self, version: HttpVersion) -> Self {
        self.version = version;
        self
    }

    /// Append a header value. Names are canonicalised (`content-type` ->
    /// `Content-Type`); repeated names accumulate values.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(canonical_header_name(name))
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_transfer_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.transfer_encoding.push(encoding.into());
        self
    }

    /// Replace the body with a single in-memory chunk.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        let chunk: Bytes = body.into();
        self.body = Box::pin(stream::once(async move { Ok::<_, std::io::Error>(chunk) }));
        self
    }

    /// Replace the body with a transport stream.
    pub fn with_body_stream(mut self, body: BodyStream) -> Self {
        self.body = body;
        self
    }

    /// First value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&canonical_header_name(name))
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Read the body stream to the end. Consumes the request, so nothing
    /// else can read the body afterwards.
    pub(crate) async fn into_parts(self) -> Result<(RequestHead, Bytes), std::io::Error> {
        let Self {
            remote_addr: _,
            method,
            target,
            version,
            headers,
            transfer_encoding,
            host,
            mut body,
        } = self;

        let mut buf = BytesMut::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }

        let head = RequestHead {
            method,
            target,
            version,
            headers,
            transfer_encoding,
            host,
        };
        Ok((head, buf.freeze()))
    }
}

impl fmt::Debug for InboundRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboundRequest")
            .field("remote_addr", &self.remote_addr)
            .field("method", &self.method)
            .field("target", &self.target)
            .field("version", &self.version)
            .field("headers", &self.headers)
            .field("transfer_encoding", &self.transfer_encoding)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

/// Everything but the body, after the body has been drained.
#[derive(Debug)]
pub(crate) struct RequestHead {
    pub method: String,
    pub target: String,
    pub version: HttpVersion,
    pub headers: HeaderMap,
    pub transfer_encoding: Vec<String>,
    pub host: String,
}

/// `x-forwarded-FOR` -> `X-Forwarded-For`.
pub(crate) fn canonical_header_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        upper = c == '-';
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn canonicalises_header_names() {
        assert_eq!(canonical_header_name("content-type"), "Content-Type");
        assert_eq!(canonical_header_name("X-FORWARDED-FOR"), "X-Forwarded-For");
        assert_eq!(canonical_header_name("host"), "Host");
    }

    #[test]
    fn repeated_headers_accumulate() {
        let req = InboundRequest::new("10.0.0.5:4444", "GET", "/")
            .with_header("cookie", "a=1")
            .with_header("Cookie", "b=2");
        assert_eq!(req.headers["Cookie"], vec!["a=1", "b=2"]);
        assert_eq!(req.header("COOKIE"), Some("a=1"));
        assert_eq!(req.header("Referer"), None);
    }

    #[test]
    fn version_display() {
        assert_eq!(HttpVersion::HTTP_10.to_string(), "HTTP/1.0");
        assert_eq!(HttpVersion::default().to_string(), "HTTP/1.1");
        assert_eq!(HttpVersion::HTTP_2.to_string(), "HTTP/2.0");
    }

    #[tokio::test]
    async fn drains_chunked_body_stream() {
        let chunks = stream::iter(vec![
            Ok::<_, std::io::Error>(Bytes::from_static(b"user=")),
            Ok(Bytes::from_static(b"admin")),
        ]);
        let req = InboundRequest::new("10.0.0.5:4444", "POST", "/login")
            .with_body_stream(Box::pin(chunks));

        let (head, body) = req.into_parts().await.unwrap();
        assert_eq!(head.method, "POST");
        assert_eq!(body, Bytes::from_static(b"user=admin"));
    }

    #[tokio::test]
    async fn body_read_errors_surface() {
        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "reset")),
        ]);
        let req = InboundRequest::new("10.0.0.5:4444", "POST", "/")
            .with_body_stream(Box::pin(chunks));

        let err = req.into_parts().await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn debug_skips_body() {
        let req = InboundRequest::new("10.0.0.5:4444", "GET", "/").with_body("secret");
        let dbg = format!("{req:?}");
        assert!(dbg.contains("10.0.0.5:4444"));
        assert!(!dbg.contains("secret"));
    }
}
