#![forbid(unsafe_code)]

//! A blocking HTTP/1.x request reader, with form decoding and a
//! cookie-keyed session registry.
//!
//! Requests are read straight from an unbuffered byte stream, one
//! connection per thread. The request line, headers and body are parsed
//! and the body is fully buffered before a [`Request`] is handed out.
//!
//! # Example
//!
//! ```
//! use std::io;
//! use url::Url;
//! use ejbhttp::{Config, SessionRegistry};
//!
//! let registry = SessionRegistry::new();
//! let base = Url::parse("http://127.0.0.1:8080").unwrap();
//! let source = io::Cursor::new(
//!     b"GET /orders?id=7&id=9 HTTP/1.1\r\nHost: api.example.com:8443\r\n\r\n".to_vec()
//! );
//!
//! let request = ejbhttp::read_request(source, &base, &registry, &Config::DEFAULT).unwrap();
//!
//! assert_eq!(request.method(), http::Method::GET);
//! assert_eq!(request.server_name(), Some("api.example.com"));
//! assert_eq!(request.server_port(), Some(8443));
//! assert_eq!(request.parameter_values("id").unwrap(), ["7", "9"]);
//! ```

use std::cell::OnceCell;
use std::io;
use std::time::Duration;

use url::Url;

mod body;
mod character_types;
pub mod connection;
pub mod cookies;
mod error;
pub mod headers;
mod line_reader;
pub mod params;
mod request;
mod request_line;
pub mod session;

pub use connection::{read_request_from_tcp, socket_base_url};
pub use error::{Error, Result};
pub use line_reader::{ByteReader, LineReader};
pub use request::Request;
pub use session::{Session, SessionRegistry};


/// Reader configuration.
///
/// The limits bound what a single request may make the server buffer.
/// `DEFAULT` should be fine for most uses.
#[derive(Copy, Clone, Debug)]
pub struct Config {

    /// Longest request line, header line or chunk size line
    pub max_line_length: usize,

    /// How many header lines are allowed
    pub max_header_count: usize,

    /// Largest body, whatever its framing
    pub max_body_length: usize,

    /// Installed on TCP streams by `read_request_from_tcp`. `None` lets a
    /// stalled peer block the reading thread forever.
    pub read_timeout: Option<Duration>,
}

impl Config {
    pub const DEFAULT: Config = Config {
        max_line_length: 8 * 1024,
        max_header_count: 100,
        max_body_length: 10 * 1024 * 1024,
        read_timeout: Some(Duration::from_secs(30)),
    };
}

impl Default for Config {
    fn default() -> Self {
        Config::DEFAULT
    }
}


/// Reads one request from `reader`.
///
/// `socket_uri` is the base identifier of the connection (see
/// [`socket_base_url`]). If the request carries a session cookie naming a
/// live session of `registry`, the request is bound to it.
///
/// The reader is left right after the request, so keep-alive connections
/// can call this again with the same reader.
pub fn read_request_from(
        reader: &mut dyn ByteReader,
        socket_uri: &Url,
        registry: &SessionRegistry,
        config: &Config,
    ) -> Result<Request> {

    let line = request_line::parse_request_line(reader, socket_uri, config)?;
    let query_params = params::parse_query(line.uri.query());

    let headers = headers::parse_header_block(reader, config)?;
    let uri = headers::apply_host_header(&line.uri, &headers);

    let body = body::read_body(reader, &line.method, &headers, config)?;
    let parameters = params::merge_parameters(&body.form, &query_params);

    tracing::debug!(
        method = %line.method,
        uri = %uri,
        headers = headers.len(),
        body_length = body.bytes.len(),
        "request read"
    );

    let mut request = Request {
        method: line.method,
        protocol: line.protocol,
        uri,
        socket_uri: socket_uri.clone(),
        headers,
        query_params,
        form_params: body.form,
        parameters,
        body: body.bytes,
        cookies: OnceCell::new(),
        session: None,
        context_path: None,
        path: None,
        servlet_path: None,
    };
    request.resolve_session(registry);

    Ok(request)
}

/// Reads one request from `stream`. See [`read_request_from`].
pub fn read_request<S: io::Read>(
        stream: S,
        socket_uri: &Url,
        registry: &SessionRegistry,
        config: &Config,
    ) -> Result<Request> {
    let mut reader = LineReader::new(stream);
    read_request_from(&mut reader, socket_uri, registry, config)
}
