
use http::Method;
use url::{Position, Url};

use crate::character_types::{is_token, is_whitespace_char};
use crate::error::{Error, Result};
use crate::line_reader::ByteReader;
use crate::Config;


/// Protocol assumed when the request line has no third token.
pub const DEFAULT_PROTOCOL: &str = "HTTP/1.0";

/// What the first line of a request resolves to.
#[derive(Debug, Clone)]
pub struct RequestLine {
    pub method: Method,
    pub uri: Url,
    pub protocol: String,
}

/// Maps a method token to a standard method, ignoring case, or keeps it
/// verbatim as an extension method.
///
/// RPC-over-HTTP layers invent their own methods, so unknown tokens are
/// never rejected as long as they are valid `tchar` tokens. A token with
/// any other byte cannot be an `http::Method` and fails with
/// `MalformedRequestLine`.
pub fn resolve_method(token: &str) -> Result<Method> {
    let method = match token.to_ascii_uppercase().as_str() {
        "GET" => Method::GET,
        "POST" => Method::POST,
        "PUT" => Method::PUT,
        "DELETE" => Method::DELETE,
        "HEAD" => Method::HEAD,
        "OPTIONS" => Method::OPTIONS,
        "PATCH" => Method::PATCH,
        "TRACE" => Method::TRACE,
        "CONNECT" => Method::CONNECT,
        _ => {
            if !is_token(token) {
                return Err(Error::MalformedRequestLine(token.to_string()))
            }
            tracing::trace!(method = token, "extension method");
            return Method::from_bytes(token.as_bytes())
                .map_err(|_| Error::MalformedRequestLine(token.to_string()))
        }
    };
    Ok(method)
}

/// Resolves a request target against the connection’s base identifier
/// (`scheme://host:port`, anything after the port is ignored).
pub fn resolve_target(base: &Url, target: &str) -> Result<Url> {
    let joined = format!("{}{}", &base[..Position::AfterPort], target);
    Url::parse(&joined).map_err(|_| Error::MalformedTarget(target.to_string()))
}

/// Reads and parses the request line.
pub fn parse_request_line(
        reader: &mut dyn ByteReader,
        base: &Url,
        config: &Config,
    ) -> Result<RequestLine> {

    let line = reader.read_line(config.max_line_length)?
        .ok_or_else(|| Error::MalformedRequestLine(String::new()))?;

    let mut tokens = line.split(is_whitespace_char).filter(|t| !t.is_empty());
    let (method_token, target) = match (tokens.next(), tokens.next()) {
        (Some(m), Some(t)) => (m, t),
        _ => return Err(Error::MalformedRequestLine(line.clone())),
    };
    let protocol = tokens.next().unwrap_or(DEFAULT_PROTOCOL).to_string();

    let method = resolve_method(method_token)?;
    let uri = resolve_target(base, target)?;

    Ok(RequestLine { method, uri, protocol })
}
