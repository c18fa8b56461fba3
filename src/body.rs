//! Request body decoding.
//!
//! Whatever the framing, the body ends up fully buffered before anything
//! else looks at it.

use http::Method;

use crate::error::{Error, Result};
use crate::headers::{self, Headers};
use crate::line_reader::ByteReader;
use crate::params::{self, FormParams};
use crate::Config;


/// How the body of a request is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// The method carries no body.
    None,

    /// `application/x-www-form-urlencoded`, read like `Content` and then
    /// decoded into form parameters.
    Form(Option<u64>),

    /// `Transfer-Encoding: chunked`
    Chunked,

    /// `Content-Length` bytes, or up to a blank line when the length is
    /// unknown.
    Content(Option<u64>),
}

/// A fully read body and, for form bodies, its decoded parameters.
#[derive(Debug, Default)]
pub struct Body {
    pub bytes: Vec<u8>,
    pub form: FormParams,
}


/// GET, DELETE, HEAD and OPTIONS requests are read without a body.
pub fn carries_body(method: &Method) -> bool {
    ![Method::GET, Method::DELETE, Method::HEAD, Method::OPTIONS].contains(method)
}

pub fn framing(method: &Method, headers: &Headers) -> Framing {
    if !carries_body(method) {
        Framing::None
    } else if headers::is_form_url_encoded(headers) {
        Framing::Form(headers::parse_content_length(headers))
    } else if headers::is_chunked(headers) {
        Framing::Chunked
    } else {
        Framing::Content(headers::parse_content_length(headers))
    }
}

pub fn read_body(
        reader: &mut dyn ByteReader,
        method: &Method,
        headers: &Headers,
        config: &Config,
    ) -> Result<Body> {

    let body = match framing(method, headers) {
        Framing::None => Body::default(),
        Framing::Form(length) => {
            let bytes = read_content(reader, length, config)?;
            let form = params::parse_form(&bytes);
            Body { bytes, form }
        }
        Framing::Chunked => Body {
            bytes: read_chunked(reader, config)?,
            form: FormParams::new(),
        },
        Framing::Content(length) => Body {
            bytes: read_content(reader, length, config)?,
            form: FormParams::new(),
        },
    };

    Ok(body)
}

/// Exactly `length` bytes when known, otherwise up to the first blank line.
pub fn read_content(reader: &mut dyn ByteReader, length: Option<u64>, config: &Config) -> Result<Vec<u8>> {
    match length {
        Some(length) => {
            if length > config.max_body_length as u64 {
                return Err(Error::BodyTooLarge(config.max_body_length))
            }
            reader.read_exact_vec(length as usize)
        }
        None => read_until_blank_line(reader, config),
    }
}

/// Reads a body of unknown length.
///
/// The body ends at the first blank line (a line terminator right after
/// another one, or at the very start); both terminators are dropped. A
/// body without such a line ends with the stream. Bodies containing an
/// empty line of their own (binary data) get truncated there.
pub fn read_until_blank_line(reader: &mut dyn ByteReader, config: &Config) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut pending_terminator: Vec<u8> = Vec::new();
    let mut at_line_start = true;

    loop {
        if body.len() + pending_terminator.len() > config.max_body_length {
            return Err(Error::BodyTooLarge(config.max_body_length))
        }

        let terminator: &[u8] = match reader.try_read_byte()? {
            None => break,
            Some(b'\n') => b"\n",
            Some(b'\r') => match reader.try_read_byte()? {
                Some(b'\n') => b"\r\n",
                next => {
                    // a lone CR is content
                    body.append(&mut pending_terminator);
                    body.push(b'\r');
                    at_line_start = false;
                    match next {
                        Some(byte) => reader.unread_byte(byte),
                        None => break,
                    }
                    continue
                }
            },
            Some(byte) => {
                body.append(&mut pending_terminator);
                body.push(byte);
                at_line_start = false;
                continue
            }
        };

        if at_line_start {
            return Ok(body)
        }
        pending_terminator.extend_from_slice(terminator);
        at_line_start = true;
    }

    body.append(&mut pending_terminator);
    Ok(body)
}

/// `None` unless `line` starts with hex digits, optionally followed by
/// `;` and extensions.
fn parse_chunk_size(line: &str) -> Option<usize> {
    let digits = line.split(';').next().unwrap_or("").trim();

    // `from_str_radix` would accept `+1`
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None
    }
    usize::from_str_radix(digits, 16).ok()
}

/// Reassembles a chunked body. Trailer fields are read and dropped.
pub fn read_chunked(reader: &mut dyn ByteReader, config: &Config) -> Result<Vec<u8>> {
    let mut body = Vec::new();

    loop {
        let size_line = reader.read_line(config.max_line_length)?
            .ok_or(Error::ChunkedDecode("stream ended before the last chunk"))?;
        let size = parse_chunk_size(&size_line)
            .ok_or(Error::ChunkedDecode("invalid chunk size"))?;

        if size == 0 {
            break
        }
        if size > config.max_body_length.saturating_sub(body.len()) {
            return Err(Error::BodyTooLarge(config.max_body_length))
        }

        let chunk = reader.read_exact_vec(size).map_err(Error::into_chunked)?;
        body.extend_from_slice(&chunk);

        match reader.read_line(config.max_line_length)? {
            Some(ref line) if line.is_empty() => (),
            Some(_) => return Err(Error::ChunkedDecode("expected CRLF between chunks")),
            None => return Err(Error::ChunkedDecode("stream ended inside a chunk")),
        }
    }

    skip_trailer_part(reader, config)?;
    Ok(body)
}

fn skip_trailer_part(reader: &mut dyn ByteReader, config: &Config) -> Result<()> {
    // Trailers may carry Content-Length, Host… they never reach the caller.
    while let Some(line) = reader.read_line(config.max_line_length)? {
        if line.is_empty() {
            break
        }
        tracing::trace!(trailer = %line, "dropping chunked trailer field");
    }
    Ok(())
}
