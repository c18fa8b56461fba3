
use std::collections::HashMap;

use url::Url;

use crate::error::{Error, Result};
use crate::line_reader::ByteReader;
use crate::Config;


pub const HOST: &str = "Host";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";
pub const COOKIE: &str = "Cookie";

pub const CHUNKED: &str = "chunked";
pub const FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";

/// Header name (case preserved, as received) to its last value.
pub type Headers = HashMap<String, String>;


/// Reads header lines up to the blank line that ends the block.
///
/// The first line without a colon ends the block too; it is dropped and
/// whatever follows it is left in the stream.
pub fn parse_header_block(reader: &mut dyn ByteReader, config: &Config) -> Result<Headers> {
    let mut headers = Headers::new();

    let mut count: usize = 0;
    loop {
        let line = match reader.read_line(config.max_line_length)? {
            None => break,
            Some(line) => line,
        };
        if line.is_empty() {
            break
        }

        // FIXME: skipping only the offending line is probably what was meant
        let (name, value) = match line.split_once(':') {
            None => {
                tracing::trace!(line = %line, "header line without a colon, ending the header block");
                break
            }
            Some(field) => field,
        };

        count += 1;
        if count > config.max_header_count {
            return Err(Error::TooManyHeaders(config.max_header_count))
        }

        headers.insert(name.to_string(), value.trim().to_string());
    }

    Ok(headers)
}

/// Builds the identifier the client addressed, from the `Host` header.
///
/// The port is kept when the header has none or an unparsable one. When
/// no valid identifier can be built the given one is returned unchanged.
pub fn apply_host_header(uri: &Url, headers: &Headers) -> Url {
    let host = match headers.get(HOST) {
        None => return uri.clone(),
        Some(host) => host,
    };

    let (host_name, port) = match host.split_once(':') {
        None => (host.as_str(), uri.port()),
        Some((name, port)) => match port.parse::<u16>() {
            Ok(port) => (name, Some(port)),
            Err(_) => {
                tracing::trace!(host = %host, "ignoring unparsable port in Host header");
                (name, uri.port())
            }
        },
    };

    let mut rebuilt = uri.clone();
    if rebuilt.set_host(Some(host_name)).is_err() || rebuilt.set_port(port).is_err() {
        tracing::trace!(host = %host, "Host header does not form a valid identifier");
        return uri.clone()
    }
    rebuilt
}

/// `None` when the header is absent or not a plain decimal number.
pub fn parse_content_length(headers: &Headers) -> Option<u64> {
    let len_str = headers.get(CONTENT_LENGTH)?;

    // `u64::from_str` would accept `+123`
    if len_str.is_empty() || !len_str.bytes().all(|b| b.is_ascii_digit()) {
        tracing::trace!(content_length = %len_str, "ignoring invalid Content-Length");
        return None
    }
    len_str.parse().ok()
}

pub fn is_chunked(headers: &Headers) -> bool {
    headers.get(TRANSFER_ENCODING).map(String::as_str) == Some(CHUNKED)
}

pub fn is_form_url_encoded(headers: &Headers) -> bool {
    headers.get(CONTENT_TYPE).map(String::as_str) == Some(FORM_URL_ENCODED)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read};
    use crate::line_reader::LineReader;

    const C: &Config = &Config::DEFAULT;

    fn concat_lines(lines: Vec<&str>) -> Vec<u8> {
        lines
            .iter()
            .flat_map(|l| format!("{}\r\n", l).into_bytes())
            .collect()
    }

    fn parse(source: &[u8]) -> (Result<Headers>, Vec<u8>) {
        let mut reader = LineReader::new(io::Cursor::new(source.to_vec()));
        let headers = parse_header_block(&mut reader, C);
        let (mut stream, pushed_back) = reader.into_inner();
        let mut rest: Vec<u8> = pushed_back.into_iter().collect();
        stream.read_to_end(&mut rest).unwrap();
        (headers, rest)
    }

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn typical_header_block() {
        let source = concat_lines(vec![
            "Host: www.example.com",
            "Accept:text/html, application/json   ",
            "X-Empty:",
            "",
            "body",
        ]);

        let (headers, rest) = parse(&source);
        let headers = headers.unwrap();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers["Host"], "www.example.com");
        assert_eq!(headers["Accept"], "text/html, application/json");
        assert_eq!(headers["X-Empty"], "");
        assert_eq!(rest, b"body\r\n");
    }

    #[test]
    fn last_value_wins_and_names_keep_their_case() {
        let source = concat_lines(vec![
            "X-Bar: foo",
            "X-Bar: bar",
            "x-bar: baz",
            "",
        ]);

        let headers = parse(&source).0.unwrap();
        assert_eq!(headers["X-Bar"], "bar");
        assert_eq!(headers["x-bar"], "baz");
    }

    #[test]
    fn value_is_everything_after_the_first_colon() {
        let headers = parse(b"Referer: http://example.com:80/x\n\n").0.unwrap();
        assert_eq!(headers["Referer"], "http://example.com:80/x");
    }

    #[test]
    fn line_without_colon_ends_the_block() {
        let source = concat_lines(vec![
            "Host: example.com",
            "garbage",
            "X-After: lost",
            "",
        ]);

        let (headers, rest) = parse(&source);
        let headers = headers.unwrap();
        assert_eq!(headers.len(), 1);
        assert!(!headers.contains_key("X-After"));
        assert_eq!(rest, b"X-After: lost\r\n\r\n");
    }

    #[test]
    fn end_of_stream_ends_the_block() {
        let headers = parse(b"Host: example.com").0.unwrap();
        assert_eq!(headers["Host"], "example.com");

        assert!(parse(b"").0.unwrap().is_empty());
    }

    #[test]
    fn header_count_is_limited() {
        let mut lines: Vec<String> = (0..C.max_header_count + 1)
            .map(|i| format!("X-{}: {}", i, i))
            .collect();
        lines.push(String::new());
        let source = concat_lines(lines.iter().map(String::as_str).collect());

        assert_eq!(parse(&source).0.unwrap_err(), Error::TooManyHeaders(C.max_header_count));
    }

    #[test]
    fn host_header_rewrites_host_and_port() {
        let uri = Url::parse("http://127.0.0.1:8080/orders?id=7#top").unwrap();

        let rebuilt = apply_host_header(&uri, &headers(&[("Host", "api.example.com:8443")]));
        assert_eq!(rebuilt.as_str(), "http://api.example.com:8443/orders?id=7#top");

        let rebuilt = apply_host_header(&uri, &headers(&[("Host", "api.example.com")]));
        assert_eq!(rebuilt.host_str(), Some("api.example.com"));
        assert_eq!(rebuilt.port(), Some(8080));

        let rebuilt = apply_host_header(&uri, &headers(&[("Host", "api.example.com:http")]));
        assert_eq!(rebuilt.host_str(), Some("api.example.com"));
        assert_eq!(rebuilt.port(), Some(8080));

        let rebuilt = apply_host_header(&uri, &headers(&[]));
        assert_eq!(rebuilt, uri);
    }

    #[test]
    fn invalid_host_header_keeps_the_identifier() {
        let uri = Url::parse("http://127.0.0.1:8080/").unwrap();

        assert_eq!(apply_host_header(&uri, &headers(&[("Host", "")])), uri);
        assert_eq!(apply_host_header(&uri, &headers(&[("Host", ":9000")])), uri);
        assert_eq!(apply_host_header(&uri, &headers(&[("Host", "bad host")])), uri);
    }

    #[test]
    fn content_length() {
        assert_eq!(parse_content_length(&headers(&[("Content-Length", "42")])), Some(42));
        assert_eq!(parse_content_length(&headers(&[("Content-Length", "+2")])), None);
        assert_eq!(parse_content_length(&headers(&[("Content-Length", "-1")])), None);
        assert_eq!(parse_content_length(&headers(&[("Content-Length", "")])), None);
        assert_eq!(parse_content_length(&headers(&[("Content-Length", "99999999999999999999")])), None);
        assert_eq!(parse_content_length(&headers(&[])), None);
    }

    #[test]
    fn body_framing_headers() {
        assert!(is_chunked(&headers(&[("Transfer-Encoding", "chunked")])));
        assert!(!is_chunked(&headers(&[("Transfer-Encoding", "gzip, chunked")])));
        assert!(is_form_url_encoded(&headers(&[("Content-Type", FORM_URL_ENCODED)])));
        assert!(!is_form_url_encoded(&headers(&[("Content-Type", "application/x-www-form-urlencoded; charset=UTF-8")])));
    }
}
