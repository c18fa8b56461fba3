
use std::collections::HashMap;


/// Cookie carrying the session identifier.
pub const SESSION_COOKIE: &str = "EJBSESSIONID";

/// Cookie name to its last value.
pub type Cookies = HashMap<String, String>;


/// Parses a `Cookie` header value (`a=1; b=2`).
///
/// Values are kept raw. Pairs without `=` or without a name are ignored.
pub fn parse_cookies(header: Option<&str>) -> Cookies {
    let mut cookies = Cookies::new();
    let header = match header {
        None => return cookies,
        Some(header) => header,
    };

    for pair in header.split(';') {
        match pair.trim().split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                cookies.insert(name.trim().to_string(), value.trim().to_string());
            }
            _ => {
                if !pair.trim().is_empty() {
                    tracing::trace!(pair, "ignoring malformed cookie");
                }
            }
        }
    }
    cookies
}

/// Value of the cookie `name` in a `Cookie` header value, without building
/// the whole map. Same rules as `parse_cookies`: the last pair wins.
pub fn find_cookie<'a>(header: Option<&'a str>, name: &str) -> Option<&'a str> {
    header?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(n, _)| n.trim() == name)
        .last()
        .map(|(_, value)| value.trim())
}
