
/// Separators between request-line tokens.
pub fn is_whitespace_char(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// `tchar` from RFC 7230, what a method name is made of.
pub fn is_token_byte(byte: u8) -> bool {
    b"!#$%&'*+-.^_`|~".contains(&byte) || byte.is_ascii_digit() || byte.is_ascii_alphabetic()
}

pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(is_token_byte)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens() {
        assert!(is_token("GET"));
        assert!(is_token("M-SEARCH"));
        assert!(is_token("x.rpc_call"));
        assert!(!is_token(""));
        assert!(!is_token("GE T"));
        assert!(!is_token("MÉTHODE"));
        assert!(!is_token("a:b"));
    }
}
