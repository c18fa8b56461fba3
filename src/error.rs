
use std::io;

use thiserror::Error as ThisError;

/// Errors that can be raised while reading a request.
///
/// Every variant is fatal for the request being read: the connection
/// cannot be salvaged afterwards. Tolerated anomalies (an unknown method,
/// a header line without a colon, a bad `Host` port…) never show up here.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// The peer closed the stream in the middle of a line, a chunk or
    /// a fixed-length body.
    #[error("unexpected end of stream")]
    UnexpectedEof,

    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),

    #[error("malformed request target: {0:?}")]
    MalformedTarget(String),

    #[error("chunked body decoding failed: {0}")]
    ChunkedDecode(&'static str),

    #[error("line longer than {0} bytes")]
    LineTooLong(usize),

    #[error("more than {0} headers")]
    TooManyHeaders(usize),

    #[error("body larger than {0} bytes")]
    BodyTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn from_io(io_error: io::Error) -> Error {
        if io_error.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::Io(io_error)
        }
    }

    /// Turns an end of stream inside a chunk into a chunk framing error.
    pub(crate) fn into_chunked(self) -> Error {
        match self {
            Error::UnexpectedEof => Error::ChunkedDecode("stream ended inside a chunk"),
            e => e,
        }
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Error {
        Error::from_io(io_error)
    }
}

impl PartialEq<Error> for Error {
    fn eq(&self, other: &Error) -> bool {
        match (self, other) {
            (Error::Io(e0), Error::Io(e1)) => e0.kind() == e1.kind(),
            (Error::UnexpectedEof, Error::UnexpectedEof) => true,
            (Error::MalformedRequestLine(a), Error::MalformedRequestLine(b)) => a == b,
            (Error::MalformedTarget(a), Error::MalformedTarget(b)) => a == b,
            (Error::ChunkedDecode(_), Error::ChunkedDecode(_)) => true,
            (Error::LineTooLong(a), Error::LineTooLong(b)) => a == b,
            (Error::TooManyHeaders(a), Error::TooManyHeaders(b)) => a == b,
            (Error::BodyTooLarge(a), Error::BodyTooLarge(b)) => a == b,
            (_, _) => false,
        }
    }
}
