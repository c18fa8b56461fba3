
use std::io;

use crate::error::{Error, Result};


/// Fills `buffer` as much as possible, retrying on `Interrupted`.
///
/// If an “end of file” is encountered after reading `n` bytes,
/// then `Ok(n)` is returned and only the `n` first bytes of the
/// buffer are valid.
fn reliable_read_partial(stream: &mut dyn io::Read, buffer: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    loop {
        match stream.read(&mut buffer[total..]) {
            Ok(size) => {
                total += size;
                if total == buffer.len() || size == 0 {
                    // `size` is zero on EOF
                    return Ok(total)
                }
            }
            Err(err) => {
                if err.kind() != io::ErrorKind::Interrupted {
                    return Err(err)
                }
            }
        }
    }
}


/// Line-oriented and fixed-length reads over an unbuffered byte source.
///
/// Implementors only provide partial reads and a one byte push back,
/// everything else is built on top of these two.
pub trait ByteReader {
    fn read_bytes_partial(&mut self, out_buffer: &mut [u8]) -> io::Result<usize>;

    /// Panics if a byte is already pushed back.
    fn unread_byte(&mut self, byte: u8);

    fn read_bytes(&mut self, out_buffer: &mut [u8]) -> io::Result<()> {
        let read_count = self.read_bytes_partial(out_buffer)?;
        if read_count == out_buffer.len() {
            return Ok(())
        }
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stream ended early"))
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut bytes = [0u8];
        self.read_bytes(&mut bytes)?;
        Ok(bytes[0])
    }

    /// Like `read_byte` but reports the end of the stream as `None`.
    fn try_read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut bytes = [0u8];
        match self.read_bytes_partial(&mut bytes)? {
            0 => Ok(None),
            _ => Ok(Some(bytes[0])),
        }
    }

    /// Reads exactly `length` bytes or fails with `Error::UnexpectedEof`.
    fn read_exact_vec(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; length];
        self.read_bytes(&mut bytes).map_err(Error::from_io)?;
        Ok(bytes)
    }

    /// Reads one line and strips its terminator.
    ///
    /// `\r\n`, a bare `\n` and a bare `\r` all end a line. Returns `None`
    /// if the stream ended before any byte could be read; a last line
    /// without terminator is returned as is.
    fn read_line(&mut self, max_length: usize) -> Result<Option<String>> {
        let mut line = Vec::new();
        loop {
            match self.try_read_byte()? {
                None => {
                    if line.is_empty() {
                        return Ok(None)
                    }
                    break
                }
                Some(b'\n') => break,
                Some(b'\r') => {
                    match self.try_read_byte()? {
                        Some(b'\n') | None => (),
                        Some(other) => self.unread_byte(other),
                    }
                    break
                }
                Some(byte) => {
                    if line.len() >= max_length {
                        return Err(Error::LineTooLong(max_length))
                    }
                    line.push(byte)
                }
            }
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}


/// The `ByteReader` used for every connection.
pub struct LineReader<S: io::Read> {
    stream: S,
    pushed_back_byte: Option<u8>,
}

impl<S> LineReader<S> where S: io::Read {
    pub fn new(stream: S) -> Self {
        Self { stream, pushed_back_byte: None }
    }

    /// Returns the underlying stream and the pushed back byte, if any.
    pub fn into_inner(self) -> (S, Option<u8>) {
        (self.stream, self.pushed_back_byte)
    }
}

impl<S> ByteReader for LineReader<S> where S: io::Read {
    fn read_bytes_partial(&mut self, out_buffer: &mut [u8]) -> io::Result<usize> {
        if out_buffer.is_empty() {
            return Ok(0)
        }

        let mut total = 0;
        if let Some(byte) = self.pushed_back_byte.take() {
            out_buffer[0] = byte;
            total += 1;
            if out_buffer.len() == 1 {
                return Ok(1)
            }
        }

        let size = reliable_read_partial(&mut self.stream, &mut out_buffer[total..])?;
        Ok(total + size)
    }

    fn unread_byte(&mut self, byte: u8) {
        assert!(self.pushed_back_byte.is_none());
        self.pushed_back_byte = Some(byte)
    }
}



#[cfg(test)]
mod tests {
    use std::io;
    use super::*;

    struct BrokenReader {}

    impl io::Read for BrokenReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "oops"))
        }
    }

    /// Hands out one byte per `read` call, like a slow socket.
    struct Trickle<'a>(&'a [u8]);

    impl<'a> io::Read for Trickle<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0)
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    fn source(bytes: &[u8]) -> LineReader<io::Cursor<Vec<u8>>> {
        LineReader::new(io::Cursor::new(bytes.to_vec()))
    }

    #[test]
    fn test_reliable_read_partial() {
        let mut cursor = io::Cursor::new(b"");
        let mut buf = [0u8; 0];
        assert_eq!(reliable_read_partial(&mut cursor, &mut buf).unwrap(), 0);

        let mut cursor = io::Cursor::new(b"a");
        let mut buf = [7u8; 4];
        assert_eq!(reliable_read_partial(&mut cursor, &mut buf).unwrap(), 1);
        assert_eq!(buf, [b'a', 7, 7, 7]);

        let mut trickle = Trickle(b"elixir");
        let mut buf = [0u8; 6];
        assert_eq!(reliable_read_partial(&mut trickle, &mut buf).unwrap(), 6);
        assert_eq!(&buf, b"elixir");

        let mut broken = BrokenReader {};
        let mut buf = *b"hello";
        let res = reliable_read_partial(&mut broken, &mut buf);
        assert_eq!(res.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn push_back() {
        let mut reader = source(b"abc");
        let mut buf = [0u8; 2];
        reader.read_bytes(&mut buf).unwrap();
        assert_eq!(buf, [b'a', b'b']);
        reader.unread_byte(b'z');
        reader.read_bytes(&mut buf).unwrap();
        assert_eq!(buf, [b'z', b'c']);

        let mut buf = [0u8; 0];
        assert!(reader.read_bytes(&mut buf).is_ok());

        assert_eq!(reader.read_byte().unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(reader.try_read_byte().unwrap(), None);
    }

    #[test]
    fn lines() {
        let mut reader = source(b"one\r\ntwo\nthree\rfour\r\n\r\nlast");
        assert_eq!(reader.read_line(64).unwrap().as_deref(), Some("one"));
        assert_eq!(reader.read_line(64).unwrap().as_deref(), Some("two"));
        assert_eq!(reader.read_line(64).unwrap().as_deref(), Some("three"));
        assert_eq!(reader.read_line(64).unwrap().as_deref(), Some("four"));
        assert_eq!(reader.read_line(64).unwrap().as_deref(), Some(""));
        assert_eq!(reader.read_line(64).unwrap().as_deref(), Some("last"));
        assert_eq!(reader.read_line(64).unwrap(), None);
    }

    #[test]
    fn lines_over_a_trickling_stream() {
        let mut reader = LineReader::new(Trickle(b"GET / HTTP/1.1\r\n\r\n"));
        assert_eq!(reader.read_line(64).unwrap().as_deref(), Some("GET / HTTP/1.1"));
        assert_eq!(reader.read_line(64).unwrap().as_deref(), Some(""));
        assert_eq!(reader.read_line(64).unwrap(), None);
    }

    #[test]
    fn line_length_is_limited() {
        let mut reader = source(b"0123456789\r\n");
        assert_eq!(reader.read_line(4).unwrap_err(), Error::LineTooLong(4));

        let mut reader = source(b"0123\r\n");
        assert_eq!(reader.read_line(4).unwrap().as_deref(), Some("0123"));
    }

    #[test]
    fn exact_reads() {
        let mut reader = source(b"hello world");
        assert_eq!(reader.read_exact_vec(5).unwrap(), b"hello");
        assert_eq!(reader.read_exact_vec(0).unwrap(), b"");
        assert_eq!(reader.read_exact_vec(32).unwrap_err(), Error::UnexpectedEof);
    }

    #[test]
    fn io_errors_are_kept() {
        let mut reader = LineReader::new(BrokenReader {});
        assert_eq!(
            reader.read_line(8).unwrap_err(),
            Error::Io(io::Error::from(io::ErrorKind::PermissionDenied))
        );
    }
}
