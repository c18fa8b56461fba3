//! Glue between accepted TCP connections and the request reader.

use std::io;
use std::net::{SocketAddr, TcpStream};

use url::Url;

use crate::error::{Error, Result};
use crate::request::Request;
use crate::session::SessionRegistry;
use crate::{read_request, Config};


/// Base identifier (`http://ip:port`) of connections accepted on
/// `local_addr`. Request targets are resolved against it.
pub fn socket_base_url(local_addr: SocketAddr, secure: bool) -> Result<Url> {
    let scheme = if secure { "https" } else { "http" };
    Url::parse(&format!("{}://{}", scheme, local_addr))
        .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidInput, e)))
}

/// Reads one request from an accepted connection.
///
/// `Config::read_timeout` is installed on the socket first, so a peer that
/// stops sending fails the read with `Error::Io` instead of holding the
/// thread forever.
pub fn read_request_from_tcp(
        stream: &TcpStream,
        secure: bool,
        registry: &SessionRegistry,
        config: &Config,
    ) -> Result<Request> {

    stream.set_read_timeout(config.read_timeout)?;
    let base = socket_base_url(stream.local_addr()?, secure)?;
    read_request(stream, &base, registry, config)
}
