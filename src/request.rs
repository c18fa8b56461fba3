
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use http::Method;
use url::Url;

use crate::cookies::{self, Cookies, SESSION_COOKIE};
use crate::headers::{self, Headers};
use crate::params::{FormParams, MultiParams};
use crate::session::{Session, SessionRegistry};


/// A fully read request.
///
/// Everything is parsed and buffered by the time a `Request` exists,
/// except the cookie map which is built on first use.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) protocol: String,
    pub(crate) uri: Url,
    pub(crate) socket_uri: Url,
    pub(crate) headers: Headers,
    pub(crate) query_params: MultiParams,
    pub(crate) form_params: FormParams,
    pub(crate) parameters: MultiParams,
    pub(crate) body: Vec<u8>,
    pub(crate) cookies: OnceCell<Cookies>,
    pub(crate) session: Option<Arc<Session>>,
    pub(crate) context_path: Option<String>,
    pub(crate) path: Option<String>,
    pub(crate) servlet_path: Option<String>,
}

impl Request {
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Third token of the request line, `HTTP/1.0` if there was none.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// The identifier the client addressed: the `Host` header, when usable,
    /// replaces the host and port the connection was accepted on.
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// The connection’s own base identifier.
    pub fn socket_uri(&self) -> &Url {
        &self.socket_uri
    }

    pub fn scheme(&self) -> &str {
        self.uri.scheme()
    }

    pub fn server_name(&self) -> Option<&str> {
        self.uri.host_str()
    }

    pub fn server_port(&self) -> Option<u16> {
        self.uri.port_or_known_default()
    }

    /// Raw (still percent-encoded) path.
    pub fn request_uri(&self) -> &str {
        self.uri.path()
    }

    /// `scheme://host:port/path`, without query nor fragment.
    pub fn request_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme(),
            self.server_name().unwrap_or(""),
            self.server_port().map(|p| p.to_string()).unwrap_or_default(),
            self.request_uri(),
        )
    }

    /// Raw query component.
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    // Headers

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn header_names(&self) -> impl Iterator<Item = &str> {
        self.headers.keys().map(String::as_str)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn int_header(&self, name: &str) -> Option<i64> {
        self.header(name)?.parse().ok()
    }

    pub fn content_length(&self) -> Option<u64> {
        headers::parse_content_length(&self.headers)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(headers::CONTENT_TYPE)
    }

    // Parameters

    /// First value of a parameter, query values taking precedence over
    /// form values.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name)?.first().map(String::as_str)
    }

    pub fn parameter_values(&self, name: &str) -> Option<&[String]> {
        self.parameters.get(name).map(Vec::as_slice)
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    pub fn parameter_map(&self) -> &MultiParams {
        &self.parameters
    }

    /// Every parameter with its first value only.
    pub fn parameters_single(&self) -> HashMap<String, String> {
        self.parameters
            .iter()
            .filter_map(|(name, values)| Some((name.clone(), values.first()?.clone())))
            .collect()
    }

    pub fn query_parameters(&self) -> &MultiParams {
        &self.query_params
    }

    pub fn form_parameter(&self, name: &str) -> Option<&str> {
        self.form_params.get(name).map(String::as_str)
    }

    pub fn form_parameters(&self) -> &FormParams {
        &self.form_params
    }

    // Body

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// A fresh reader over the buffered body, positioned at its start.
    pub fn body_reader(&self) -> io::Cursor<&[u8]> {
        io::Cursor::new(self.body.as_slice())
    }

    // Cookies and session

    /// Cookies from the `Cookie` header, parsed on first call.
    pub fn cookies(&self) -> &Cookies {
        self.cookies.get_or_init(|| cookies::parse_cookies(self.header(headers::COOKIE)))
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies().get(name).map(String::as_str)
    }

    /// Points this request at the live session named by its session cookie.
    ///
    /// Only the session cookie is looked at; the cookie map stays unbuilt.
    pub(crate) fn resolve_session(&mut self, registry: &SessionRegistry) {
        let found = cookies::find_cookie(self.header(headers::COOKIE), SESSION_COOKIE)
            .and_then(|id| registry.lookup(id));
        if let Some(ref session) = found {
            tracing::trace!(session = %session.id(), "request resolved to an existing session");
        }
        self.session = found;
    }

    /// The session of this request. Without one, a new session is created
    /// and registered if `create` is set.
    ///
    /// Repeated calls return the same session.
    pub fn session(&mut self, registry: &SessionRegistry, create: bool) -> Option<Arc<Session>> {
        self.session = registry.get_or_create(self.session.take(), create);
        self.session.clone()
    }

    /// Identifier of the session this request is bound to, if any.
    pub fn requested_session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id())
    }

    // Paths

    /// Splits the request path into `context` and the remaining path.
    ///
    /// Only the first successful split counts, and `context` must end on a
    /// segment boundary of the path. A trailing `/` in `context` is
    /// kept in the remaining path rather than in the context path.
    pub fn init_path_from_context(&mut self, context: &str) {
        if self.context_path.is_some() {
            return
        }

        let raw_path = self.uri.path();
        let context = context.strip_suffix('/').unwrap_or(context);
        match raw_path.strip_prefix(context) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => {
                self.path = Some(rest.to_string());
                self.context_path = Some(context.to_string());
            }
            _ => {
                tracing::trace!(path = raw_path, context, "request path is outside of the context");
            }
        }
    }

    /// `""` until `init_path_from_context` succeeded.
    pub fn context_path(&self) -> &str {
        self.context_path.as_deref().unwrap_or("")
    }

    /// Path below the context path; the whole raw path before splitting.
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or_else(|| self.uri.path())
    }

    /// First segment of the request path.
    pub fn extract_context_path(&self) -> &str {
        let path = self.uri.path();
        let path = path.strip_prefix('/').unwrap_or(path);
        path.split('/').next().unwrap_or("")
    }

    pub fn init_servlet_path(&mut self, servlet_path: &str) {
        self.servlet_path = Some(servlet_path.to_string());
    }

    pub fn servlet_path(&self) -> &str {
        match self.servlet_path {
            Some(ref servlet_path) => servlet_path.as_str(),
            None => self.path_info(),
        }
    }

    /// Path below the servlet path, if one was set.
    pub fn path_info(&self) -> &str {
        let path = self.path();
        match self.servlet_path {
            Some(ref servlet_path) => path.strip_prefix(servlet_path.as_str()).unwrap_or(path),
            None => path,
        }
    }

    // Debugging

    /// Human readable rendering of the request line, headers and body.
    pub fn dump(&self) -> String {
        Dump(self).to_string()
    }

    pub fn log_debug(&self) {
        tracing::debug!("\n{}", Dump(self));
    }
}


struct Dump<'a>(&'a Request);

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let request = self.0;
        writeln!(f, "******************* REQUEST ******************")?;
        writeln!(f, "{} {}", request.method, request.uri)?;

        let mut names: Vec<&String> = request.headers.keys().collect();
        names.sort();
        for name in names {
            writeln!(f, "{}={}", name, request.headers[name])?;
        }
        writeln!(f)?;
        writeln!(f, "{}", String::from_utf8_lossy(&request.body))?;
        writeln!(f, "**********************************************")
    }
}
