//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser línea por línea: primero la request line, después los headers
//! hasta la línea vacía. No se lee body (solo se acepta GET).
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! GET /app.cgi?user=bob HTTP/1.0\r\n
//! Cookie: session%3Dabc\r\n
//! \r\n
//! ```
//!
//! - El path se decodifica (`%XX`, `+`); la query string se guarda cruda.
//! - Los nombres de header se pasan a mayúsculas y los valores se decodifican.

use super::line::read_line;
use super::url::url_decode;
use crate::error::{ServerError, ServerResult};
use std::ffi::{OsStr, OsString};
use std::io::{BufRead, Cursor};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

/// Largo máximo de línea usado por `Request::parse`
pub const DEFAULT_MAX_LINE: usize = 8192;

/// Representa un request HTTP/1.0 parseado
///
/// Todo lo que viene del cliente se guarda como bytes (`OsString`), así
/// llega igual al filesystem y al entorno del CGI aunque no sea UTF-8.
#[derive(Debug, Clone)]
pub struct Request {
    /// Siempre "GET"; cualquier otro método se rechaza al parsear
    method: String,

    /// Target tal como vino en la request line (ej: "/a%20b.html?x=1")
    raw_path: OsString,

    /// Path decodificado, sin la query string
    path: OsString,

    /// Bytes crudos después del primer '?', si lo hay
    query_string: Option<OsString>,

    /// Versión tal como vino; solo se exige que sea UTF-8
    version: String,

    /// Headers en orden de llegada: (NOMBRE EN MAYÚSCULAS, valor decodificado)
    headers: Vec<(OsString, OsString)>,
}

/// Parte `bytes` en la primera aparición de `sep`
fn split_once_byte(bytes: &[u8], sep: u8) -> Option<(&[u8], &[u8])> {
    let pos = bytes.iter().position(|&b| b == sep)?;
    Some((&bytes[..pos], &bytes[pos + 1..]))
}

impl Request {
    /// Lee y parsea un request desde el stream de la conexión.
    ///
    /// Cualquier entrada malformada termina en `ServerError::Protocol`;
    /// nunca se retorna un request parcial.
    pub fn read_from<R: BufRead>(reader: &mut R, max_line: usize) -> ServerResult<Self> {
        let line = read_line(reader, max_line)?;
        let mut request = Self::parse_request_line(&line)?;

        loop {
            let line = read_line(reader, max_line)?;
            if line.is_empty() {
                break;
            }
            let (name, value) = Self::parse_header(&line)?;
            request.insert_header(name, value);
        }

        Ok(request)
    }

    /// Parsea un request completo desde un buffer en memoria
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use cgi_httpd::http::Request;
    /// use std::ffi::OsStr;
    ///
    /// let raw = b"GET /app.cgi?num=10 HTTP/1.0\r\nCookie: a=1\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/app.cgi");
    /// assert_eq!(request.query_string(), Some(OsStr::new("num=10")));
    /// assert_eq!(request.header("cookie").unwrap(), "a=1");
    /// ```
    pub fn parse(buffer: &[u8]) -> ServerResult<Self> {
        Self::read_from(&mut Cursor::new(buffer), DEFAULT_MAX_LINE)
    }

    /// Formato: `METHOD SP TARGET SP VERSION`
    fn parse_request_line(line: &[u8]) -> ServerResult<Self> {
        let (method, rest) = split_once_byte(line, b' ')
            .ok_or_else(|| ServerError::protocol("cannot parse request (missing target)"))?;
        let (target, version) = split_once_byte(rest, b' ')
            .ok_or_else(|| ServerError::protocol("cannot parse request (missing version)"))?;

        if method != b"GET" {
            return Err(ServerError::protocol(format!(
                "unsupported method: {}",
                String::from_utf8_lossy(method)
            )));
        }

        let version = std::str::from_utf8(version)
            .map_err(|_| ServerError::protocol("cannot parse request (invalid version)"))?;

        let (raw_path, query_string) = match split_once_byte(target, b'?') {
            Some((path, query)) => (path, Some(OsString::from_vec(query.to_vec()))),
            None => (target, None),
        };

        Ok(Request {
            method: "GET".to_string(),
            raw_path: OsString::from_vec(target.to_vec()),
            path: OsString::from_vec(url_decode(raw_path)),
            query_string,
            version: version.to_string(),
            headers: Vec::new(),
        })
    }

    /// Formato: `Name: value`. El nombre termina en ':' justo antes del
    /// primer espacio.
    fn parse_header(line: &[u8]) -> ServerResult<(OsString, OsString)> {
        let parse_error = |reason: &str| {
            ServerError::protocol(format!(
                "header parse error ({}): {}",
                reason,
                String::from_utf8_lossy(line)
            ))
        };

        let (name, value) = split_once_byte(line, b' ').ok_or_else(|| parse_error("no space"))?;
        let name = name.strip_suffix(b":").ok_or_else(|| parse_error("no colon"))?;

        if name.is_empty() || name.iter().any(|&b| b == b'=' || b == 0) {
            return Err(parse_error("invalid name"));
        }

        Ok((
            OsString::from_vec(name.to_ascii_uppercase()),
            OsString::from_vec(url_decode(value)),
        ))
    }

    /// Un header repetido reemplaza al anterior en su misma posición
    fn insert_header(&mut self, name: OsString, value: OsString) {
        match self.headers.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Target sin decodificar, incluida la query string
    pub fn raw_path(&self) -> &OsStr {
        &self.raw_path
    }

    /// Path decodificado
    pub fn path(&self) -> &OsStr {
        &self.path
    }

    pub fn query_string(&self) -> Option<&OsStr> {
        self.query_string.as_deref()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &[(OsString, OsString)] {
        &self.headers
    }

    /// Busca un header sin importar mayúsculas/minúsculas
    pub fn header(&self, name: &str) -> Option<&OsStr> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.as_bytes().eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, value)| value.as_os_str())
    }
}
