//! # Construcción de Respuestas HTTP
//!
//! Respuestas que genera el propio servidor: el encabezado de un archivo
//! estático y las páginas de error. No se envía `Content-Length`; el
//! cierre de la conexión marca el fin del body (HTTP/1.0).
//!
//! ## Formato
//!
//! ```text
//! HTTP/1.0 404 Not Found\r\n
//! Content-Type: text/html\r\n
//! \r\n
//! <H1>An error occurred</H1>\r\n
//! File not found or not accessible: /missing.html
//! ```

use super::StatusCode;
use html_escape::encode_text;

/// Content-Type por defecto, igual para estáticos sin extensión conocida
/// y para páginas de error
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Representa una respuesta HTTP/1.0
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Headers en el orden en que se agregaron
    headers: Vec<(String, String)>,

    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header; si ya existe, se sobrescribe
    ///
    /// # Ejemplo
    /// ```
    /// use cgi_httpd::http::{Response, StatusCode};
    ///
    /// let response = Response::new(StatusCode::Ok)
    ///     .with_header("Content-Type", "text/plain");
    /// ```
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match self.headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    /// Página de error HTML mínima con el diagnóstico escapado
    ///
    /// # Ejemplo
    /// ```
    /// use cgi_httpd::http::{Response, StatusCode};
    ///
    /// let response = Response::html_error(StatusCode::NotFound, "File not found");
    /// assert_eq!(response.status(), StatusCode::NotFound);
    /// ```
    pub fn html_error(status: StatusCode, message: &str) -> Self {
        let body = format!("<H1>An error occurred</H1>\r\n{}", encode_text(message));
        Self::new(status)
            .with_header("Content-Type", DEFAULT_CONTENT_TYPE)
            .with_body(&body)
    }

    /// Status line, headers y la línea vacía, sin el body.
    /// Los estáticos escriben esto y luego copian el archivo.
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut result = format!("HTTP/1.0 {}\r\n", self.status).into_bytes();
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        result.extend_from_slice(b"\r\n");
        result
    }

    /// Respuesta completa lista para el socket
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.head_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_bytes() {
        let response = Response::new(StatusCode::Ok).with_header("Content-Type", "text/plain");
        let text = String::from_utf8(response.head_bytes()).unwrap();
        assert_eq!(text, "HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\n");
    }

    #[test]
    fn test_with_header_overwrites() {
        let response = Response::new(StatusCode::Ok)
            .with_header("Content-Type", "text/plain")
            .with_header("content-type", "image/png");
        let text = String::from_utf8(response.head_bytes()).unwrap();
        assert_eq!(text, "HTTP/1.0 200 OK\r\nContent-Type: image/png\r\n\r\n");
    }

    #[test]
    fn test_html_error_layout() {
        let response = Response::html_error(StatusCode::NotFound, "File not found or not accessible: /x");
        let text = String::from_utf8(response.to_bytes()).unwrap();

        assert!(text.starts_with("HTTP/1.0 404 Not Found\r\n"));
        assert!(text.contains("Content-Type: text/html\r\n"));
        assert!(!text.contains("Content-Length"));
        assert!(text.ends_with("\r\n\r\n<H1>An error occurred</H1>\r\nFile not found or not accessible: /x"));
    }

    #[test]
    fn test_html_error_escapes_message() {
        let response = Response::html_error(StatusCode::NotFound, "/<script>alert(1)</script>");
        let bytes = response.to_bytes();
        let body = String::from_utf8_lossy(&bytes[response.head_bytes().len()..]);
        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;"));
    }
}
