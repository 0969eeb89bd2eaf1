//! # Módulo HTTP
//!
//! Subconjunto de HTTP/1.0 que necesita el servidor, escrito a mano:
//!
//! - Lectura de líneas acotadas del socket
//! - Decodificación de URLs (`%XX`, `+`)
//! - Parsing de la request line y los headers (solo GET)
//! - Construcción de respuestas y páginas de error
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query HTTP/1.0\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/html\r\n
//! \r\n
//! <body hasta que se cierra la conexión>
//! ```

pub mod line;      // Lectura de líneas del socket
pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP
pub mod url;       // Decodificación de URLs

pub use request::Request;
pub use response::Response;
pub use status::StatusCode;
