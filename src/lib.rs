//! # cgi_httpd
//! src/lib.rs
//!
//! Servidor HTTP/1.0 mínimo: acepta conexiones TCP, parsea un solo GET,
//! lo resuelve bajo un document root y sirve el archivo o lo ejecuta como
//! CGI, reenviando su salida tal cual.
//!
//! ## Arquitectura
//!
//! - `http`: lectura de líneas, decodificación de URLs, parsing y respuestas
//! - `resolve`: path del request → archivo estático / ejecutable / 404
//! - `server`: accept loop, handler por conexión, estáticos y CGI
//! - `config`: argumentos CLI y variables de entorno
//! - `error`: taxonomía de errores y su código HTTP
//! - `metrics`: contadores de conexiones
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use cgi_httpd::config::Config;
//! use cgi_httpd::server::Server;
//!
//! let config = Config::default();
//! let server = Server::bind(config).expect("Error al hacer bind");
//! server.run().expect("Error en el accept loop");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod resolve;
pub mod server;
