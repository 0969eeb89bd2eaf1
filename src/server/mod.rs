//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! 1. Escucha en un puerto y acepta conexiones (`tcp`)
//! 2. Un thread por conexión corre el handler (`connection`)
//! 3. El handler sirve un archivo (`static_file`) o ejecuta un CGI (`cgi`)

pub mod cgi;
pub mod connection;
pub mod static_file;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use connection::{handle_connection, Connection, ServeContext};
pub use tcp::Server;
