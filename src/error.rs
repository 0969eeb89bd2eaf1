//! # Errores del servidor
//! src/error.rs
//!
//! Taxonomía de errores de una conexión. Cada variante sabe qué código
//! HTTP le corresponde; el `Display` es el diagnóstico que ve el cliente.

use crate::http::StatusCode;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Fallo de lectura/escritura en el socket
    #[error("Socket IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request line o header malformado
    #[error("Error parsing request: {0}")]
    Protocol(String),

    /// El path pedido no existe, no es accesible o sale del document root
    #[error("File not found or not accessible: {0}")]
    NotFound(String),

    /// No se pudo abrir un archivo estático ya resuelto
    #[error("Cannot open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    /// No se pudo crear el proceso CGI
    #[error("Cannot spawn {path}: {source}")]
    Process {
        path: String,
        source: std::io::Error,
    },
}

impl ServerError {
    pub fn protocol(msg: impl Into<String>) -> Self {
        ServerError::Protocol(msg.into())
    }

    /// Código HTTP con el que se reporta este error al cliente
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) => StatusCode::NotFound,
            ServerError::Io(_)
            | ServerError::Protocol(_)
            | ServerError::Open { .. }
            | ServerError::Process { .. } => StatusCode::InternalServerError,
        }
    }
}
