//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./cgi_httpd 8080 --root ./www --read-timeout-secs 30
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTPD_PORT=8080 HTTPD_ROOT=./www ./cgi_httpd
//! ```

use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Largo mínimo aceptado para `--max-line`
pub const MIN_LINE_LEN: usize = 64;

/// Configuración del servidor HTTP/1.0
#[derive(Debug, Clone, Parser)]
#[command(name = "cgi_httpd")]
#[command(about = "Servidor HTTP/1.0 minimo: archivos estaticos y CGI")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor (si está ocupado se usa uno efímero)
    #[arg(default_value = "4000", env = "HTTPD_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTPD_HOST")]
    pub host: String,

    /// Document root: directorio desde el que se sirven los archivos
    #[arg(long, default_value = ".", env = "HTTPD_ROOT")]
    pub root: PathBuf,

    /// Largo máximo de la request line y de cada header, en bytes
    #[arg(long = "max-line", default_value = "8192", env = "HTTPD_MAX_LINE")]
    pub max_line: usize,

    /// Timeout de lectura por conexión en segundos (0 = sin timeout)
    #[arg(long = "read-timeout-secs", default_value = "0", env = "HTTPD_READ_TIMEOUT")]
    pub read_timeout_secs: u64,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use cgi_httpd::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:4000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Dirección de respaldo con puerto efímero (0)
    pub fn fallback_address(&self) -> String {
        format!("{}:0", self.host)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_secs > 0).then(|| Duration::from_secs(self.read_timeout_secs))
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.max_line < MIN_LINE_LEN {
            return Err(format!("Max line length must be >= {}", MIN_LINE_LEN));
        }

        if !self.root.is_dir() {
            return Err(format!(
                "Document root is not a directory: {}",
                self.root.display()
            ));
        }

        Ok(())
    }

    /// Document root canonizado; se calcula una vez al arrancar
    pub fn canonical_root(&self) -> io::Result<PathBuf> {
        std::fs::canonicalize(&self.root)
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("=================================");
        println!("  cgi_httpd - HTTP/1.0 + CGI");
        println!("=================================");
        println!("   Address:      {}", self.address());
        println!("   Root:         {}", self.root.display());
        println!("   Max line:     {} bytes", self.max_line);
        match self.read_timeout() {
            Some(timeout) => println!("   Read timeout: {} s", timeout.as_secs()),
            None => println!("   Read timeout: disabled"),
        }
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 4000,
            host: "0.0.0.0".to_string(),
            root: PathBuf::from("."),
            max_line: 8192,
            read_timeout_secs: 0,
        }
    }
}
