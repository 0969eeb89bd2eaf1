//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Accept loop con un thread por conexión. El listener es lo único que
//! usa el loop; cada thread recibe su `TcpStream` y un `Arc` al contexto
//! de solo lectura.

use super::connection::{handle_connection, ServeContext};
use crate::config::Config;
use crate::metrics::ConnectionStats;
use log::{debug, error, info, warn};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Servidor HTTP/1.0 con CGI
pub struct Server {
    config: Config,
    context: Arc<ServeContext>,
    stats: ConnectionStats,
    listener: TcpListener,
}

impl Server {
    /// Canoniza el document root y hace bind. Si el puerto configurado no
    /// está disponible se usa uno efímero.
    pub fn bind(config: Config) -> io::Result<Self> {
        let root = config.canonical_root()?;
        let context = ServeContext {
            root,
            max_line: config.max_line,
            read_timeout: config.read_timeout(),
        };

        let listener = match TcpListener::bind(config.address()) {
            Ok(listener) => listener,
            Err(e) => {
                warn!("[!] bind {} failed ({}), trying an ephemeral port", config.address(), e);
                TcpListener::bind(config.fallback_address())?
            }
        };

        Ok(Self {
            config,
            context: Arc::new(context),
            stats: ConnectionStats::new(),
            listener,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats.clone()
    }

    /// Host para el mensaje de arranque
    fn display_host(&self, addr: &SocketAddr) -> String {
        if addr.ip().is_unspecified() {
            "localhost".to_string()
        } else {
            self.config.host.to_lowercase()
        }
    }

    /// Corre el accept loop para siempre. Un error de `accept` se loguea y
    /// el loop sigue.
    pub fn run(&self) -> io::Result<()> {
        let addr = self.local_addr()?;
        info!("Web server running at {}:{}", self.display_host(&addr), addr.port());
        info!("[*] Serving {} (one thread per connection)", self.context.root.display());

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => self.dispatch(stream),
                Err(e) => error!("   ❌ accept failed: {}", e),
            }
        }

        Ok(())
    }

    fn dispatch(&self, stream: TcpStream) {
        let peer_addr = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        info!(" ✅ New connection from {}", peer_addr);

        let context = Arc::clone(&self.context);
        let stats = self.stats.clone();
        stats.increment_active_threads();
        debug!("active connection threads: {}", stats.active_threads());

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer_addr))
            .spawn({
                let stats = stats.clone();
                move || {
                    let start = Instant::now();
                    match handle_connection(stream, &context) {
                        Ok(outcome) => {
                            let latency = start.elapsed();
                            stats.record(outcome, latency);
                            info!(
                                "   ✅ {} done: {:?} ({:.2}ms)",
                                peer_addr,
                                outcome,
                                latency.as_secs_f64() * 1000.0
                            );
                        }
                        Err(e) => warn!("   ❌ {} could not be set up: {}", peer_addr, e),
                    }
                    stats.decrement_active_threads();
                    debug!("stats {}", stats.to_json());
                }
            });

        // El stream se cerró al descartarse el closure
        if let Err(e) = spawned {
            error!("   ❌ could not spawn connection thread: {}", e);
            stats.decrement_active_threads();
        }
    }
}
