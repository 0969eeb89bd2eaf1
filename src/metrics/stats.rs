//! # Collector de estadísticas
//! src/metrics/stats.rs
//!
//! Lo único compartido entre conexiones además del listener. Se loguea
//! como JSON después de cada conexión.

use crate::http::StatusCode;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Cómo terminó una conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Se sirvió un archivo estático
    Static,
    /// Se ejecutó un CGI hasta que terminó
    Cgi,
    /// Se respondió con una página de error
    Error(StatusCode),
}

/// Collector thread-safe
#[derive(Clone)]
pub struct ConnectionStats {
    inner: Arc<Mutex<StatsData>>,
    start_time: Instant,
}

#[derive(Default)]
struct StatsData {
    total_connections: u64,
    active_threads: u64,
    static_served: u64,
    cgi_executed: u64,
    client_errors: u64,
    server_errors: u64,
    total_latency_us: u64,
    max_latency_us: u64,
}

/// Snapshot serializable de las estadísticas
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub total_connections: u64,
    pub active_threads: u64,
    pub static_served: u64,
    pub cgi_executed: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub latency_avg_us: u64,
    pub latency_max_us: u64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatsData::default())),
            start_time: Instant::now(),
        }
    }

    // Un panic en otro thread no invalida contadores
    fn data(&self) -> MutexGuard<'_, StatsData> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registra una conexión terminada
    pub fn record(&self, outcome: Outcome, latency: Duration) {
        let mut data = self.data();
        data.total_connections += 1;

        match outcome {
            Outcome::Static => data.static_served += 1,
            Outcome::Cgi => data.cgi_executed += 1,
            Outcome::Error(status) if status.is_client_error() => data.client_errors += 1,
            Outcome::Error(_) => data.server_errors += 1,
        }

        let latency_us = latency.as_micros() as u64;
        data.total_latency_us = data.total_latency_us.saturating_add(latency_us);
        data.max_latency_us = data.max_latency_us.max(latency_us);
    }

    /// Incrementa el contador de threads activos
    pub fn increment_active_threads(&self) {
        self.data().active_threads += 1;
    }

    /// Decrementa el contador de threads activos
    pub fn decrement_active_threads(&self) {
        let mut data = self.data();
        data.active_threads = data.active_threads.saturating_sub(1);
    }

    pub fn active_threads(&self) -> u64 {
        self.data().active_threads
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let data = self.data();
        let latency_avg_us = if data.total_connections == 0 {
            0
        } else {
            data.total_latency_us / data.total_connections
        };

        StatsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            total_connections: data.total_connections,
            active_threads: data.active_threads,
            static_served: data.static_served,
            cgi_executed: data.cgi_executed,
            client_errors: data.client_errors,
            server_errors: data.server_errors,
            latency_avg_us,
            latency_max_us: data.max_latency_us,
        }
    }

    /// Snapshot en JSON de una línea, para el log
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

impl Default for ConnectionStats {
    fn default() -> Self {
        Self::new()
    }
}
