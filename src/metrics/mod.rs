//! # Estadísticas de conexiones
//! src/metrics/mod.rs
//!
//! Contadores compartidos entre los threads de conexión:
//! - Conexiones totales y activas
//! - Resultado de cada conexión (estático, CGI, 4xx, 5xx)
//! - Latencia promedio y máxima

pub mod stats;

pub use stats::{ConnectionStats, Outcome, StatsSnapshot};
