//! # cgi_httpd - Entry Point
//! src/main.rs

use cgi_httpd::config::Config;
use cgi_httpd::server::Server;
use log::error;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::new();

    if let Err(e) = config.validate() {
        error!("💥 Invalid configuration: {}", e);
        std::process::exit(2);
    }
    config.print_summary();

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            error!("💥 Could not start server: {}", e);
            std::process::exit(1);
        }
    };

    // Esto bloquea el thread principal
    if let Err(e) = server.run() {
        error!("💥 Fatal error: {}", e);
        std::process::exit(1);
    }
}
