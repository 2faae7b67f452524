//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor con soporte para argumentos CLI y variables
//! de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./wsgi_server demo:hello --port 8888 --read-timeout-ms 5000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! WSGI_PORT=9000 WSGI_HOST=127.0.0.1 ./wsgi_server demo:environ
//! ```

use crate::error::ServerError;
use clap::Parser;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "wsgi_server")]
#[command(about = "Servidor HTTP síncrono con interfaz de gateway")]
#[command(version = "0.2.0")]
pub struct Config {
    /// Aplicación a servir, en formato module:callable (ej: demo:hello)
    #[arg(value_name = "MODULE:CALLABLE", env = "WSGI_APP")]
    pub app: String,

    /// Host/IP en el que escucha (0.0.0.0 = todas las interfaces)
    #[arg(long, default_value = "0.0.0.0", env = "WSGI_HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8888", env = "WSGI_PORT")]
    pub port: u16,

    /// Conexiones pendientes en la cola de accept
    #[arg(long = "queue-size", default_value = "1", env = "WSGI_QUEUE_SIZE")]
    pub request_queue_size: i32,

    // === Lectura del request ===

    /// Bytes leídos del socket en cada llamada a read
    #[arg(long = "read-chunk-size", default_value = "1024", env = "WSGI_READ_CHUNK")]
    pub read_chunk_size: usize,

    /// Tamaño máximo del request (request line + headers); más que esto es 400
    #[arg(long = "max-request-size", default_value = "8192", env = "WSGI_MAX_REQUEST")]
    pub max_request_size: usize,

    /// Timeout de lectura en milisegundos (0 = sin timeout)
    #[arg(long = "read-timeout-ms", default_value = "0", env = "WSGI_READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    // === Metadata ===

    /// SERVER_NAME fijo; si no se da se resuelve por DNS inverso
    #[arg(long = "server-name", env = "WSGI_SERVER_NAME")]
    pub server_name: Option<String>,

    /// Nivel de log por defecto (RUST_LOG tiene prioridad)
    #[arg(long = "log-level", default_value = "info", env = "WSGI_LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Configuración por defecto para una aplicación dada
    ///
    /// No lee argumentos ni variables `WSGI_*`: siempre son los defaults.
    /// Útil en tests y para embeber el servidor.
    ///
    /// # Ejemplo
    /// ```rust
    /// use wsgi_server::config::Config;
    ///
    /// let config = Config::for_app("demo:hello");
    /// assert_eq!(config.address(), "0.0.0.0:8888");
    /// ```
    pub fn for_app(app: &str) -> Self {
        Config {
            app: app.to_string(),
            host: "0.0.0.0".to_string(),
            port: 8888,
            request_queue_size: 1,
            read_chunk_size: 1024,
            max_request_size: 8192,
            read_timeout_ms: 0,
            server_name: None,
            log_level: "info".to_string(),
        }
    }

    /// Obtiene la dirección completa para bind (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resuelve host:port a una dirección de socket
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let address = self.address();
        address
            .to_socket_addrs()
            .map_err(|e| ServerError::Config(format!("cannot resolve {}: {}", address, e)))?
            .next()
            .ok_or_else(|| ServerError::Config(format!("no address for {}", address)))
    }

    /// Timeout de lectura, si está configurado
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.request_queue_size < 1 {
            return Err(ServerError::Config("queue size must be >= 1".to_string()));
        }
        if self.read_chunk_size == 0 {
            return Err(ServerError::Config("read chunk size must be >= 1".to_string()));
        }
        if self.max_request_size < self.read_chunk_size {
            return Err(ServerError::Config(
                "max request size must be >= read chunk size".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::for_app("demo:hello");

        assert_eq!(config.app, "demo:hello");
        assert_eq!(config.port, 8888);
        assert_eq!(config.request_queue_size, 1);
        assert_eq!(config.read_chunk_size, 1024);
        assert_eq!(config.read_timeout(), None);
        assert!(config.server_name.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_app_matches_cli_defaults() {
        let parsed = Config::try_parse_from(["wsgi_server", "demo:hello"]).unwrap();
        let built = Config::for_app("demo:hello");

        // Solo comparable si el entorno no define WSGI_*
        if std::env::vars_os().all(|(k, _)| !k.to_string_lossy().starts_with("WSGI_")) {
            assert_eq!(built.address(), parsed.address());
            assert_eq!(built.request_queue_size, parsed.request_queue_size);
            assert_eq!(built.read_chunk_size, parsed.read_chunk_size);
            assert_eq!(built.max_request_size, parsed.max_request_size);
            assert_eq!(built.read_timeout_ms, parsed.read_timeout_ms);
            assert_eq!(built.server_name, parsed.server_name);
            assert_eq!(built.log_level, parsed.log_level);
        }
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::parse_from([
            "wsgi_server",
            "demo:environ",
            "--host",
            "127.0.0.1",
            "--port",
            "0",
            "--read-timeout-ms",
            "250",
            "--server-name",
            "example.test",
        ]);

        assert_eq!(config.address(), "127.0.0.1:0");
        assert_eq!(config.read_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.server_name.as_deref(), Some("example.test"));
        assert_eq!(config.socket_addr().unwrap().port(), 0);
    }

    #[test]
    fn test_missing_app_is_usage_error() {
        let result = Config::try_parse_from(["wsgi_server"]);
        if std::env::var_os("WSGI_APP").is_none() {
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        let mut config = Config::for_app("demo:hello");
        config.read_chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::for_app("demo:hello");
        config.max_request_size = 100;
        assert!(config.validate().is_err());

        let mut config = Config::for_app("demo:hello");
        config.request_queue_size = 0;
        assert!(config.validate().is_err());
    }
}
