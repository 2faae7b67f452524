//! # Servidor TCP
//! src/server/tcp.rs
//!
//! Une el socket de escucha con el manejador de conexiones. Un solo
//! thread: cada conexión se atiende de principio a fin antes del siguiente
//! accept, en orden de llegada.

use super::connection::ConnectionHandler;
use super::listener::{Listener, ServerAddress};
use crate::config::Config;
use crate::error::ServerError;
use crate::gateway::{Application, EnvironmentBuilder, ServerMeta};
use std::sync::Arc;
use tracing::info;

/// Servidor HTTP con interfaz de gateway
pub struct Server {
    listener: Listener,
    handler: ConnectionHandler,
}

impl Server {
    /// Bindea el socket y resuelve la metadata (una sola vez)
    pub fn new(config: &Config, app: Arc<dyn Application>) -> Result<Self, ServerError> {
        config.validate()?;

        let listener = Listener::bind(config.socket_addr()?, config.request_queue_size)?;
        let local_addr = listener.local_addr();
        let meta = match &config.server_name {
            Some(name) => ServerMeta::with_name(name.clone(), local_addr.port()),
            None => ServerMeta::resolve(local_addr),
        };
        info!(server_name = %meta.server_name, port = meta.server_port, "servidor configurado");

        let handler = ConnectionHandler::new(app, EnvironmentBuilder::new(meta))
            .with_read_limits(config.read_chunk_size, config.max_request_size)
            .with_read_timeout(config.read_timeout());

        Ok(Self { listener, handler })
    }

    pub fn local_address(&self) -> ServerAddress {
        self.listener.local_address()
    }

    pub fn meta(&self) -> &ServerMeta {
        self.handler.builder().meta()
    }

    /// Atiende exactamente una conexión
    pub fn handle_request(&self) -> Result<(), ServerError> {
        self.listener.handle_request(&self.handler)
    }

    /// Atiende conexiones para siempre (esto bloquea el thread)
    pub fn serve_forever(&self) -> ! {
        info!("WSGIServer: Serving on port {}...", self.local_address().port);
        self.listener.serve_forever(&self.handler)
    }
}

/// Crea el servidor para una aplicación
///
/// # Ejemplo
/// ```no_run
/// use std::sync::Arc;
/// use wsgi_server::config::Config;
/// use wsgi_server::apps::demo;
///
/// let config = Config::for_app("demo:hello");
/// let server = wsgi_server::make_server(&config, Arc::new(demo::hello)).unwrap();
/// server.serve_forever();
/// ```
pub fn make_server(config: &Config, app: Arc<dyn Application>) -> Result<Server, ServerError> {
    Server::new(config, app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::demo;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::thread;

    fn local_config() -> Config {
        let mut config = Config::for_app("demo:hello");
        config.host = "127.0.0.1".to_string();
        config.port = 0;
        config.server_name = Some("test.local".to_string());
        config
    }

    fn get(port: u16, path: &str) -> String {
        let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
        client
            .write_all(format!("GET {} HTTP/1.1\r\n\r\n", path).as_bytes())
            .unwrap();
        let mut response = String::new();
        client.read_to_string(&mut response).unwrap();
        response
    }

    #[test]
    fn test_meta_uses_resolved_port() {
        let server = make_server(&local_config(), Arc::new(demo::hello)).unwrap();

        assert_ne!(server.local_address().port, 0);
        assert_eq!(server.meta().server_port, server.local_address().port);
        assert_eq!(server.meta().server_name, "test.local");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = local_config();
        config.read_chunk_size = 0;

        assert!(matches!(
            make_server(&config, Arc::new(demo::hello)),
            Err(ServerError::Config(_))
        ));
    }

    #[test]
    fn test_sequential_requests() {
        let server = make_server(&local_config(), Arc::new(demo::environ)).unwrap();
        let port = server.local_address().port;

        let t = thread::spawn(move || {
            for _ in 0..2 {
                server.handle_request().unwrap();
            }
        });

        let first = get(port, "/first");
        let second = get(port, "/second");
        t.join().unwrap();

        assert!(first.contains("\"PATH_INFO\":\"/first\""));
        assert!(!first.contains("/second"));
        assert!(second.contains("\"PATH_INFO\":\"/second\""));
        assert!(!second.contains("/first"));
    }
}
