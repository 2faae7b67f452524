//! # Socket de Escucha
//! src/server/listener.rs
//!
//! Crea el socket con `SO_REUSEADDR` y un backlog chico (por defecto 1:
//! a lo sumo una conexión pendiente en cola) y corre el loop de accept.
//! Accept y manejo son estrictamente secuenciales.

use super::connection::{Connection, ConnectionHandler};
use crate::error::ServerError;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::thread;
use std::time::Duration;
use tracing::{error, info};

/// Pausa tras un accept fallido (ej: EMFILE) antes de reintentar
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Cuánto esperar antes de volver a llamar a accept tras un error
///
/// Los errores transitorios de una sola conexión se reintentan enseguida;
/// el resto (sin descriptores, sin memoria) persiste y necesita pausa.
pub fn accept_backoff(err: &io::Error) -> Option<Duration> {
    match err.kind() {
        io::ErrorKind::Interrupted
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::WouldBlock => None,
        _ => Some(ACCEPT_BACKOFF),
    }
}

/// Dirección en la que quedó escuchando el servidor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Dueño exclusivo del socket de escucha
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Crea, bindea y pone a escuchar el socket
    ///
    /// Un error acá es fatal: no se reintenta.
    pub fn bind(addr: SocketAddr, backlog: i32) -> Result<Self, ServerError> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| ServerError::bind(addr, e))?;
        socket
            .set_reuse_address(true)
            .map_err(|e| ServerError::bind(addr, e))?;
        socket
            .bind(&addr.into())
            .map_err(|e| ServerError::bind(addr, e))?;
        socket.listen(backlog).map_err(|e| ServerError::bind(addr, e))?;

        let inner: TcpListener = socket.into();
        let local_addr = inner.local_addr().map_err(|e| ServerError::bind(addr, e))?;
        info!(%local_addr, backlog, "socket de escucha listo");

        Ok(Self { inner, local_addr })
    }

    /// Dirección real (con el puerto resuelto si se pidió el 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn local_address(&self) -> ServerAddress {
        ServerAddress {
            host: self.local_addr.ip().to_string(),
            port: self.local_addr.port(),
        }
    }

    /// Acepta una conexión y la maneja hasta cerrarla
    pub fn handle_request(&self, handler: &ConnectionHandler) -> Result<(), ServerError> {
        let (stream, peer) = self.inner.accept()?;
        handler.handle(Connection::new(stream, peer))
    }

    /// Loop de accept infinito
    ///
    /// Los errores de una conexión se loguean y el loop sigue con la
    /// siguiente. Si falla el accept mismo se espera `accept_backoff`
    /// antes de reintentar.
    pub fn serve_forever(&self, handler: &ConnectionHandler) -> ! {
        loop {
            let (stream, peer) = match self.inner.accept() {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "error en accept");
                    if let Some(pause) = accept_backoff(&e) {
                        thread::sleep(pause);
                    }
                    continue;
                }
            };
            if let Err(e) = handler.handle(Connection::new(stream, peer)) {
                error!(error = %e, "error atendiendo conexión");
            }
        }
    }
}
