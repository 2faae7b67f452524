//! # Manejo de una Conexión
//! src/server/connection.rs
//!
//! Un ciclo completo request/response sobre una conexión aceptada:
//!
//! ```text
//! Reading → Parsing → Building → Invoking → Responding → Closed
//! ```
//!
//! Todos los errores quedan contenidos en la conexión: los de parsing se
//! responden con 400, los de la aplicación con 500, y el socket se cierra
//! en todos los caminos (también si algo hace panic).

use crate::error::ServerError;
use crate::gateway::{
    Application, Body, Environment, EnvironmentBuilder, Headers, ResponseAssembler, StartResponse, Started,
};
use crate::http::{ParsedRequest, StatusCode};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};

/// Socket aceptado más la dirección del cliente
///
/// Se cierra exactamente una vez: con `close()` o, si no se llamó, al
/// hacer drop.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    closed: bool,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream,
            peer,
            closed: false,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_read_timeout(timeout)
    }

    /// Cierra la conexión consumiéndola
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // NotConnected si el cliente ya se fue
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            debug!(peer = %self.peer, error = %e, "shutdown del socket falló");
        }
        debug!(peer = %self.peer, "conexión cerrada");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// Orquesta el ciclo de un request sobre una conexión
pub struct ConnectionHandler {
    app: Arc<dyn Application>,
    builder: EnvironmentBuilder,
    read_chunk_size: usize,
    max_request_size: usize,
    read_timeout: Option<Duration>,
}

impl ConnectionHandler {
    pub fn new(app: Arc<dyn Application>, builder: EnvironmentBuilder) -> Self {
        Self {
            app,
            builder,
            read_chunk_size: 1024,
            max_request_size: 8192,
            read_timeout: None,
        }
    }

    /// Tamaño de cada lectura y tope total del request
    pub fn with_read_limits(mut self, read_chunk_size: usize, max_request_size: usize) -> Self {
        self.read_chunk_size = read_chunk_size.max(1);
        self.max_request_size = max_request_size.max(self.read_chunk_size);
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn builder(&self) -> &EnvironmentBuilder {
        &self.builder
    }

    /// Maneja una conexión completa y la cierra
    pub fn handle(&self, mut conn: Connection) -> Result<(), ServerError> {
        let span = info_span!("conn", peer = %conn.peer());
        let _enter = span.enter();
        let start = Instant::now();

        let result = self.process(&mut conn);
        conn.close();

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(()) => debug!(elapsed_ms, "request terminado"),
            Err(e) => error!(error = %e, "conexión abortada"),
        }
        result
    }

    fn process(&self, conn: &mut Connection) -> Result<(), ServerError> {
        if self.read_timeout.is_some() {
            conn.set_read_timeout(self.read_timeout)?;
        }

        // Reading
        let raw = match self.read_request(conn) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("el cliente cerró sin enviar datos");
                return Ok(());
            }
            Err(e) => {
                let response = error_response(e)?;
                return self.send(conn, response);
            }
        };
        debug!(bytes = raw.len(), "request leído");

        // Parsing → Building → Invoking
        let response = match self.respond(&raw) {
            Ok(response) => response,
            Err(e) => error_response(e)?,
        };

        // Responding
        self.send(conn, response)
    }

    /// Lee hasta el fin de los headers, EOF o el tope de tamaño
    ///
    /// `Ok(None)` si el cliente no mandó nada.
    fn read_request<R: Read>(&self, conn: &mut R) -> Result<Option<Vec<u8>>, ServerError> {
        let mut buffer = Vec::with_capacity(self.read_chunk_size);
        let mut chunk = vec![0u8; self.read_chunk_size];

        loop {
            let n = match conn.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
                        && !buffer.is_empty() =>
                {
                    warn!(bytes = buffer.len(), "timeout de lectura, se usa el request parcial");
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                break;
            }

            buffer.extend_from_slice(&chunk[..n]);
            if headers_complete(&buffer) {
                break;
            }
            if buffer.len() >= self.max_request_size {
                return Err(ServerError::RequestTooLarge {
                    limit: self.max_request_size,
                });
            }
        }

        Ok((!buffer.is_empty()).then_some(buffer))
    }

    fn respond(&self, raw: &[u8]) -> Result<(ResponseAssembler<Started>, Body), ServerError> {
        let request = ParsedRequest::from_bytes(raw)?;
        // from_bytes ya validó UTF-8
        let text = String::from_utf8_lossy(raw);
        dump_lines('<', &text);
        info!(method = request.method(), path = request.path(), version = request.version(), "request");

        let env = self.builder.build(&request, &text);
        let mut start = StartResponse::new();
        let body = self.invoke(&env, &mut start)?;
        let started = start.into_started()?;

        Ok((started, body))
    }

    /// Llama a la aplicación atrapando errores y panics
    fn invoke(&self, env: &Environment, start: &mut StartResponse) -> Result<Body, ServerError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.app.call(env, start))) {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(e)) => Err(ServerError::Application(e.to_string())),
            Err(payload) => Err(ServerError::Application(panic_message(payload.as_ref()))),
        }
    }

    fn send(&self, conn: &mut Connection, (started, body): (ResponseAssembler<Started>, Body)) -> Result<(), ServerError> {
        let status = started.status().to_string();
        let bytes = started.finish(&body, conn)?;
        dump_lines('>', &String::from_utf8_lossy(&bytes));
        info!(status = %status, code = ?StatusCode::code_of(&status), bytes = bytes.len(), "respuesta enviada");
        Ok(())
    }
}

/// Respuesta generada por el servidor para un error de la conexión
///
/// Los errores sin status (I/O) se propagan tal cual.
fn error_response(err: ServerError) -> Result<(ResponseAssembler<Started>, Body), ServerError> {
    let Some(status) = err.status() else {
        return Err(err);
    };
    warn!(error = %err, status = status.as_u16(), "respondiendo con error");

    let body = format!("{}\n", status).into_bytes();
    let headers: Headers = vec![
        ("Content-Type".to_string(), "text/plain; charset=utf-8".to_string()),
        ("Content-Length".to_string(), body.len().to_string()),
    ];
    let started = ResponseAssembler::new().start(&status.to_string(), headers);
    Ok((started, vec![body]))
}

fn headers_complete(buffer: &[u8]) -> bool {
    buffer.windows(4).any(|w| w == b"\r\n\r\n") || buffer.windows(2).any(|w| w == b"\n\n")
}

fn dump_lines(prefix: char, text: &str) {
    for line in text.lines() {
        debug!("{}{}", prefix, line);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic".to_string()
    }
}
