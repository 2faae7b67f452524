//! # Protocolo de Respuesta en Dos Fases
//! src/gateway/response.rs
//!
//! La aplicación fija status y headers llamando a `start_response` y
//! devuelve el body. El servidor recién serializa cuando tiene ambas
//! cosas:
//!
//! ```text
//! ResponseAssembler<Unstarted> --start()--> ResponseAssembler<Started> --finish()--> bytes
//! ```
//!
//! `finish` solo existe en el estado `Started`. Para la aplicación el
//! punto de entrada es `StartResponse`, que detecta en tiempo de ejecución
//! si nunca se llamó a `start_response` y lo reporta como error de
//! protocolo antes de escribir nada al socket.

use crate::error::ServerError;
use std::io::Write;
use std::time::SystemTime;

/// Identificador del servidor en el header `Server`
pub const SERVER_SOFTWARE: &str = "WSGIServer 0.2";

/// Lista ordenada de headers (nombre, valor)
pub type Headers = Vec<(String, String)>;

/// Estado inicial: todavía no hay status ni headers
#[derive(Debug, Default)]
pub struct Unstarted;

/// Status y headers ya fijados por la aplicación
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Started {
    status: String,
    headers: Headers,
}

/// Ensambla la respuesta HTTP a partir del protocolo de dos fases
#[derive(Debug)]
pub struct ResponseAssembler<S> {
    state: S,
    written: Vec<Vec<u8>>,
}

impl ResponseAssembler<Unstarted> {
    pub fn new() -> Self {
        Self {
            state: Unstarted,
            written: Vec::new(),
        }
    }

    /// Fija status y headers
    ///
    /// A los headers de la aplicación se les agregan `Date` y `Server`.
    pub fn start(self, status: &str, headers: Headers) -> ResponseAssembler<Started> {
        ResponseAssembler {
            state: Started::new(status, headers),
            written: self.written,
        }
    }
}

impl Default for ResponseAssembler<Unstarted> {
    fn default() -> Self {
        Self::new()
    }
}

impl Started {
    fn new(status: &str, mut headers: Headers) -> Self {
        headers.push(("Date".to_string(), http_date(SystemTime::now())));
        headers.push(("Server".to_string(), SERVER_SOFTWARE.to_string()));
        Self {
            status: status.to_string(),
            headers,
        }
    }
}

impl ResponseAssembler<Started> {
    /// Llamar de nuevo a start reemplaza lo anterior (no acumula):
    /// también se descartan los chunks escritos antes del reinicio
    pub fn start(self, status: &str, headers: Headers) -> Self {
        Self {
            state: Started::new(status, headers),
            written: Vec::new(),
        }
    }

    pub fn status(&self) -> &str {
        &self.state.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.state.headers
    }

    /// Serializa status line, headers, línea vacía y body
    ///
    /// Los chunks escritos con `BodyWriter` van antes que los devueltos por
    /// la aplicación.
    ///
    /// # Ejemplo
    /// ```
    /// use wsgi_server::gateway::ResponseAssembler;
    ///
    /// let bytes = ResponseAssembler::new()
    ///     .start("204 No Content", vec![])
    ///     .serialize(&[]);
    /// let text = String::from_utf8(bytes).unwrap();
    ///
    /// assert!(text.starts_with("HTTP/1.1 204 No Content\r\n"));
    /// assert!(text.ends_with("Server: WSGIServer 0.2\r\n\r\n"));
    /// ```
    pub fn serialize(&self, body: &[Vec<u8>]) -> Vec<u8> {
        let mut result = Vec::new();

        // 1. Status line
        result.extend_from_slice(format!("HTTP/1.1 {}\r\n", self.state.status).as_bytes());

        // 2. Headers, en el orden en que se registraron
        for (name, value) in &self.state.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // 3. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");

        // 4. Body
        for chunk in self.written.iter().chain(body) {
            result.extend_from_slice(chunk);
        }

        result
    }

    /// Serializa y envía la respuesta completa por `conn`
    ///
    /// El cierre de la conexión es responsabilidad de quien la posee.
    pub fn finish<W: Write>(self, body: &[Vec<u8>], conn: &mut W) -> Result<Vec<u8>, ServerError> {
        let bytes = self.serialize(body);
        conn.write_all(&bytes)?;
        conn.flush()?;
        Ok(bytes)
    }
}

enum Phase {
    Unstarted(ResponseAssembler<Unstarted>),
    Started(ResponseAssembler<Started>),
}

/// Capacidad `start_response` que recibe la aplicación
pub struct StartResponse {
    phase: Option<Phase>,
}

impl StartResponse {
    pub fn new() -> Self {
        Self {
            phase: Some(Phase::Unstarted(ResponseAssembler::new())),
        }
    }

    /// Registra status y headers y devuelve un writer para el body
    ///
    /// # Ejemplo
    /// ```
    /// use wsgi_server::gateway::StartResponse;
    ///
    /// let mut start = StartResponse::new();
    /// start
    ///     .start_response("200 OK", vec![("Content-Type".into(), "text/plain".into())])
    ///     .write(b"early ");
    ///
    /// let bytes = start.into_started().unwrap().serialize(&[b"late".to_vec()]);
    /// assert!(bytes.ends_with(b"\r\n\r\nearly late"));
    /// ```
    pub fn start_response(&mut self, status: &str, headers: Headers) -> BodyWriter<'_> {
        let next = match self.phase.take() {
            Some(Phase::Started(started)) => started.start(status, headers),
            Some(Phase::Unstarted(unstarted)) => unstarted.start(status, headers),
            None => ResponseAssembler::new().start(status, headers),
        };
        self.phase = Some(Phase::Started(next));
        BodyWriter { owner: self }
    }

    /// Indica si la aplicación ya llamó a `start_response`
    pub fn is_started(&self) -> bool {
        matches!(self.phase, Some(Phase::Started(_)))
    }

    /// Pasa al estado `Started`, o falla si la aplicación nunca llamó a
    /// `start_response`
    pub fn into_started(self) -> Result<ResponseAssembler<Started>, ServerError> {
        match self.phase {
            Some(Phase::Started(started)) => Ok(started),
            _ => Err(ServerError::Protocol("start_response was never called")),
        }
    }

    fn push_chunk(&mut self, chunk: &[u8]) {
        if let Some(Phase::Started(started)) = &mut self.phase {
            started.written.push(chunk.to_vec());
        }
    }
}

impl Default for StartResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer devuelto por `start_response` (el `write` de la interfaz)
///
/// Los chunks quedan en buffer y salen antes que el body devuelto.
pub struct BodyWriter<'a> {
    owner: &'a mut StartResponse,
}

impl BodyWriter<'_> {
    pub fn write(&mut self, chunk: &[u8]) -> &mut Self {
        self.owner.push_chunk(chunk);
        self
    }
}

/// Formatea una fecha en formato HTTP (IMF-fixdate, RFC 7231)
///
/// # Ejemplo
/// ```
/// use std::time::{Duration, UNIX_EPOCH};
/// use wsgi_server::gateway::response::http_date;
///
/// let t = UNIX_EPOCH + Duration::from_secs(784111777);
/// assert_eq!(http_date(t), "Sun, 06 Nov 1994 08:49:37 GMT");
/// ```
pub fn http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}
