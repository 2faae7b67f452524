//! # Errores del Servidor
//! src/error.rs
//!
//! Taxonomía de errores del servidor. Solo `Bind` y `Config` pueden
//! terminar el proceso; el resto se contiene dentro de la conexión que
//! los produjo y se responde con un status 4xx/5xx.

use crate::http::StatusCode;
use std::net::SocketAddr;
use thiserror::Error;

/// Errores que pueden ocurrir en el servidor
#[derive(Debug, Error)]
pub enum ServerError {
    /// No se pudo crear/bindear el socket de escucha (puerto ocupado, permisos)
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Request line inválida o bytes que no son UTF-8
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// El request supera el tamaño máximo permitido sin terminar los headers
    #[error("request exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },

    /// La aplicación no llamó a start_response antes de devolver el body
    #[error("protocol error: {0}")]
    Protocol(&'static str),

    /// La aplicación devolvió un error o hizo panic
    #[error("application error: {0}")]
    Application(String),

    /// Error de I/O sobre la conexión
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuración inválida
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ServerError {
    /// Construye un error de bind a partir de la dirección solicitada
    pub fn bind(addr: SocketAddr, source: std::io::Error) -> Self {
        ServerError::Bind {
            addr: addr.to_string(),
            source,
        }
    }

    /// Código de salida del proceso cuando el error llega a `main`
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Status con el que se responde al cliente cuando el error ocurre
    /// dentro de una conexión.
    ///
    /// `None` significa que no hay respuesta posible (el socket falló).
    ///
    /// # Ejemplo
    /// ```
    /// use wsgi_server::error::ServerError;
    /// use wsgi_server::http::StatusCode;
    ///
    /// let err = ServerError::MalformedRequest("GET".into());
    /// assert_eq!(err.status(), Some(StatusCode::BadRequest));
    /// ```
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ServerError::MalformedRequest(_) | ServerError::RequestTooLarge { .. } => {
                Some(StatusCode::BadRequest)
            }
            ServerError::Protocol(_) | ServerError::Application(_) => {
                Some(StatusCode::InternalServerError)
            }
            ServerError::Bind { .. } | ServerError::Io(_) | ServerError::Config(_) => None,
        }
    }
}
