//! # Módulo HTTP
//!
//! Subconjunto mínimo de HTTP/1.1 que el servidor necesita:
//!
//! - Parsing de la request line (método, path, versión)
//! - Códigos de estado para las respuestas que genera el propio servidor
//!
//! ### Formato de Response
//!
//! La respuesta siempre sale como `HTTP/1.1`, sin importar la versión que
//! pidió el cliente:
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/plain\r\n
//! Date: Thu, 15 Oct 2026 10:00:00 GMT\r\n
//! Server: WSGIServer 0.2\r\n
//! \r\n
//! Hello
//! ```
//!
//! La serialización vive en `gateway::response`, porque depende del
//! protocolo de dos fases con la aplicación.

pub mod request;   // Parsing de la request line
pub mod status;    // Códigos de estado HTTP

pub use request::ParsedRequest;
pub use status::StatusCode;
