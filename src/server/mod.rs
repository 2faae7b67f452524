//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes, una a la vez
//! 3. Lee y parsea la request line
//! 4. Llama a la aplicación y envía la respuesta
//! 5. Cierra la conexión

pub mod connection;
pub mod listener;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use connection::{Connection, ConnectionHandler};
pub use listener::{Listener, ServerAddress};
pub use tcp::{make_server, Server};
