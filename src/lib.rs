//! # WSGI Server
//! src/lib.rs
//!
//! Servidor HTTP mínimo con una interfaz de gateway síncrona: acepta una
//! conexión TCP, parsea la request line, arma el environment del request,
//! llama a la aplicación registrada y escribe status, headers y body de
//! vuelta al socket.
//!
//! ## Arquitectura
//!
//! ```text
//! Listener.accept → bytes → ParsedRequest → Environment
//!     → Application::call(env, start_response) → ResponseAssembler → socket → close
//! ```
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Parsing de la request line y códigos de estado
//! - `gateway`: Contrato con la aplicación (environment, respuesta en dos fases)
//! - `server`: Socket de escucha y manejo de conexiones
//! - `apps`: Registro de aplicaciones y apps de demostración
//! - `config`: Configuración por CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use std::sync::Arc;
//! use wsgi_server::config::Config;
//! use wsgi_server::gateway::{AppError, Body, Environment, StartResponse};
//!
//! fn app(_env: &Environment, start: &mut StartResponse) -> Result<Body, AppError> {
//!     start.start_response("200 OK", vec![("Content-Type".into(), "text/plain".into())]);
//!     Ok(vec![b"Hello".to_vec()])
//! }
//!
//! let config = Config::for_app("custom:app");
//! let server = wsgi_server::make_server(&config, Arc::new(app)).expect("Error al iniciar servidor");
//! server.serve_forever();
//! ```

pub mod apps;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod logging;
pub mod server;

pub use error::ServerError;
pub use server::{make_server, Server};
