//! # Interfaz de Gateway
//!
//! Convención de llamada entre el servidor y la aplicación:
//!
//! ```text
//! Environment ──► Application::call(env, start_response) ──► body
//!                          │
//!                          └─► start_response(status, headers)
//! ```
//!
//! La aplicación recibe el environment del request y la capacidad
//! `StartResponse`, fija status y headers, y devuelve el body como una
//! secuencia de chunks de bytes.

pub mod environ;   // Environment y su construcción
pub mod response;  // Protocolo de respuesta en dos fases

pub use environ::{EnvValue, Environment, EnvironmentBuilder, ErrorStream, ServerMeta};
pub use response::{BodyWriter, Headers, ResponseAssembler, StartResponse, Started, Unstarted};

/// Body de la respuesta: chunks de bytes en orden
pub type Body = Vec<Vec<u8>>;

/// Error que puede devolver una aplicación
pub type AppError = Box<dyn std::error::Error + Send + Sync>;

/// Una aplicación que atiende requests
///
/// Cualquier closure o función con la firma adecuada implementa este trait.
///
/// # Ejemplo
/// ```
/// use wsgi_server::gateway::{AppError, Application, Body, Environment, StartResponse};
///
/// fn hello(_env: &Environment, start: &mut StartResponse) -> Result<Body, AppError> {
///     start.start_response("200 OK", vec![("Content-Type".into(), "text/plain".into())]);
///     Ok(vec![b"hello".to_vec()])
/// }
///
/// fn assert_app<A: Application>(_: &A) {}
/// assert_app(&hello);
/// ```
pub trait Application: Send + Sync {
    fn call(&self, env: &Environment, start: &mut StartResponse) -> Result<Body, AppError>;
}

impl<F> Application for F
where
    F: Fn(&Environment, &mut StartResponse) -> Result<Body, AppError> + Send + Sync,
{
    fn call(&self, env: &Environment, start: &mut StartResponse) -> Result<Body, AppError> {
        self(env, start)
    }
}
