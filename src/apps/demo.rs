//! # Aplicaciones de Demostración
//! src/apps/demo.rs
//!
//! Aplicaciones compiladas dentro del binario, seleccionables como
//! `demo:<nombre>` desde la línea de comandos.

use crate::gateway::{AppError, Body, Environment, StartResponse};
use crate::http::StatusCode;
use std::io::Write;

/// `demo:hello`: saludo en texto plano
pub fn hello(env: &Environment, start: &mut StartResponse) -> Result<Body, AppError> {
    let body = format!("Hello, World! ({} {})\n", env.request_method(), env.path_info());
    start.start_response(
        &StatusCode::Ok.to_string(),
        vec![
            ("Content-Type".to_string(), "text/plain".to_string()),
            ("Content-Length".to_string(), body.len().to_string()),
        ],
    );
    Ok(vec![body.into_bytes()])
}

/// `demo:environ`: devuelve el environment del request como JSON
pub fn environ(env: &Environment, start: &mut StartResponse) -> Result<Body, AppError> {
    let body = serde_json::to_vec(env)?;
    start.start_response(
        &StatusCode::Ok.to_string(),
        vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Content-Length".to_string(), body.len().to_string()),
        ],
    );
    Ok(vec![body])
}

/// `demo:fail`: escribe en `wsgi.errors` y falla
///
/// Sirve para ver cómo el servidor convierte el error en un 500.
pub fn fail(env: &Environment, _start: &mut StartResponse) -> Result<Body, AppError> {
    let mut errors = env.errors();
    writeln!(errors, "demo:fail invoked for {}", env.path_info())?;
    Err(format!("intentional failure at {}", env.path_info()).into())
}

/// `demo:not_found`: 404 para cualquier path
pub fn not_found(env: &Environment, start: &mut StartResponse) -> Result<Body, AppError> {
    start.start_response(
        &StatusCode::NotFound.to_string(),
        vec![("Content-Type".to_string(), "text/plain".to_string())],
    );
    Ok(vec![format!("Route not found: {}\n", env.path_info()).into_bytes()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{EnvironmentBuilder, ServerMeta};
    use crate::http::ParsedRequest;

    fn env_for(raw: &str) -> Environment {
        let builder = EnvironmentBuilder::new(ServerMeta::with_name("localhost", 8888));
        builder.build(&ParsedRequest::parse(raw).unwrap(), raw)
    }

    #[test]
    fn test_hello() {
        let env = env_for("GET /hi HTTP/1.1\r\n\r\n");
        let mut start = StartResponse::new();
        let body = hello(&env, &mut start).unwrap();

        let started = start.into_started().unwrap();
        assert_eq!(started.status(), "200 OK");
        assert_eq!(body, vec![b"Hello, World! (GET /hi)\n".to_vec()]);
    }

    #[test]
    fn test_environ_is_json() {
        let env = env_for("GET /env HTTP/1.1\r\n\r\n");
        let mut start = StartResponse::new();
        let body = environ(&env, &mut start).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&body[0]).unwrap();
        assert_eq!(value["REQUEST_METHOD"], "GET");
        assert_eq!(value["SERVER_NAME"], "localhost");
        assert!(start.is_started());
    }

    #[test]
    fn test_fail_returns_error_without_start() {
        let env = env_for("GET /x HTTP/1.1\r\n\r\n");
        let mut start = StartResponse::new();

        assert!(fail(&env, &mut start).is_err());
        assert!(!start.is_started());
    }

    #[test]
    fn test_not_found() {
        let env = env_for("GET /nope HTTP/1.1\r\n\r\n");
        let mut start = StartResponse::new();
        not_found(&env, &mut start).unwrap();

        assert_eq!(start.into_started().unwrap().status(), "404 Not Found");
    }
}
