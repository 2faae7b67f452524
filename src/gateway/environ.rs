//! # Environment por Request
//! src/gateway/environ.rs
//!
//! El environment es el único canal por el que los datos del request llegan
//! a la aplicación. Se construye una vez por request a partir de la
//! request line parseada y de la metadata del servidor, y la aplicación lo
//! recibe por referencia (solo lectura).
//!
//! ## Esquema
//!
//! | Clave               | Tipo                         |
//! |---------------------|------------------------------|
//! | `wsgi.version`      | `(1, 0)`                     |
//! | `wsgi.input`        | stream sobre el request crudo|
//! | `wsgi.url_scheme`   | `"http"`                     |
//! | `wsgi.errors`       | stream hacia el log          |
//! | `wsgi.multithread`  | `false`                      |
//! | `wsgi.multiprocess` | `false`                      |
//! | `wsgi.run_once`     | `false`                      |
//! | `REQUEST_METHOD`    | string                       |
//! | `PATH_INFO`         | string                       |
//! | `SERVER_NAME`       | string                       |
//! | `SERVER_PORT`       | string                       |
//! | `SERVER_PROTOCOL`   | string                       |

use crate::http::ParsedRequest;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::io::{self, Cursor, Write};
use std::net::SocketAddr;
use tracing::{debug, warn};

/// Versión de la interfaz de gateway que implementa el servidor
pub const GATEWAY_VERSION: (u8, u8) = (1, 0);

/// Claves del environment, en el orden en que se exponen
pub const KEYS: [&str; 12] = [
    "wsgi.version",
    "wsgi.input",
    "wsgi.url_scheme",
    "wsgi.errors",
    "wsgi.multithread",
    "wsgi.multiprocess",
    "wsgi.run_once",
    "REQUEST_METHOD",
    "PATH_INFO",
    "SERVER_NAME",
    "SERVER_PORT",
    "SERVER_PROTOCOL",
];

/// Stream de lectura sobre el request crudo (`wsgi.input`)
pub type InputStream<'a> = Cursor<&'a [u8]>;

/// Metadata del servidor que se resuelve una sola vez al arrancar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerMeta {
    /// Nombre del servidor (DNS inverso de la dirección bindeada)
    pub server_name: String,

    /// Puerto real en el que escucha (resuelto si se pidió el puerto 0)
    pub server_port: u16,
}

impl ServerMeta {
    /// Resuelve el nombre del servidor para la dirección bindeada
    ///
    /// Si la dirección es `0.0.0.0`/`::` se usa el hostname de la máquina;
    /// si el DNS inverso falla se usa la IP en texto.
    pub fn resolve(addr: SocketAddr) -> Self {
        let ip = addr.ip();
        let lookup = if ip.is_unspecified() {
            dns_lookup::get_hostname()
        } else {
            dns_lookup::lookup_addr(&ip)
        };

        let server_name = match lookup {
            Ok(name) if !name.is_empty() => name,
            Ok(_) => ip.to_string(),
            Err(e) => {
                warn!(%ip, error = %e, "DNS inverso falló, usando la IP como SERVER_NAME");
                ip.to_string()
            }
        };
        debug!(%server_name, port = addr.port(), "metadata del servidor resuelta");

        Self {
            server_name,
            server_port: addr.port(),
        }
    }

    /// Metadata con un nombre fijo (sin consultar DNS)
    pub fn with_name(server_name: impl Into<String>, server_port: u16) -> Self {
        Self {
            server_name: server_name.into(),
            server_port,
        }
    }
}

/// Environment inmutable de un request
#[derive(Debug, Clone)]
pub struct Environment {
    raw_request: String,
    request_method: String,
    path_info: String,
    server_protocol: String,
    server_name: String,
    server_port: String,
}

/// Valor de una clave del environment
#[derive(Debug)]
pub enum EnvValue<'a> {
    Str(&'a str),
    Bool(bool),
    Version(u8, u8),
    Input(InputStream<'a>),
    Errors(ErrorStream),
}

impl Environment {
    /// `wsgi.version`
    pub fn version(&self) -> (u8, u8) {
        GATEWAY_VERSION
    }

    /// `wsgi.input`: un stream nuevo, posicionado al inicio del request crudo
    ///
    /// # Ejemplo
    /// ```
    /// use std::io::Read;
    /// use wsgi_server::gateway::{EnvironmentBuilder, ServerMeta};
    /// use wsgi_server::http::ParsedRequest;
    ///
    /// let raw = "GET / HTTP/1.1\r\nHost: x\r\n\r\n";
    /// let builder = EnvironmentBuilder::new(ServerMeta::with_name("localhost", 8888));
    /// let env = builder.build(&ParsedRequest::parse(raw).unwrap(), raw);
    ///
    /// let mut text = String::new();
    /// env.input().read_to_string(&mut text).unwrap();
    /// assert_eq!(text, raw);
    /// ```
    pub fn input(&self) -> InputStream<'_> {
        Cursor::new(self.raw_request.as_bytes())
    }

    /// `wsgi.url_scheme`
    pub fn url_scheme(&self) -> &str {
        "http"
    }

    /// `wsgi.errors`: las líneas escritas aquí terminan en el log del servidor
    pub fn errors(&self) -> ErrorStream {
        ErrorStream::default()
    }

    /// `wsgi.multithread`
    pub fn multithread(&self) -> bool {
        false
    }

    /// `wsgi.multiprocess`
    pub fn multiprocess(&self) -> bool {
        false
    }

    /// `wsgi.run_once`
    pub fn run_once(&self) -> bool {
        false
    }

    /// `REQUEST_METHOD`
    pub fn request_method(&self) -> &str {
        &self.request_method
    }

    /// `PATH_INFO`
    pub fn path_info(&self) -> &str {
        &self.path_info
    }

    /// `SERVER_NAME`
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// `SERVER_PORT`
    pub fn server_port(&self) -> &str {
        &self.server_port
    }

    /// `SERVER_PROTOCOL`
    pub fn server_protocol(&self) -> &str {
        &self.server_protocol
    }

    /// Acceso por clave, como un mapping
    pub fn get(&self, key: &str) -> Option<EnvValue<'_>> {
        let value = match key {
            "wsgi.version" => EnvValue::Version(GATEWAY_VERSION.0, GATEWAY_VERSION.1),
            "wsgi.input" => EnvValue::Input(self.input()),
            "wsgi.url_scheme" => EnvValue::Str(self.url_scheme()),
            "wsgi.errors" => EnvValue::Errors(self.errors()),
            "wsgi.multithread" => EnvValue::Bool(self.multithread()),
            "wsgi.multiprocess" => EnvValue::Bool(self.multiprocess()),
            "wsgi.run_once" => EnvValue::Bool(self.run_once()),
            "REQUEST_METHOD" => EnvValue::Str(&self.request_method),
            "PATH_INFO" => EnvValue::Str(&self.path_info),
            "SERVER_NAME" => EnvValue::Str(&self.server_name),
            "SERVER_PORT" => EnvValue::Str(&self.server_port),
            "SERVER_PROTOCOL" => EnvValue::Str(&self.server_protocol),
            _ => return None,
        };
        Some(value)
    }

    /// Todas las claves del environment
    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        KEYS.into_iter()
    }

    /// Largo en bytes del request crudo
    pub fn content_len(&self) -> usize {
        self.raw_request.len()
    }
}

impl Serialize for EnvValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EnvValue::Str(s) => serializer.serialize_str(s),
            EnvValue::Bool(b) => serializer.serialize_bool(*b),
            EnvValue::Version(major, minor) => [*major, *minor].serialize(serializer),
            EnvValue::Input(cursor) => {
                serializer.serialize_str(&format!("<input: {} bytes>", cursor.get_ref().len()))
            }
            EnvValue::Errors(_) => serializer.serialize_str("<errors>"),
        }
    }
}

impl Serialize for Environment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(KEYS.len()))?;
        for key in KEYS {
            if let Some(value) = self.get(key) {
                map.serialize_entry(key, &value)?;
            }
        }
        map.end()
    }
}

/// Stream de errores para la aplicación (`wsgi.errors`)
///
/// Acumula hasta fin de línea y emite cada línea como un evento `warn`
/// con target `wsgi_server::errors`.
#[derive(Debug, Default)]
pub struct ErrorStream {
    pending: Vec<u8>,
}

impl ErrorStream {
    fn emit(&mut self, upto: usize) {
        let line: Vec<u8> = self.pending.drain(..upto).collect();
        let text = String::from_utf8_lossy(&line);
        let text = text.trim_end_matches(['\r', '\n']);
        if !text.is_empty() {
            warn!(target: "wsgi_server::errors", "{}", text);
        }
    }
}

impl Write for ErrorStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            self.emit(pos + 1);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let len = self.pending.len();
        self.emit(len);
        Ok(())
    }
}

impl Drop for ErrorStream {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            let len = self.pending.len();
            self.emit(len);
        }
    }
}

/// Construye environments a partir de la metadata del servidor
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    meta: ServerMeta,
}

impl EnvironmentBuilder {
    pub fn new(meta: ServerMeta) -> Self {
        Self { meta }
    }

    pub fn meta(&self) -> &ServerMeta {
        &self.meta
    }

    /// Arma el environment de un request. No hace I/O.
    pub fn build(&self, request: &ParsedRequest, raw_request: &str) -> Environment {
        Environment {
            raw_request: raw_request.to_string(),
            request_method: request.method().to_string(),
            path_info: request.path().to_string(),
            server_protocol: request.version().to_string(),
            server_name: self.meta.server_name.clone(),
            server_port: self.meta.server_port.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn build(raw: &str) -> Environment {
        let builder = EnvironmentBuilder::new(ServerMeta::with_name("test.local", 8888));
        let request = ParsedRequest::parse(raw).unwrap();
        builder.build(&request, raw)
    }

    #[test]
    fn test_all_keys_present() {
        let env = build("GET /foo HTTP/1.1\r\n\r\n");

        assert_eq!(env.keys().count(), 12);
        for key in env.keys() {
            assert!(env.get(key).is_some(), "missing key {}", key);
        }
        assert!(env.get("HTTP_HOST").is_none());
    }

    #[test]
    fn test_flag_types() {
        let env = build("GET /foo HTTP/1.1\r\n\r\n");

        for key in ["wsgi.multithread", "wsgi.multiprocess", "wsgi.run_once"] {
            assert!(matches!(env.get(key), Some(EnvValue::Bool(false))), "key {}", key);
        }
        assert!(matches!(env.get("wsgi.version"), Some(EnvValue::Version(1, 0))));
        assert!(matches!(env.get("wsgi.input"), Some(EnvValue::Input(_))));
        assert!(matches!(env.get("wsgi.errors"), Some(EnvValue::Errors(_))));
    }

    #[test]
    fn test_request_fields() {
        let env = build("POST /submit?x=1 HTTP/1.0\r\nHost: a\r\n\r\n");

        assert!(matches!(env.get("REQUEST_METHOD"), Some(EnvValue::Str("POST"))));
        assert!(matches!(env.get("PATH_INFO"), Some(EnvValue::Str("/submit?x=1"))));
        assert!(matches!(env.get("SERVER_NAME"), Some(EnvValue::Str("test.local"))));
        assert!(matches!(env.get("SERVER_PORT"), Some(EnvValue::Str("8888"))));
        assert!(matches!(env.get("SERVER_PROTOCOL"), Some(EnvValue::Str("HTTP/1.0"))));
        assert!(matches!(env.get("wsgi.url_scheme"), Some(EnvValue::Str("http"))));
    }

    #[test]
    fn test_input_is_fresh_each_time() {
        let raw = "GET / HTTP/1.1\r\nX-Test: 1\r\n\r\n";
        let env = build(raw);

        let mut first = String::new();
        env.input().read_to_string(&mut first).unwrap();
        let mut second = String::new();
        env.input().read_to_string(&mut second).unwrap();

        assert_eq!(first, raw);
        assert_eq!(second, raw);
        assert_eq!(env.content_len(), raw.len());
    }

    #[test]
    fn test_environments_are_independent() {
        let builder = EnvironmentBuilder::new(ServerMeta::with_name("test.local", 80));
        let a_raw = "GET /a HTTP/1.1\r\n\r\n";
        let b_raw = "DELETE /b HTTP/1.0\r\n\r\n";
        let a = builder.build(&ParsedRequest::parse(a_raw).unwrap(), a_raw);
        let b = builder.build(&ParsedRequest::parse(b_raw).unwrap(), b_raw);

        assert_eq!(a.path_info(), "/a");
        assert_eq!(a.request_method(), "GET");
        assert_eq!(b.path_info(), "/b");
        assert_eq!(b.request_method(), "DELETE");
    }

    #[test]
    fn test_serialize_to_json() {
        let env = build("GET /json HTTP/1.1\r\n\r\n");
        let value = serde_json::to_value(&env).unwrap();

        assert_eq!(value["wsgi.version"], serde_json::json!([1, 0]));
        assert_eq!(value["wsgi.multithread"], serde_json::json!(false));
        assert_eq!(value["PATH_INFO"], serde_json::json!("/json"));
        assert_eq!(value["SERVER_PORT"], serde_json::json!("8888"));
        assert!(value["wsgi.input"].as_str().unwrap().starts_with("<input:"));
    }

    #[test]
    fn test_error_stream_accepts_writes() {
        let env = build("GET / HTTP/1.1\r\n\r\n");
        let mut errors = env.errors();

        errors.write_all(b"first line\nsecond ").unwrap();
        assert_eq!(errors.pending, b"second ");
        errors.flush().unwrap();
        assert!(errors.pending.is_empty());
    }

    #[test]
    fn test_resolve_unspecified_uses_hostname_or_ip() {
        let meta = ServerMeta::resolve("0.0.0.0:9999".parse().unwrap());

        assert_eq!(meta.server_port, 9999);
        assert!(!meta.server_name.is_empty());
    }
}
