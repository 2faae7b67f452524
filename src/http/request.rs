//! # Parsing de la Request Line
//! src/http/request.rs
//!
//! El servidor solo mira la primera línea del request:
//!
//! ```text
//! GET /path HTTP/1.1\r\n
//! Host: localhost:8888\r\n      <- ignorado
//! \r\n
//! ```
//!
//! Headers y body no se parsean; la aplicación puede leer el request crudo
//! completo desde `wsgi.input` si los necesita.

use crate::error::ServerError;

/// Request line parseada: método, path y versión del protocolo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    /// Método HTTP tal cual llegó (GET, POST, ...)
    method: String,

    /// Path de la petición, sin decodificar (ej: "/foo?bar=1")
    path: String,

    /// Versión declarada por el cliente (ej: "HTTP/1.1")
    version: String,
}

impl ParsedRequest {
    /// Parsea la request line desde texto ya decodificado
    ///
    /// Toma solo la primera línea, quita el `\r\n` final y la separa por
    /// espacios en blanco. Deben quedar exactamente tres tokens.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use wsgi_server::http::ParsedRequest;
    ///
    /// let request = ParsedRequest::parse("GET /foo HTTP/1.1\r\n\r\n").unwrap();
    /// assert_eq!(request.method(), "GET");
    /// assert_eq!(request.path(), "/foo");
    /// assert_eq!(request.version(), "HTTP/1.1");
    /// ```
    pub fn parse(text: &str) -> Result<Self, ServerError> {
        let line = text
            .lines()
            .next()
            .unwrap_or("")
            .trim_end_matches(['\r', '\n']);

        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
            (Some(method), Some(path), Some(version), None) => Ok(ParsedRequest {
                method: method.to_string(),
                path: path.to_string(),
                version: version.to_string(),
            }),
            _ => Err(ServerError::MalformedRequest(format!(
                "expected `METHOD PATH VERSION`, got {:?}",
                line
            ))),
        }
    }

    /// Decodifica los bytes como UTF-8 y parsea la request line
    ///
    /// Bytes que no son UTF-8 válido también son `MalformedRequest`.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, ServerError> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| ServerError::MalformedRequest(format!("invalid UTF-8: {}", e)))?;
        Self::parse(text)
    }

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Obtiene el path del request
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_get() {
        let request = ParsedRequest::parse("GET / HTTP/1.0\r\n\r\n").unwrap();

        assert_eq!(request.method(), "GET");
        assert_eq!(request.path(), "/");
        assert_eq!(request.version(), "HTTP/1.0");
    }

    #[test]
    fn test_parse_independent_of_line_ending() {
        let expected = ParsedRequest::parse("POST /submit HTTP/1.1").unwrap();

        for raw in [
            "POST /submit HTTP/1.1\r\n",
            "POST /submit HTTP/1.1\n",
            "POST /submit HTTP/1.1\r\n\r\n",
            "POST /submit HTTP/1.1\r\nHost: x\r\n\r\nbody",
        ] {
            assert_eq!(ParsedRequest::parse(raw).unwrap(), expected, "input: {:?}", raw);
        }
    }

    #[test]
    fn test_parse_ignores_headers() {
        let raw = "GET /foo?x=1 HTTP/1.1\r\nHost: localhost:8888\r\nUser-Agent: test\r\n\r\n";
        let request = ParsedRequest::parse(raw).unwrap();

        assert_eq!(request.path(), "/foo?x=1");
    }

    #[test]
    fn test_parse_accepts_any_method_and_version() {
        let request = ParsedRequest::parse("BREW /pot HTCPCP/1.0\r\n").unwrap();

        assert_eq!(request.method(), "BREW");
        assert_eq!(request.version(), "HTCPCP/1.0");
    }

    #[test]
    fn test_too_few_tokens() {
        for raw in ["", "\r\n", "GET\r\n\r\n", "GET /\r\n"] {
            assert!(
                matches!(ParsedRequest::parse(raw), Err(ServerError::MalformedRequest(_))),
                "input: {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_too_many_tokens() {
        let result = ParsedRequest::parse("GET / HTTP/1.1 extra\r\n");
        assert!(matches!(result, Err(ServerError::MalformedRequest(_))));
    }

    #[test]
    fn test_from_bytes_invalid_utf8() {
        let result = ParsedRequest::from_bytes(b"GET /\xff\xfe HTTP/1.1\r\n\r\n");
        assert!(matches!(result, Err(ServerError::MalformedRequest(_))));
    }

    #[test]
    fn test_from_bytes_valid() {
        let request = ParsedRequest::from_bytes(b"GET /caf\xc3\xa9 HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.path(), "/café");
    }
}
