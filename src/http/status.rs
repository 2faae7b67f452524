//! # Códigos de Estado HTTP
//!
//! Las aplicaciones entregan el status como texto libre (`"200 OK"`), tal
//! como lo pide la interfaz de gateway. Este módulo solo define los códigos
//! que el propio servidor genera cuando responde en nombre de la
//! aplicación (errores de parsing, fallos de la aplicación) y los que usan
//! las apps de demostración.

/// Códigos de estado que el servidor genera por su cuenta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 400 Bad Request - Request line malformada o request demasiado grande
    BadRequest = 400,

    /// 404 Not Found - Ruta no manejada por la aplicación
    NotFound = 404,

    /// 500 Internal Server Error - La aplicación falló o violó el protocolo
    InternalServerError = 500,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use wsgi_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// Extrae el código numérico de un status en texto libre
    ///
    /// Sirve para loguear lo que devolvió la aplicación.
    ///
    /// # Ejemplo
    /// ```
    /// use wsgi_server::http::StatusCode;
    /// assert_eq!(StatusCode::code_of("404 Not Found"), Some(404));
    /// assert_eq!(StatusCode::code_of("bogus"), None);
    /// ```
    pub fn code_of(status: &str) -> Option<u16> {
        status.split_whitespace().next()?.parse().ok()
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_values() {
        assert_eq!(StatusCode::Ok.as_u16(), 200);
        assert_eq!(StatusCode::BadRequest.as_u16(), 400);
        assert_eq!(StatusCode::NotFound.as_u16(), 404);
        assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::Ok.to_string(), "200 OK");
        assert_eq!(StatusCode::BadRequest.to_string(), "400 Bad Request");
        assert_eq!(StatusCode::InternalServerError.to_string(), "500 Internal Server Error");
    }

    #[test]
    fn test_code_of() {
        assert_eq!(StatusCode::code_of("200 OK"), Some(200));
        assert_eq!(StatusCode::code_of("  503 Service Unavailable"), Some(503));
        assert_eq!(StatusCode::code_of(""), None);
        assert_eq!(StatusCode::code_of("OK 200"), None);
    }
}
