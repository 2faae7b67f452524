//! # Registro de Aplicaciones
//! src/apps/mod.rs
//!
//! El servidor recibe la aplicación como `module:callable`. No hay carga
//! dinámica de código, así que el nombre se resuelve contra un registro de
//! aplicaciones compiladas en el binario:
//!
//! ```text
//! "demo:hello" → AppRegistry → Arc<dyn Application>
//! ```

pub mod demo;

use crate::error::ServerError;
use crate::gateway::Application;
use std::sync::Arc;

/// Mensaje de uso cuando el nombre no tiene el formato esperado
pub const USAGE: &str = "Provide the application as module:callable (e.g. demo:hello)";

/// Registro que mapea `module:callable` → aplicación
pub struct AppRegistry {
    apps: Vec<(String, Arc<dyn Application>)>,
}

impl AppRegistry {
    /// Crea un registro vacío
    pub fn new() -> Self {
        Self { apps: Vec::new() }
    }

    /// Registro con las aplicaciones de `demo`
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("demo:hello", demo::hello);
        registry.register("demo:environ", demo::environ);
        registry.register("demo:fail", demo::fail);
        registry.register("demo:not_found", demo::not_found);
        registry
    }

    /// Registra una aplicación bajo un nombre
    ///
    /// # Ejemplo
    /// ```
    /// use wsgi_server::apps::{demo, AppRegistry};
    ///
    /// let mut registry = AppRegistry::new();
    /// registry.register("mine:hello", demo::hello);
    /// assert!(registry.resolve("mine:hello").is_ok());
    /// ```
    pub fn register<A: Application + 'static>(&mut self, name: &str, app: A) {
        self.apps.push((name.to_string(), Arc::new(app)));
    }

    /// Resuelve un nombre `module:callable`
    pub fn resolve(&self, target: &str) -> Result<Arc<dyn Application>, ServerError> {
        let (module, callable) = target
            .split_once(':')
            .filter(|(m, c)| !m.is_empty() && !c.is_empty() && !c.contains(':'))
            .ok_or_else(|| ServerError::Config(format!("{:?}: {}", target, USAGE)))?;

        self.apps
            .iter()
            .find(|(name, _)| name.split_once(':') == Some((module, callable)))
            .map(|(_, app)| Arc::clone(app))
            .ok_or_else(|| {
                ServerError::Config(format!(
                    "unknown application {:?}; available: {}",
                    target,
                    self.names().join(", ")
                ))
            })
    }

    /// Nombres registrados
    pub fn names(&self) -> Vec<&str> {
        self.apps.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl Default for AppRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = AppRegistry::new();
        assert!(registry.names().is_empty());
    }

    #[test]
    fn test_builtin_apps() {
        let registry = AppRegistry::with_builtin();

        assert_eq!(
            registry.names(),
            ["demo:hello", "demo:environ", "demo:fail", "demo:not_found"]
        );
        assert!(registry.resolve("demo:hello").is_ok());
        assert!(registry.resolve("demo:environ").is_ok());
    }

    #[test]
    fn test_resolve_bad_format() {
        let registry = AppRegistry::with_builtin();

        for target in ["demo", "demo:", ":hello", "a:b:c", ""] {
            match registry.resolve(target) {
                Err(ServerError::Config(msg)) => assert!(msg.contains("module:callable"), "{}", msg),
                _ => panic!("expected usage error for {:?}", target),
            }
        }
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = AppRegistry::with_builtin();

        match registry.resolve("demo:missing") {
            Err(ServerError::Config(msg)) => assert!(msg.contains("demo:hello")),
            _ => panic!("expected unknown application error"),
        }
    }
}
