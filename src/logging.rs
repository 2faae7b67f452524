//! # Logging
//! src/logging.rs
//!
//! Inicializa `tracing-subscriber`. El nivel sale de `RUST_LOG` si está
//! definida; si no, del `--log-level` de la configuración. Con `debug` se
//! ve el volcado línea a línea de requests (`<`) y respuestas (`>`).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Instala el subscriber global. Llamar una sola vez, desde `main`.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wsgi_server={}", default_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
