//! # WSGI Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada: resuelve la aplicación `module:callable` y sirve para
//! siempre en el host/puerto configurados.

use tracing::error;
use wsgi_server::apps::AppRegistry;
use wsgi_server::config::Config;
use wsgi_server::logging;

fn main() {
    // Sin argumento, clap muestra el uso y termina
    let config = Config::new();
    logging::init(&config.log_level);

    let registry = AppRegistry::with_builtin();
    let app = match registry.resolve(&config.app) {
        Ok(app) => app,
        Err(e) => {
            error!("{}", e);
            std::process::exit(e.exit_code());
        }
    };

    let server = match wsgi_server::make_server(&config, app) {
        Ok(server) => server,
        Err(e) => {
            error!("Error fatal: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    // Esto bloquea el thread
    server.serve_forever()
}
