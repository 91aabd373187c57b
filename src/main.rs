// --- Seguimiento de Compromisos - Archivo principal ---

use seguimiento::run_server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv::dotenv();
    env_logger::init();

    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    log::info!("iniciando servidor en http://{}", bind);
    run_server(&bind).await
}
