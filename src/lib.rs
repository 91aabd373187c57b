// Biblioteca raíz del crate `seguimiento`.
// Reexporta los módulos principales; `run_server` levanta la API completa.
pub mod cargas;
pub mod catalogo;
pub mod db;
pub mod errors;
pub mod excel;
pub mod importacion;
pub mod meses;
pub mod models;
pub mod periodo;
pub mod server;
pub mod server_handlers;
pub mod sync;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;
