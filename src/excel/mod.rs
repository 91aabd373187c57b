//! Módulo `excel` dividido en submódulos para mantener el código organizado.
//!
//! Submódulos:
//! - `io`: helpers y utilidades para lectura/parseo de celdas
//! - `cargas`: lectura heurística de planillas de cargas ministeriales

/// Helpers de IO y utilidades para parsing de Excel
pub mod io;

/// Lectura de planillas de cargas: `leer_planilla_cargas`
pub mod cargas;

// Re-exports de alto nivel; los helpers de IO quedan accesibles para la
// importación y el sincronizador.
pub use cargas::{
    ColumnasHoja, CompromisoParseado, HojaMinisterio, leer_planilla_cargas, parsear_hoja,
};
pub use io::{extraer_numero, normalizar_nombre};
