//! Apertura e inicialización de la base SQLite de catálogo y cargas.
//!
//! Igual que el resto del sistema, las conexiones son de vida corta: cada
//! operación abre, ejecuta y cierra. La ruta del archivo sale de
//! `CARGAS_DB_PATH` (se honra un `.env` si existe).

use std::env;
use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;

use crate::errors::Error;

fn load_dotenv() {
    let _ = dotenv::dotenv();
}

/// Ruta por defecto cuando no hay variable de entorno.
pub const RUTA_DB_DEFECTO: &str = "data/cargas.db";

/// Handle liviano sobre la base: sólo guarda la ruta, las conexiones se abren
/// por operación.
#[derive(Debug, Clone)]
pub struct Almacen {
    ruta: PathBuf,
}

impl Almacen {
    pub fn nuevo<P: Into<PathBuf>>(ruta: P) -> Almacen {
        Almacen { ruta: ruta.into() }
    }

    /// Resuelve la ruta desde `CARGAS_DB_PATH` (o el valor por defecto).
    pub fn desde_env() -> Almacen {
        load_dotenv();
        let ruta = env::var("CARGAS_DB_PATH").unwrap_or_else(|_| RUTA_DB_DEFECTO.to_string());
        Almacen::nuevo(ruta)
    }

    pub fn ruta(&self) -> &PathBuf {
        &self.ruta
    }

    /// Abre una conexión de vida corta.
    pub fn conexion(&self) -> Result<Connection, Error> {
        Ok(Connection::open(&self.ruta)?)
    }

    /// Crea el directorio, las tablas y los índices si no existen.
    ///
    /// El índice único parcial sobre cargas implementa la regla de "una sola
    /// carga activa por (indicador, período, ministerio)": cubre los estados
    /// `pendiente` y `validada`, de modo que un dato ya validado bloquea la
    /// recarga del mismo triple y dos creaciones concurrentes resuelven con
    /// exactamente un ganador.
    pub fn init_db(&self) -> Result<(), Error> {
        if let Some(dir) = self.ruta.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)
                    .map_err(|e| Error::Interno(format!("no se pudo crear {:?}: {}", dir, e)))?;
            }
        }

        let conn = self.conexion()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS ministerios (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nombre TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS compromisos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ministerio_id INTEGER NOT NULL REFERENCES ministerios(id),
                titulo TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS indicadores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                compromiso_id INTEGER NOT NULL REFERENCES compromisos(id),
                nombre TEXT NOT NULL,
                periodicidad TEXT NOT NULL,
                unidad TEXT NOT NULL DEFAULT '',
                activo INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS cargas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                indicador_id INTEGER NOT NULL REFERENCES indicadores(id),
                compromiso_id INTEGER NOT NULL REFERENCES compromisos(id),
                ministerio_id INTEGER NOT NULL REFERENCES ministerios(id),
                periodicidad TEXT NOT NULL,
                periodo TEXT NOT NULL,
                mes TEXT NOT NULL,
                valor REAL NOT NULL,
                unidad TEXT NOT NULL DEFAULT '',
                meta REAL,
                fuente TEXT NOT NULL DEFAULT '',
                responsable TEXT NOT NULL DEFAULT '',
                responsable_email TEXT NOT NULL DEFAULT '',
                observaciones TEXT,
                estado TEXT NOT NULL,
                publicado INTEGER NOT NULL DEFAULT 0,
                creado_por TEXT NOT NULL,
                actualizado_por TEXT NOT NULL,
                creado_en TEXT NOT NULL,
                actualizado_en TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_cargas_activas
                ON cargas (indicador_id, periodo, ministerio_id)
                WHERE estado IN ('pendiente', 'validada');",
        )?;
        Ok(())
    }
}
