//! Taxonomía de errores del flujo de cargas.
//!
//! - `Validacion`: entrada malformada (período que no corresponde a la
//!   periodicidad, observaciones faltantes). Se devuelve antes de persistir
//!   nada.
//! - `Precondicion`: transición desde un estado no permitido, actor sin el
//!   rol/ministerio requerido, o duplicado activo para el mismo triple.
//! - `NoEncontrado`: indicador/carga/ministerio inexistente o inactivo.
//! - `Interno`: fallas de almacenamiento o de IO.
//!
//! Los errores del sincronizador viven aparte (`sync::ErrorPlanilla`) y nunca
//! llegan al llamador del flujo de revisión.

use actix_web::{HttpResponse, http::StatusCode};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("validación: {0}")]
    Validacion(String),

    #[error("precondición no cumplida: {0}")]
    Precondicion(String),

    #[error("no encontrado: {0}")]
    NoEncontrado(String),

    #[error("error interno: {0}")]
    Interno(String),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Error {
        // Un choque con el índice único parcial de cargas activas es la señal
        // de que otro actor ganó la creación para el mismo triple.
        if let rusqlite::Error::SqliteFailure(err, _) = &e {
            if err.code == rusqlite::ErrorCode::ConstraintViolation {
                return Error::Precondicion(
                    "ya existe una carga activa o validada para ese indicador, período y ministerio"
                        .to_string(),
                );
            }
        }
        Error::Interno(format!("base de datos: {}", e))
    }
}

impl actix_web::ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validacion(_) => StatusCode::BAD_REQUEST,
            Error::Precondicion(_) => StatusCode::CONFLICT,
            Error::NoEncontrado(_) => StatusCode::NOT_FOUND,
            Error::Interno(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
