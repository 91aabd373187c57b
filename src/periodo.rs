//! Validación léxica de períodos contra la periodicidad del indicador.
//!
//! Formatos por periodicidad:
//! - mensual: `YYYY-MM`
//! - trimestral: `YYYYQ1` .. `YYYYQ4`
//! - semestral: `YYYYS1` / `YYYYS2`
//! - anual: `YYYY`
//!
//! Existen además dos literales centinela, válidos para cualquier
//! periodicidad: son las dos ventanas de reporte que todo el sistema usa para
//! los consolidados.

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::Error;
use crate::models::Periodicidad;

/// Ventana centinela: el año de gestión en curso.
pub const PERIODO_ANUAL: &str = "2023";

/// Ventana centinela: el rango completo de la gestión.
pub const PERIODO_GESTION: &str = "2020-2023";

fn regex_mensual() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").unwrap())
}

fn regex_trimestral() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}Q[1-4]$").unwrap())
}

fn regex_semestral() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}S[1-2]$").unwrap())
}

fn regex_anual() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}$").unwrap())
}

/// `true` si `periodo` es uno de los centinelas o calza con el patrón de la
/// periodicidad.
pub fn es_periodo_valido(periodo: &str, periodicidad: Periodicidad) -> bool {
    if periodo == PERIODO_ANUAL || periodo == PERIODO_GESTION {
        return true;
    }
    match periodicidad {
        Periodicidad::Mensual => regex_mensual().is_match(periodo),
        Periodicidad::Trimestral => regex_trimestral().is_match(periodo),
        Periodicidad::Semestral => regex_semestral().is_match(periodo),
        Periodicidad::Anual => regex_anual().is_match(periodo),
    }
}

/// Versión con error tipado; debe invocarse antes de persistir nada.
pub fn validar_periodo(periodo: &str, periodicidad: Periodicidad) -> Result<(), Error> {
    if es_periodo_valido(periodo, periodicidad) {
        Ok(())
    } else {
        Err(Error::Validacion(format!(
            "el período '{}' no corresponde a la periodicidad '{}'",
            periodo,
            periodicidad.as_str()
        )))
    }
}
