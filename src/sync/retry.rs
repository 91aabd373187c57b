//! Política de reintentos del sincronizador, como valor inyectable.
//!
//! Modelarla como dato (intentos máximos, función de espera, predicado de
//! credencial) permite probar el upsert con esperas nulas y errores
//! inyectados, sin relojes reales.

use std::time::Duration;

use crate::sync::planilla::ErrorPlanilla;

#[derive(Clone, Copy)]
pub struct PoliticaReintentos {
    pub max_intentos: u32,
    /// Espera previa al intento `n` (1-based; el intento 0 no espera).
    pub espera: fn(u32) -> Duration,
    /// Errores que ameritan refrescar la credencial antes del próximo
    /// intento.
    pub es_refrescable: fn(&ErrorPlanilla) -> bool,
}

fn espera_exponencial(intento: u32) -> Duration {
    // 2^intento segundos: 2s, 4s, ...
    Duration::from_secs(1u64 << intento.min(6))
}

fn espera_nula(_intento: u32) -> Duration {
    Duration::ZERO
}

impl Default for PoliticaReintentos {
    fn default() -> PoliticaReintentos {
        PoliticaReintentos {
            max_intentos: 3,
            espera: espera_exponencial,
            es_refrescable: ErrorPlanilla::es_credencial,
        }
    }
}

impl PoliticaReintentos {
    /// Variante sin espera para tests.
    pub fn sin_espera() -> PoliticaReintentos {
        PoliticaReintentos {
            espera: espera_nula,
            ..PoliticaReintentos::default()
        }
    }
}

impl std::fmt::Debug for PoliticaReintentos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoliticaReintentos")
            .field("max_intentos", &self.max_intentos)
            .finish()
    }
}
