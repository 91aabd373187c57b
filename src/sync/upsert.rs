//! Upsert idempotente de filas de hecho sobre la planilla pública.
//!
//! Cada fila validada se proyecta así: se resuelve la pestaña del
//! ministerio, se aprovisiona la pestaña y su encabezado si hace falta, se
//! busca una fila existente con la misma clave (indicador, período, mes) y
//! se actualiza en su lugar — o se agrega al final si no está. Todo el ciclo
//! corre bajo la política de reintentos; agotados los intentos el error se
//! registra y se absorbe: la proyección es mejor esfuerzo, nunca una
//! frontera transaccional del flujo de revisión.

use serde::Serialize;

use crate::cargas::db as cargas_db;
use crate::db::Almacen;
use crate::errors::Error;
use crate::models::{EstadoCarga, FilaHecho};
use crate::sync::destino::{
    coincide_fila, encabezado_vigente, encabezados, fila_a_celdas, resolver_nombre_pestana,
};
use crate::sync::fila_desde_carga;
use crate::sync::planilla::{ErrorPlanilla, ServicioPlanilla};
use crate::sync::retry::PoliticaReintentos;

/// Un ciclo completo de upsert, sin reintentos.
fn intentar_upsert(servicio: &dyn ServicioPlanilla, fila: &FilaHecho) -> Result<(), ErrorPlanilla> {
    let pestana = resolver_nombre_pestana(&fila.ministerio);

    // Aprovisionamiento de pestaña y migración idempotente de encabezado.
    let pestanas = servicio.listar_pestanas()?;
    if !pestanas.iter().any(|p| p == &pestana) {
        servicio.crear_pestana(&pestana)?;
        servicio.actualizar_valores(&pestana, 1, &encabezados())?;
    } else {
        let filas = servicio.leer_valores(&pestana)?;
        let vigente = filas.first().map(|f| encabezado_vigente(f)).unwrap_or(false);
        if !vigente {
            servicio.actualizar_valores(&pestana, 1, &encabezados())?;
        }
    }

    // Ubicación de la fila: misma clave (indicador, período, mes) → update
    // en el lugar; sin coincidencia → append.
    let filas = servicio.leer_valores(&pestana)?;
    let celdas = fila_a_celdas(fila);
    for (indice, existente) in filas.iter().enumerate().skip(1) {
        if coincide_fila(existente, fila) {
            servicio.actualizar_valores(&pestana, (indice + 1) as u32, &celdas)?;
            return Ok(());
        }
    }
    servicio.agregar_fila(&pestana, &celdas)
}

/// Ejecuta el upsert bajo la política de reintentos.
///
/// Ante un error refrescable se intenta renovar la credencial antes del
/// siguiente intento; ante cualquier otro sólo se espera el backoff. El
/// error del último intento se devuelve para que el llamador lo registre —
/// ninguna capa superior debe dejar que afecte el estado de la carga.
pub async fn upsert_fila(
    servicio: &dyn ServicioPlanilla,
    fila: &FilaHecho,
    politica: &PoliticaReintentos,
) -> Result<(), ErrorPlanilla> {
    let mut ultimo: Option<ErrorPlanilla> = None;
    for intento in 0..politica.max_intentos {
        if intento > 0 {
            tokio::time::sleep((politica.espera)(intento)).await;
        }
        match intentar_upsert(servicio, fila) {
            Ok(()) => return Ok(()),
            Err(e) => {
                log::warn!(
                    "upsert de la carga {} falló (intento {}/{}): {}",
                    fila.carga_id,
                    intento + 1,
                    politica.max_intentos,
                    e
                );
                if (politica.es_refrescable)(&e) {
                    if let Err(re) = servicio.refrescar_credencial() {
                        log::warn!("refresco de credencial falló: {}", re);
                    }
                }
                ultimo = Some(e);
            }
        }
    }
    Err(ultimo.unwrap_or_else(|| ErrorPlanilla::Red("sin intentos configurados".to_string())))
}

/// Frontera de mejor esfuerzo: registra y absorbe el resultado.
pub async fn sincronizar_mejor_esfuerzo(
    servicio: &dyn ServicioPlanilla,
    fila: &FilaHecho,
    politica: &PoliticaReintentos,
) {
    match upsert_fila(servicio, fila, politica).await {
        Ok(()) => log::info!(
            "carga {} proyectada a la pestaña '{}'",
            fila.carga_id,
            resolver_nombre_pestana(&fila.ministerio)
        ),
        Err(e) => log::error!(
            "la carga {} no pudo proyectarse tras {} intentos: {}",
            fila.carga_id,
            politica.max_intentos,
            e
        ),
    }
}

/// Resultado de una resincronización masiva.
#[derive(Debug, Clone, Serialize)]
pub struct ResumenSync {
    pub total: usize,
    pub exitosas: usize,
    pub fallidas: usize,
}

/// Resincroniza todas las cargas validadas.
///
/// El chequeo de conexión va primero y aborta la operación completa antes de
/// cualquier escritura. Las pestañas se procesan en orden (las filas llegan
/// agrupadas por pestaña destino), de modo que nunca hay dos escrituras en
/// vuelo sobre la misma pestaña. Las fallas individuales se registran y se
/// cuentan, sin cortar el resto.
pub async fn sincronizar_todo(
    almacen: &Almacen,
    servicio: &dyn ServicioPlanilla,
    politica: &PoliticaReintentos,
) -> Result<ResumenSync, Error> {
    servicio
        .verificar_conexion()
        .map_err(|e| Error::Interno(format!("la planilla externa no responde: {}", e)))?;

    let validadas = cargas_db::listar_por_estado(almacen, EstadoCarga::Validada)?;

    let mut filas = Vec::new();
    for carga in validadas.iter() {
        match fila_desde_carga(almacen, carga) {
            Ok(fila) => filas.push(fila),
            Err(e) => {
                log::warn!("carga {} sin contexto de catálogo, se saltea: {}", carga.id, e);
            }
        }
    }
    filas.sort_by_key(|f| resolver_nombre_pestana(&f.ministerio));

    let total = validadas.len();
    let mut exitosas = 0usize;
    for fila in filas.iter() {
        match upsert_fila(servicio, fila, politica).await {
            Ok(()) => exitosas += 1,
            Err(e) => log::error!("resync de la carga {} falló: {}", fila.carga_id, e),
        }
    }
    Ok(ResumenSync {
        total,
        exitosas,
        fallidas: total - exitosas,
    })
}
