//! Subida e importación de planillas ministeriales.

use std::io::Write;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{Datelike, Utc};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tempfile::NamedTempFile;

use crate::db::Almacen;
use crate::errors::Error;
use crate::excel::leer_planilla_cargas;
use crate::importacion::importar_hojas;
use crate::server::EstadoSync;
use crate::server_handlers::actor_desde;

#[derive(Debug, Deserialize)]
pub struct ParamsImportar {
    /// Año con el que se arma el período mensual de cada valor. Por defecto,
    /// el año en curso.
    #[serde(default)]
    pub anio: Option<i32>,
    /// Valida cada carga importada en el acto (flujo de backfill).
    #[serde(default)]
    pub validar: bool,
    /// Además encola la proyección de lo validado hacia la planilla pública.
    /// Implica `validar`.
    #[serde(default)]
    pub sincronizar: bool,
}

/// Vuelca el primer archivo del multipart a un temporal en disco.
async fn recibir_workbook(payload: &mut Multipart) -> Result<NamedTempFile, Error> {
    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| Error::Validacion(format!("multipart inválido: {}", e)))?;
        if field.content_disposition().get_filename().is_none() {
            continue;
        }
        let mut archivo = NamedTempFile::new()
            .map_err(|e| Error::Interno(format!("no se pudo crear el temporal: {}", e)))?;
        while let Some(chunk) = field.next().await {
            let datos =
                chunk.map_err(|e| Error::Validacion(format!("subida interrumpida: {}", e)))?;
            archivo
                .write_all(&datos)
                .map_err(|e| Error::Interno(format!("no se pudo escribir el temporal: {}", e)))?;
        }
        return Ok(archivo);
    }
    Err(Error::Validacion(
        "el multipart no trae ningún archivo".to_string(),
    ))
}

/// POST /importar
/// Recibe un workbook con una hoja por ministerio, lo parsea con las
/// heurísticas de `excel::cargas` y materializa catálogo y cargas. El
/// archivo nunca falla entero por filas irreconocibles: el resumen devuelve
/// los conteos de creados/actualizados/fallidos.
pub async fn importar_handler(
    req: HttpRequest,
    mut payload: Multipart,
    query: web::Query<ParamsImportar>,
    almacen: web::Data<Almacen>,
    sync: web::Data<EstadoSync>,
) -> Result<HttpResponse, Error> {
    let actor = actor_desde(&req)?;
    if !actor.es_revisor() {
        return Err(Error::Precondicion(
            "importar planillas requiere rol revisor".to_string(),
        ));
    }

    let params = query.into_inner();
    let anio = params.anio.unwrap_or_else(|| Utc::now().year());
    let validar = params.validar || params.sincronizar;

    let archivo = recibir_workbook(&mut payload).await?;
    let hojas = leer_planilla_cargas(archivo.path())
        .map_err(|e| Error::Validacion(format!("no se pudo leer el workbook: {}", e)))?;
    log::info!("workbook recibido: {} hojas parseadas", hojas.len());

    let notificador = params.sincronizar.then_some(&sync.tx);
    let resumen = importar_hojas(&almacen, &actor, &hojas, anio, validar, notificador)?;

    Ok(HttpResponse::Ok().json(json!({
        "hojas": hojas.len(),
        "resumen": resumen,
    })))
}
