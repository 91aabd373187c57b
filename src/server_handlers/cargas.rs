//! Handlers del flujo de revisión de cargas.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::json;

use crate::cargas;
use crate::cargas::db as cargas_db;
use crate::db::Almacen;
use crate::errors::Error;
use crate::models::{Carga, EdicionCarga, NuevaCarga};
use crate::server::EstadoSync;
use crate::server_handlers::actor_desde;

fn respuesta_carga(carga: &Carga) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "id": carga.id,
        "estado": carga.estado,
        "publicado": carga.publicado,
        "actualizado_en": carga.actualizado_en,
    }))
}

/// POST /cargas
/// Alta de una carga. Con `"borrador": true` queda en borrador; el camino
/// del formulario web crea directamente en pendiente.
pub async fn crear_carga_handler(
    req: HttpRequest,
    body: web::Json<NuevaCarga>,
    almacen: web::Data<Almacen>,
) -> Result<HttpResponse, Error> {
    let actor = actor_desde(&req)?;
    let carga = cargas::crear(&almacen, &actor, &body.into_inner())?;
    Ok(HttpResponse::Created().json(json!({
        "id": carga.id,
        "estado": carga.estado,
        "actualizado_en": carga.actualizado_en,
    })))
}

/// GET /cargas/{id}
pub async fn obtener_carga_handler(
    path: web::Path<i64>,
    almacen: web::Data<Almacen>,
) -> Result<HttpResponse, Error> {
    let carga = cargas_db::obtener(&almacen, path.into_inner())?;
    Ok(HttpResponse::Ok().json(carga))
}

/// PUT /cargas/{id}
pub async fn editar_carga_handler(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<EdicionCarga>,
    almacen: web::Data<Almacen>,
) -> Result<HttpResponse, Error> {
    let actor = actor_desde(&req)?;
    let carga = cargas::editar(&almacen, &actor, path.into_inner(), &body.into_inner())?;
    Ok(respuesta_carga(&carga))
}

/// POST /cargas/{id}/enviar
pub async fn enviar_carga_handler(
    req: HttpRequest,
    path: web::Path<i64>,
    almacen: web::Data<Almacen>,
) -> Result<HttpResponse, Error> {
    let actor = actor_desde(&req)?;
    let carga = cargas::enviar(&almacen, &actor, path.into_inner())?;
    Ok(respuesta_carga(&carga))
}

#[derive(Debug, Deserialize)]
pub struct PedidoRevision {
    pub decision: String,
    #[serde(default)]
    pub observaciones: Option<String>,
}

/// POST /cargas/{id}/revisar
/// Decisión del revisor. `observar` y `rechazar` exigen observaciones; al
/// validar se encola la proyección hacia la planilla pública.
pub async fn revisar_carga_handler(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<PedidoRevision>,
    almacen: web::Data<Almacen>,
    sync: web::Data<EstadoSync>,
) -> Result<HttpResponse, Error> {
    let actor = actor_desde(&req)?;
    let pedido = body.into_inner();
    let decision = cargas::DecisionRevision::from_str(&pedido.decision).ok_or_else(|| {
        Error::Validacion(format!(
            "decisión desconocida: '{}' (se espera validar, observar o rechazar)",
            pedido.decision
        ))
    })?;
    let carga = cargas::revisar(
        &almacen,
        &actor,
        path.into_inner(),
        decision,
        pedido.observaciones.as_deref(),
        Some(&sync.tx),
    )?;
    Ok(respuesta_carga(&carga))
}

/// DELETE /cargas/{id}
pub async fn eliminar_carga_handler(
    req: HttpRequest,
    path: web::Path<i64>,
    almacen: web::Data<Almacen>,
) -> Result<HttpResponse, Error> {
    let actor = actor_desde(&req)?;
    let id = path.into_inner();
    cargas::eliminar(&almacen, &actor, id)?;
    Ok(HttpResponse::Ok().json(json!({ "id": id, "eliminada": true })))
}

/// GET /estadisticas
/// Conteo de cargas por estado para el tablero.
pub async fn estadisticas_handler(almacen: web::Data<Almacen>) -> Result<HttpResponse, Error> {
    let conteos = cargas_db::contar_por_estado(&almacen)?;
    let total: i64 = conteos.iter().map(|(_, n)| n).sum();
    let por_estado: serde_json::Map<String, serde_json::Value> = conteos
        .into_iter()
        .map(|(estado, n)| (estado, json!(n)))
        .collect();
    Ok(HttpResponse::Ok().json(json!({ "total": total, "por_estado": por_estado })))
}
