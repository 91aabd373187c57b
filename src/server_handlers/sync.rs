//! Resincronización masiva hacia la planilla pública.

use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;

use crate::db::Almacen;
use crate::errors::Error;
use crate::server::EstadoSync;
use crate::server_handlers::actor_desde;
use crate::sync::sincronizar_todo;

/// POST /sincronizar
/// Reproyecta todas las cargas validadas. Si la planilla no responde al
/// chequeo previo, la operación entera se aborta sin escribir nada; las
/// fallas fila a fila sólo se cuentan en el resumen.
pub async fn sincronizar_handler(
    req: HttpRequest,
    almacen: web::Data<Almacen>,
    sync: web::Data<EstadoSync>,
) -> Result<HttpResponse, Error> {
    let actor = actor_desde(&req)?;
    if !actor.es_revisor() {
        return Err(Error::Precondicion(
            "la resincronización masiva requiere rol revisor".to_string(),
        ));
    }

    let resumen = sincronizar_todo(&almacen, sync.servicio.as_ref(), &sync.politica).await?;
    Ok(HttpResponse::Ok().json(json!({ "resumen": resumen })))
}
