pub mod cargas;
pub mod importar;
pub mod sync;

pub use cargas::*;
pub use importar::*;
pub use sync::*;

use actix_web::HttpRequest;

use crate::errors::Error;
use crate::models::{Actor, Rol};

/// Identidad efectiva del pedido. La emisión de sesiones es ajena a este
/// subsistema: acá sólo se leen los encabezados que el frente de
/// autenticación ya resolvió.
pub fn actor_desde(req: &HttpRequest) -> Result<Actor, Error> {
    let email = req
        .headers()
        .get("X-Usuario-Email")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Validacion("falta el encabezado X-Usuario-Email".to_string()))?;

    let rol = req
        .headers()
        .get("X-Usuario-Rol")
        .and_then(|v| v.to_str().ok())
        .and_then(Rol::from_str)
        .unwrap_or(Rol::Usuario);

    let ministerio_id = req
        .headers()
        .get("X-Usuario-Ministerio")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok());

    Ok(Actor {
        email: email.to_string(),
        rol,
        ministerio_id,
    })
}
