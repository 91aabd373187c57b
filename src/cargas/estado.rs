//! Máquina de estados de la carga.
//!
//! Las transiciones permitidas son:
//!
//! ```text
//! crear ──► borrador ──enviar──► pendiente ──revisar──► validada | observada | rechazada
//!   └──────────────────────────────► pendiente (alta directa del formulario web)
//! ```
//!
//! `validada`, `observada` y `rechazada` son terminales: no existe reintento
//! sobre el mismo registro, un valor observado o rechazado se vuelve a cargar
//! como carga nueva. Toda transición estampa `actualizado_por` y
//! `actualizado_en`.

use chrono::Utc;
use tokio::sync::mpsc;

use crate::cargas::db;
use crate::catalogo;
use crate::db::Almacen;
use crate::errors::Error;
use crate::models::{Actor, Carga, EdicionCarga, EstadoCarga, NuevaCarga};
use crate::periodo::validar_periodo;
use crate::sync::{SolicitudSync, fila_desde_carga};

/// Resultado posible de una revisión.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionRevision {
    Validar,
    Observar,
    Rechazar,
}

impl DecisionRevision {
    pub fn from_str(s: &str) -> Option<DecisionRevision> {
        match s.trim().to_lowercase().as_str() {
            "validar" | "validada" => Some(DecisionRevision::Validar),
            "observar" | "observada" => Some(DecisionRevision::Observar),
            "rechazar" | "rechazada" => Some(DecisionRevision::Rechazar),
            _ => None,
        }
    }

    fn estado_destino(&self) -> EstadoCarga {
        match self {
            DecisionRevision::Validar => EstadoCarga::Validada,
            DecisionRevision::Observar => EstadoCarga::Observada,
            DecisionRevision::Rechazar => EstadoCarga::Rechazada,
        }
    }
}

/// Crea una carga en `borrador` (camino estándar) o directamente en
/// `pendiente` (alta del formulario web, `datos.borrador == false`).
///
/// Precondiciones, en orden: el indicador existe y está activo; el actor está
/// autorizado para el ministerio destino; el período es válido para la
/// periodicidad del indicador; no hay otra carga no terminal para el mismo
/// triple. La periodicidad se copia del indicador y no se vuelve a tocar.
pub fn crear(almacen: &Almacen, actor: &Actor, datos: &NuevaCarga) -> Result<Carga, Error> {
    let (indicador, compromiso, ministerio) =
        catalogo::contexto_indicador(almacen, datos.indicador_id)?;
    if !indicador.activo {
        return Err(Error::NoEncontrado(format!(
            "el indicador {} está inactivo",
            indicador.id
        )));
    }
    if !actor.autorizado_para(ministerio.id) {
        return Err(Error::Precondicion(format!(
            "el actor '{}' no está autorizado para el ministerio '{}'",
            actor.email, ministerio.nombre
        )));
    }

    validar_periodo(&datos.periodo, indicador.periodicidad)?;

    if db::existe_no_terminal(almacen, indicador.id, &datos.periodo, ministerio.id)? {
        return Err(Error::Precondicion(format!(
            "ya existe una carga en curso para el indicador {} en el período '{}'",
            indicador.id, datos.periodo
        )));
    }

    let ahora = Utc::now().to_rfc3339();
    let estado = if datos.borrador {
        EstadoCarga::Borrador
    } else {
        EstadoCarga::Pendiente
    };

    let mut carga = Carga {
        id: 0,
        indicador_id: indicador.id,
        compromiso_id: compromiso.id,
        ministerio_id: ministerio.id,
        periodicidad: indicador.periodicidad,
        periodo: datos.periodo.trim().to_string(),
        mes: datos.mes.trim().to_string(),
        valor: datos.valor,
        unidad: if datos.unidad.is_empty() {
            indicador.unidad.clone()
        } else {
            datos.unidad.clone()
        },
        meta: datos.meta,
        fuente: datos.fuente.clone(),
        responsable: datos.responsable.clone(),
        responsable_email: datos.responsable_email.clone(),
        observaciones: datos.observaciones.clone(),
        estado,
        publicado: false,
        creado_por: actor.email.clone(),
        actualizado_por: actor.email.clone(),
        creado_en: ahora.clone(),
        actualizado_en: ahora,
    };
    carga.id = db::insertar(almacen, &carga)?;
    Ok(carga)
}

/// Edita una carga sin cambiarle el estado. Permitido sólo en `borrador`, o
/// en `pendiente` cuando el actor es revisor. Si cambia el período se vuelve
/// a validar contra la periodicidad copiada.
pub fn editar(
    almacen: &Almacen,
    actor: &Actor,
    id: i64,
    cambios: &EdicionCarga,
) -> Result<Carga, Error> {
    let mut carga = db::obtener(almacen, id)?;

    let permitido = match carga.estado {
        EstadoCarga::Borrador => carga.creado_por == actor.email || actor.es_revisor(),
        EstadoCarga::Pendiente => actor.es_revisor(),
        _ => false,
    };
    if !permitido {
        return Err(Error::Precondicion(format!(
            "la carga {} en estado '{}' no puede editarse por '{}' (se requiere borrador, o pendiente con rol revisor)",
            id,
            carga.estado.as_str(),
            actor.email
        )));
    }

    if let Some(periodo) = &cambios.periodo {
        validar_periodo(periodo, carga.periodicidad)?;
        carga.periodo = periodo.trim().to_string();
    }
    if let Some(mes) = &cambios.mes {
        carga.mes = mes.trim().to_string();
    }
    if let Some(valor) = cambios.valor {
        carga.valor = valor;
    }
    if let Some(unidad) = &cambios.unidad {
        carga.unidad = unidad.clone();
    }
    if let Some(meta) = cambios.meta {
        carga.meta = Some(meta);
    }
    if let Some(fuente) = &cambios.fuente {
        carga.fuente = fuente.clone();
    }
    if let Some(responsable) = &cambios.responsable {
        carga.responsable = responsable.clone();
    }
    if let Some(email) = &cambios.responsable_email {
        carga.responsable_email = email.clone();
    }
    if let Some(obs) = &cambios.observaciones {
        carga.observaciones = Some(obs.clone());
    }

    carga.actualizado_por = actor.email.clone();
    carga.actualizado_en = Utc::now().to_rfc3339();
    db::actualizar(almacen, &carga)?;
    Ok(carga)
}

/// Pasa un borrador a `pendiente`. Sólo el creador o un revisor.
pub fn enviar(almacen: &Almacen, actor: &Actor, id: i64) -> Result<Carga, Error> {
    let mut carga = db::obtener(almacen, id)?;
    if carga.estado != EstadoCarga::Borrador {
        return Err(Error::Precondicion(format!(
            "sólo un borrador puede enviarse; la carga {} está en '{}'",
            id,
            carga.estado.as_str()
        )));
    }
    if carga.creado_por != actor.email && !actor.es_revisor() {
        return Err(Error::Precondicion(format!(
            "'{}' no puede enviar la carga {}: se requiere ser el creador o revisor",
            actor.email, id
        )));
    }
    carga.estado = EstadoCarga::Pendiente;
    carga.actualizado_por = actor.email.clone();
    carga.actualizado_en = Utc::now().to_rfc3339();
    db::actualizar(almacen, &carga)?;
    Ok(carga)
}

/// Resuelve una carga pendiente. Sólo revisores. `observar` y `rechazar`
/// exigen observaciones no vacías; `validar` marca `publicado` y notifica al
/// sincronizador DESPUÉS de confirmar el estado.
///
/// La notificación es de una sola vía: cualquier falla del sincronizador se
/// registra y se absorbe, el estado de la carga ya quedó confirmado.
pub fn revisar(
    almacen: &Almacen,
    actor: &Actor,
    id: i64,
    decision: DecisionRevision,
    observaciones: Option<&str>,
    notificador: Option<&mpsc::Sender<SolicitudSync>>,
) -> Result<Carga, Error> {
    if !actor.es_revisor() {
        return Err(Error::Precondicion(format!(
            "'{}' no puede revisar cargas: se requiere rol revisor",
            actor.email
        )));
    }

    let mut carga = db::obtener(almacen, id)?;
    if carga.estado != EstadoCarga::Pendiente {
        return Err(Error::Precondicion(format!(
            "sólo una carga pendiente puede revisarse; la carga {} está en '{}'",
            id,
            carga.estado.as_str()
        )));
    }

    let obs = observaciones.map(str::trim).filter(|s| !s.is_empty());
    if obs.is_none() && decision != DecisionRevision::Validar {
        return Err(Error::Validacion(
            "observar o rechazar una carga exige observaciones no vacías".to_string(),
        ));
    }

    carga.estado = decision.estado_destino();
    if let Some(texto) = obs {
        carga.observaciones = Some(texto.to_string());
    }
    if carga.estado == EstadoCarga::Validada {
        carga.publicado = true;
    }
    carga.actualizado_por = actor.email.clone();
    carga.actualizado_en = Utc::now().to_rfc3339();
    db::actualizar(almacen, &carga)?;

    if carga.estado == EstadoCarga::Validada {
        notificar_sincronizacion(almacen, &carga, notificador);
    }
    Ok(carga)
}

/// Emite la solicitud de proyección hacia la planilla externa. Mejor
/// esfuerzo: nunca devuelve error ni toca el estado ya confirmado.
fn notificar_sincronizacion(
    almacen: &Almacen,
    carga: &Carga,
    notificador: Option<&mpsc::Sender<SolicitudSync>>,
) {
    let Some(tx) = notificador else { return };
    match fila_desde_carga(almacen, carga) {
        Ok(fila) => {
            if let Err(e) = tx.try_send(SolicitudSync { fila: Box::new(fila) }) {
                log::warn!(
                    "no se pudo encolar la sincronización de la carga {}: {}",
                    carga.id,
                    e
                );
            }
        }
        Err(e) => {
            log::warn!(
                "no se pudo armar la fila de la carga {} para sincronizar: {}",
                carga.id,
                e
            );
        }
    }
}

/// Elimina una carga en `borrador` o `pendiente`. Sólo el creador o un
/// revisor.
pub fn eliminar(almacen: &Almacen, actor: &Actor, id: i64) -> Result<(), Error> {
    let carga = db::obtener(almacen, id)?;
    if carga.estado.es_terminal() {
        return Err(Error::Precondicion(format!(
            "la carga {} está en el estado terminal '{}' y no puede eliminarse",
            id,
            carga.estado.as_str()
        )));
    }
    if carga.creado_por != actor.email && !actor.es_revisor() {
        return Err(Error::Precondicion(format!(
            "'{}' no puede eliminar la carga {}: se requiere ser el creador o revisor",
            actor.email, id
        )));
    }
    db::eliminar(almacen, id)
}
