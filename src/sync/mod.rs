//! Sincronización de cargas validadas hacia la planilla pública.
//!
//! Submódulos:
//! - `planilla`: puerto `ServicioPlanilla` y el workbook xlsx concreto
//! - `destino`: pestaña destino y contrato de columnas
//! - `retry`: política de reintentos como valor
//! - `upsert`: el upsert idempotente y la resincronización masiva
//!
//! La máquina de estados no llama al sincronizador: le encola una
//! `SolicitudSync` por un canal de una sola vía y sigue. El worker de este
//! módulo drena el canal y proyecta cada fila con mejor esfuerzo; ninguna
//! falla de acá vuelve al flujo de revisión.

pub mod destino;
pub mod planilla;
pub mod retry;
pub mod upsert;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::catalogo;
use crate::db::Almacen;
use crate::errors::Error;
use crate::models::{Carga, FilaHecho};

pub use destino::{ENCABEZADOS, resolver_nombre_pestana, sanear_nombre_pestana};
pub use planilla::{ErrorPlanilla, PlanillaXlsx, ServicioPlanilla};
pub use retry::PoliticaReintentos;
pub use upsert::{ResumenSync, sincronizar_mejor_esfuerzo, sincronizar_todo, upsert_fila};

/// Pedido de proyección de una carga ya validada.
#[derive(Debug)]
pub struct SolicitudSync {
    pub fila: Box<FilaHecho>,
}

/// Arma la fila de hecho resolviendo los nombres contra el catálogo.
pub fn fila_desde_carga(almacen: &Almacen, carga: &Carga) -> Result<FilaHecho, Error> {
    let (indicador, compromiso, ministerio) =
        catalogo::contexto_indicador(almacen, carga.indicador_id)?;
    Ok(FilaHecho {
        carga_id: carga.id,
        ministerio: ministerio.nombre,
        compromiso: compromiso.titulo,
        indicador_id: indicador.id,
        indicador: indicador.nombre,
        periodicidad: carga.periodicidad,
        periodo: carga.periodo.clone(),
        mes: carga.mes.clone(),
        valor: carga.valor,
        unidad: carga.unidad.clone(),
        meta: carga.meta,
        fuente: carga.fuente.clone(),
        responsable: carga.responsable.clone(),
        responsable_email: carga.responsable_email.clone(),
        observaciones: carga.observaciones.clone().unwrap_or_default(),
        estado: carga.estado,
        publicado: carga.publicado,
        creado_en: carga.creado_en.clone(),
        actualizado_en: carga.actualizado_en.clone(),
    })
}

/// Lanza el worker que drena las solicitudes de sincronización y devuelve el
/// extremo emisor para la máquina de estados.
pub fn iniciar_worker(
    servicio: Arc<dyn ServicioPlanilla>,
    politica: PoliticaReintentos,
) -> mpsc::Sender<SolicitudSync> {
    let (tx, mut rx) = mpsc::channel::<SolicitudSync>(100);
    tokio::spawn(async move {
        while let Some(solicitud) = rx.recv().await {
            sincronizar_mejor_esfuerzo(servicio.as_ref(), &solicitud.fila, &politica).await;
        }
        log::info!("worker de sincronización terminado");
    });
    tx
}
