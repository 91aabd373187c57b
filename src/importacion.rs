//! Importación de planillas ministeriales al catálogo y al flujo de cargas.
//!
//! Las hojas parseadas traen texto plano; acá se reconcilian contra el
//! catálogo por nombre normalizado (con un desempate difuso de `strsim`
//! para tolerar tipeos) y se materializan las entidades que falten. Cada
//! valor mensual termina como una carga del flujo normal: el importador no
//! inventa un camino de persistencia propio.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::cargas;
use crate::cargas::db as cargas_db;
use crate::catalogo;
use crate::db::Almacen;
use crate::errors::Error;
use crate::excel::io::normalizar_nombre;
use crate::excel::{CompromisoParseado, HojaMinisterio};
use crate::meses::numero_de_mes;
use crate::models::{Actor, Compromiso, EdicionCarga, Indicador, NuevaCarga, Periodicidad};
use crate::sync::SolicitudSync;

/// Umbral de similitud para aceptar un match difuso de nombres.
const UMBRAL_SIMILITUD: f64 = 0.92;

/// Conteos del resultado de una importación. El parser degrada en vez de
/// fallar, así que el resumen es la única señal de calidad del archivo.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResumenImportacion {
    pub ministerios: usize,
    pub compromisos: usize,
    pub indicadores: usize,
    pub creados: usize,
    pub actualizados: usize,
    pub fallidos: usize,
}

fn buscar_compromiso<'a>(
    existentes: &'a [Compromiso],
    titulo: &str,
) -> Option<&'a Compromiso> {
    let norm = normalizar_nombre(titulo);
    if let Some(c) = existentes.iter().find(|c| normalizar_nombre(&c.titulo) == norm) {
        return Some(c);
    }
    existentes
        .iter()
        .map(|c| (strsim::jaro_winkler(&norm, &normalizar_nombre(&c.titulo)), c))
        .filter(|(similitud, _)| *similitud >= UMBRAL_SIMILITUD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c)
}

fn buscar_indicador<'a>(existentes: &'a [Indicador], nombre: &str) -> Option<&'a Indicador> {
    let norm = normalizar_nombre(nombre);
    if let Some(i) = existentes.iter().find(|i| normalizar_nombre(&i.nombre) == norm) {
        return Some(i);
    }
    existentes
        .iter()
        .map(|i| (strsim::jaro_winkler(&norm, &normalizar_nombre(&i.nombre)), i))
        .filter(|(similitud, _)| *similitud >= UMBRAL_SIMILITUD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, i)| i)
}

/// Importa las hojas parseadas de un workbook.
///
/// `anio` arma el período mensual de cada valor (`"{anio}-{mes:02}"`). Con
/// `validar` en `true` (flujo de backfill del operador) cada carga se valida
/// en el acto y, si hay `notificador`, se encola su proyección.
pub fn importar_hojas(
    almacen: &Almacen,
    actor: &Actor,
    hojas: &[HojaMinisterio],
    anio: i32,
    validar: bool,
    notificador: Option<&mpsc::Sender<SolicitudSync>>,
) -> Result<ResumenImportacion, Error> {
    let mut resumen = ResumenImportacion::default();

    for hoja in hojas.iter() {
        let ministerio = catalogo::buscar_o_crear_ministerio(almacen, &hoja.ministerio)?;
        resumen.ministerios += 1;

        for parseado in hoja.compromisos.iter() {
            let existentes = catalogo::listar_compromisos_de(almacen, ministerio.id)?;
            let compromiso = match buscar_compromiso(&existentes, &parseado.titulo) {
                Some(c) => c.clone(),
                None => {
                    resumen.compromisos += 1;
                    catalogo::crear_compromiso(almacen, ministerio.id, &parseado.titulo)?
                }
            };

            importar_compromiso(
                almacen,
                actor,
                &compromiso,
                parseado,
                anio,
                validar,
                notificador,
                &mut resumen,
            )?;
        }
    }
    Ok(resumen)
}

fn importar_compromiso(
    almacen: &Almacen,
    actor: &Actor,
    compromiso: &Compromiso,
    parseado: &CompromisoParseado,
    anio: i32,
    validar: bool,
    notificador: Option<&mpsc::Sender<SolicitudSync>>,
    resumen: &mut ResumenImportacion,
) -> Result<(), Error> {
    let mut conocidos = catalogo::listar_indicadores_de(almacen, compromiso.id)?;
    let mut ids = Vec::new();
    for nombre in parseado.indicadores.iter() {
        match buscar_indicador(&conocidos, nombre) {
            Some(i) => ids.push(i.id),
            None => {
                // Los valores vienen por mes: el indicador nace mensual.
                let nuevo = catalogo::crear_indicador(
                    almacen,
                    compromiso.id,
                    nombre,
                    Periodicidad::Mensual,
                    "",
                )?;
                resumen.indicadores += 1;
                ids.push(nuevo.id);
                conocidos.push(nuevo);
            }
        }
    }

    // Los valores mensuales quedan acumulados a nivel compromiso (las celdas
    // combinadas no permiten atribuirlos con certeza); se cargan contra el
    // primer indicador del grupo.
    let Some(&indicador_id) = ids.first() else {
        return Ok(());
    };

    let mut meses: Vec<(&String, &f64)> = parseado.valores_mensuales.iter().collect();
    meses.sort_by_key(|(mes, _)| numero_de_mes(mes).unwrap_or(0));

    for (mes, valor) in meses {
        let Some(numero) = numero_de_mes(mes) else {
            resumen.fallidos += 1;
            continue;
        };
        let periodo = format!("{}-{:02}", anio, numero);

        let resultado = cargar_valor(
            almacen,
            actor,
            compromiso,
            indicador_id,
            &periodo,
            mes,
            *valor,
            validar,
            notificador,
        );
        match resultado {
            Ok(actualizada) => {
                if actualizada {
                    resumen.actualizados += 1;
                } else {
                    resumen.creados += 1;
                }
            }
            Err(e) => {
                log::warn!(
                    "no se pudo cargar {} {} del compromiso {}: {}",
                    mes,
                    periodo,
                    compromiso.id,
                    e
                );
                resumen.fallidos += 1;
            }
        }
    }
    Ok(())
}

/// Crea (o actualiza, si había una en curso) la carga de un valor mensual.
/// Devuelve `true` cuando actualizó una existente.
fn cargar_valor(
    almacen: &Almacen,
    actor: &Actor,
    compromiso: &Compromiso,
    indicador_id: i64,
    periodo: &str,
    mes: &str,
    valor: f64,
    validar: bool,
    notificador: Option<&mpsc::Sender<SolicitudSync>>,
) -> Result<bool, Error> {
    let (carga, actualizada) = match cargas_db::buscar_no_terminal(
        almacen,
        indicador_id,
        periodo,
        compromiso.ministerio_id,
    )? {
        Some(existente) => {
            let cambios = EdicionCarga {
                valor: Some(valor),
                mes: Some(mes.to_string()),
                ..EdicionCarga::default()
            };
            (cargas::editar(almacen, actor, existente.id, &cambios)?, true)
        }
        None => {
            let nueva = NuevaCarga {
                indicador_id,
                periodo: periodo.to_string(),
                mes: mes.to_string(),
                valor,
                unidad: String::new(),
                meta: None,
                fuente: "importación de planilla".to_string(),
                responsable: String::new(),
                responsable_email: String::new(),
                observaciones: None,
                borrador: false,
            };
            (cargas::crear(almacen, actor, &nueva)?, false)
        }
    };

    if validar {
        cargas::revisar(
            almacen,
            actor,
            carga.id,
            cargas::DecisionRevision::Validar,
            None,
            notificador,
        )?;
    }
    Ok(actualizada)
}
