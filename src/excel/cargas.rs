//! Lectura heurística de planillas de cargas ministeriales.
//!
//! Cada hoja del workbook representa un ministerio. Las planillas vienen
//! armadas a mano: los compromisos y sus indicadores ocupan celdas combinadas
//! (vacías en las filas de continuación), la numeración es inconsistente y
//! los valores mensuales aparecen como número suelto o embebidos en texto
//! ("39%", "4 casos"). Las heurísticas priorizan recuperar datos por sobre
//! validar esquema, porque el origen no está controlado: una fila que no se
//! reconoce se saltea, nunca aborta la hoja completa.

use std::collections::HashMap;
use std::path::Path;

use calamine::{Reader, open_workbook_auto};
use serde::Serialize;

use crate::excel::io::{cell_to_string, extraer_numero, normalize_header, normalizar_nombre};
use crate::meses::mes_desde_encabezado;

/// Posiciones de columna dentro de una hoja.
#[derive(Debug, Clone, Copy)]
pub struct ColumnasHoja {
    pub compromisos: usize,
    pub indicadores: usize,
    pub mes_inicio: usize,
}

/// Posiciones por defecto cuando los encabezados no se reconocen.
pub const COLUMNAS_DEFECTO: ColumnasHoja = ColumnasHoja {
    compromisos: 1,
    indicadores: 2,
    mes_inicio: 3,
};

/// Hojas conocidas con diagramación propia. El ajuste pisa lo detectado.
const AJUSTES_POR_HOJA: &[(&str, ColumnasHoja)] = &[
    (
        "Jefatura de Gabinete",
        ColumnasHoja { compromisos: 0, indicadores: 1, mes_inicio: 2 },
    ),
    (
        "Ministerio de Seguridad",
        ColumnasHoja { compromisos: 2, indicadores: 3, mes_inicio: 5 },
    ),
    (
        "Ministerio de Hacienda",
        ColumnasHoja { compromisos: 1, indicadores: 3, mes_inicio: 4 },
    ),
];

/// Un compromiso reconstruido con sus indicadores y los valores por mes.
#[derive(Debug, Clone, Serialize)]
pub struct CompromisoParseado {
    pub titulo: String,
    pub indicadores: Vec<String>,
    pub valores_mensuales: HashMap<String, f64>,
}

impl CompromisoParseado {
    fn nuevo(titulo: String) -> CompromisoParseado {
        CompromisoParseado {
            titulo,
            indicadores: Vec::new(),
            valores_mensuales: HashMap::new(),
        }
    }
}

/// El resultado de una hoja: el ministerio (nombre de la hoja) y sus
/// compromisos reconstruidos.
#[derive(Debug, Clone, Serialize)]
pub struct HojaMinisterio {
    pub ministerio: String,
    pub compromisos: Vec<CompromisoParseado>,
}

/// Cadenas de encabezado que se filtran cuando la combinación de celdas las
/// hace aparecer en columnas de datos.
const ENCABEZADOS_CONOCIDOS: &[&str] = &["compromiso", "ministerio", "area", "a traves de"];

fn es_texto_encabezado(texto: &str) -> bool {
    let norm = normalizar_nombre(texto);
    ENCABEZADOS_CONOCIDOS.iter().any(|e| norm.contains(e))
}

/// Convenciones de numeración aceptadas para un compromiso: "A)", "1.",
/// "1 ", "1)" o un dígito inicial a secas. Es una adivinanza deliberada:
/// texto libre que arranque con dígito se clasifica como compromiso.
fn coincide_numeracion(texto: &str) -> bool {
    let t = texto.trim_start();
    let mut chars = t.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some(c) if c.is_alphabetic() => matches!(chars.next(), Some(')')),
        _ => false,
    }
}

fn abre_compromiso(celda: &str) -> bool {
    let t = celda.trim();
    !t.is_empty() && !es_texto_encabezado(t) && t.chars().count() > 3 && coincide_numeracion(t)
}

fn es_indicador(celda: &str) -> bool {
    let t = celda.trim();
    // La guardia de numeración evita que texto de compromiso filtrado a la
    // columna de indicadores se cuente como indicador.
    !t.is_empty() && !es_texto_encabezado(t) && t.chars().count() > 3 && !coincide_numeracion(t)
}

/// Ubica las columnas mirando la fila 0 (encabezados de campo) y la fila 1
/// (encabezados de mes). Lo que no se encuentra cae en la posición por
/// defecto; después se aplican los ajustes por hoja.
fn detectar_columnas(nombre_hoja: &str, filas: &[Vec<String>]) -> ColumnasHoja {
    let mut columnas = COLUMNAS_DEFECTO;

    if let Some(encabezados) = filas.first() {
        for (i, celda) in encabezados.iter().enumerate() {
            let norm = normalize_header(celda);
            if norm.contains("compromiso") {
                columnas.compromisos = i;
            } else if norm.contains("indicador") {
                columnas.indicadores = i;
            }
        }
    }
    if let Some(meses) = filas.get(1) {
        if let Some(primera) = meses.iter().position(|c| mes_desde_encabezado(c).is_some()) {
            columnas.mes_inicio = primera;
        }
    }

    let hoja_norm = normalizar_nombre(nombre_hoja);
    for (hoja, ajuste) in AJUSTES_POR_HOJA.iter() {
        if normalizar_nombre(hoja) == hoja_norm {
            columnas = *ajuste;
        }
    }
    columnas
}

/// Estado del escaneo fila a fila: o todavía no arrancó ningún compromiso, o
/// hay uno abierto acumulando indicadores y valores.
enum EstadoEscaneo {
    SinCompromiso,
    EnCompromiso(CompromisoParseado),
}

/// Cierra el compromiso abierto (si junta al menos un indicador) y lo vuelca
/// a la salida. Los dos eventos de salida del escaneo — compromiso nuevo y
/// fin de hoja — pasan por acá.
fn cerrar_compromiso(estado: &mut EstadoEscaneo, salida: &mut Vec<CompromisoParseado>) {
    if let EstadoEscaneo::EnCompromiso(c) = std::mem::replace(estado, EstadoEscaneo::SinCompromiso)
    {
        if !c.indicadores.is_empty() {
            salida.push(c);
        }
    }
}

/// Reconstruye los compromisos de una hoja ya convertida a texto.
///
/// Devuelve `None` si la hoja no tiene las dos filas de encabezado mínimas.
pub fn parsear_hoja(nombre_hoja: &str, filas: &[Vec<String>]) -> Option<HojaMinisterio> {
    if filas.len() < 2 {
        return None;
    }
    let columnas = detectar_columnas(nombre_hoja, filas);
    let encabezados_mes = &filas[1];

    let mut compromisos = Vec::new();
    let mut estado = EstadoEscaneo::SinCompromiso;

    for fila in filas.iter().skip(2) {
        let celda_compromiso = fila.get(columnas.compromisos).map(String::as_str).unwrap_or("");
        if abre_compromiso(celda_compromiso) {
            cerrar_compromiso(&mut estado, &mut compromisos);
            estado = EstadoEscaneo::EnCompromiso(CompromisoParseado::nuevo(
                celda_compromiso.trim().to_string(),
            ));
        }

        let celda_indicador = fila.get(columnas.indicadores).map(String::as_str).unwrap_or("");
        if let EstadoEscaneo::EnCompromiso(actual) = &mut estado {
            if es_indicador(celda_indicador) {
                actual.indicadores.push(celda_indicador.trim().to_string());

                // Sólo las filas de indicador aportan valores mensuales.
                for col in columnas.mes_inicio..fila.len() {
                    let encabezado =
                        encabezados_mes.get(col).map(String::as_str).unwrap_or("");
                    let Some(mes) = mes_desde_encabezado(encabezado) else { continue };
                    let celda = fila.get(col).map(String::as_str).unwrap_or("");
                    if let Some(valor) = extraer_numero(celda) {
                        // Cero y texto sin número se descartan, no se
                        // almacenan como cero.
                        if valor != 0.0 {
                            actual.valores_mensuales.insert(mes.to_string(), valor);
                        }
                    }
                }
            }
        }
    }
    cerrar_compromiso(&mut estado, &mut compromisos);

    Some(HojaMinisterio {
        ministerio: nombre_hoja.trim().to_string(),
        compromisos,
    })
}

/// Abre el workbook y parsea todas sus hojas. Una hoja ilegible se saltea
/// con un aviso; el archivo entero sólo falla si no puede abrirse.
pub fn leer_planilla_cargas<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<HojaMinisterio>, Box<dyn std::error::Error>> {
    let mut workbook = open_workbook_auto(path.as_ref())?;
    let sheet_names = workbook.sheet_names().to_owned();
    if sheet_names.is_empty() {
        return Err("no se encontraron hojas en el archivo Excel".into());
    }

    let mut hojas = Vec::new();
    for nombre in sheet_names.iter() {
        let range = match workbook.worksheet_range(nombre) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("hoja '{}' ilegible, se saltea: {}", nombre, e);
                continue;
            }
        };
        let filas: Vec<Vec<String>> = range
            .rows()
            .map(|fila| fila.iter().map(cell_to_string).collect())
            .collect();
        match parsear_hoja(nombre, &filas) {
            Some(hoja) => hojas.push(hoja),
            None => log::warn!(
                "hoja '{}' sin filas de encabezado suficientes, se saltea",
                nombre
            ),
        }
    }
    Ok(hojas)
}
