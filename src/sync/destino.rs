//! Mapeo hacia la planilla pública: pestaña destino y contrato de columnas.

use crate::excel::io::normalizar_nombre;
use crate::meses::mes_a_nombre;
use crate::models::FilaHecho;

/// Contrato de columnas de cada pestaña. El orden es fijo: renumerar exige
/// pasar por la migración de encabezado del sincronizador.
pub const ENCABEZADOS: [&str; 19] = [
    "ID Carga",
    "Ministerio",
    "Compromiso",
    "ID Indicador",
    "Indicador",
    "Periodicidad",
    "Período",
    "Mes",
    "Valor",
    "Unidad",
    "Meta",
    "Fuente",
    "Responsable",
    "Email Responsable",
    "Observaciones",
    "Estado",
    "Publicado",
    "Creado En",
    "Actualizado En",
];

/// Índices (0-based) de la clave de fila: (ID Indicador, Período, Mes).
pub const COL_INDICADOR_ID: usize = 3;
pub const COL_PERIODO: usize = 6;
pub const COL_MES: usize = 7;

/// Largo máximo de nombre de pestaña que admite el destino.
pub const LARGO_MAX_PESTANA: usize = 31;

/// Pestañas fijas para los ministerios conocidos. El resto deriva su nombre
/// con `sanear_nombre_pestana`.
const PESTANAS_CONOCIDAS: &[(&str, &str)] = &[
    ("Jefatura de Gabinete", "Jefatura_Gabinete"),
    ("Ministerio de Salud", "Salud"),
    ("Ministerio de Educación", "Educacion"),
    ("Ministerio de Seguridad", "Seguridad"),
    ("Ministerio de Hacienda", "Hacienda"),
    ("Ministerio de Desarrollo Social", "Desarrollo_Social"),
    ("Ministerio de Obras Públicas", "Obras_Publicas"),
    ("Ministerio de Ambiente", "Ambiente"),
];

/// Transformación determinística para ministerios fuera de la tabla:
/// conserva alfanuméricos (tildes incluidas), pasa los espacios a guión bajo
/// y recorta al largo máximo de pestaña. Pura, sin red de por medio.
pub fn sanear_nombre_pestana(nombre: &str) -> String {
    let mut out = String::new();
    let mut anterior_guion = false;
    for c in nombre.trim().chars() {
        if c.is_alphanumeric() {
            out.push(c);
            anterior_guion = false;
        } else if c.is_whitespace() && !anterior_guion && !out.is_empty() {
            out.push('_');
            anterior_guion = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out.chars().take(LARGO_MAX_PESTANA).collect()
}

/// Función total ministerio → pestaña: tabla fija primero, derivación
/// saneada después.
pub fn resolver_nombre_pestana(ministerio: &str) -> String {
    let norm = normalizar_nombre(ministerio);
    for (nombre, pestana) in PESTANAS_CONOCIDAS.iter() {
        if normalizar_nombre(nombre) == norm {
            return pestana.to_string();
        }
    }
    sanear_nombre_pestana(ministerio)
}

/// Serializa la fila de hecho en el orden del contrato de columnas. El mes
/// sale siempre con el nombre humano que usa la planilla.
pub fn fila_a_celdas(fila: &FilaHecho) -> Vec<String> {
    vec![
        fila.carga_id.to_string(),
        fila.ministerio.clone(),
        fila.compromiso.clone(),
        fila.indicador_id.to_string(),
        fila.indicador.clone(),
        fila.periodicidad.as_str().to_string(),
        fila.periodo.clone(),
        mes_a_nombre(&fila.mes),
        fila.valor.to_string(),
        fila.unidad.clone(),
        fila.meta.map(|m| m.to_string()).unwrap_or_default(),
        fila.fuente.clone(),
        fila.responsable.clone(),
        fila.responsable_email.clone(),
        fila.observaciones.clone(),
        fila.estado.as_str().to_string(),
        if fila.publicado { "SI" } else { "NO" }.to_string(),
        fila.creado_en.clone(),
        fila.actualizado_en.clone(),
    ]
}

/// `true` si el encabezado actual de la pestaña coincide con el contrato.
pub fn encabezado_vigente(fila_encabezado: &[String]) -> bool {
    fila_encabezado.len() >= ENCABEZADOS.len()
        && ENCABEZADOS
            .iter()
            .zip(fila_encabezado.iter())
            .all(|(esperado, actual)| actual == esperado)
        && fila_encabezado[ENCABEZADOS.len()..]
            .iter()
            .all(|extra| extra.trim().is_empty())
}

/// El encabezado del contrato, listo para escribir.
pub fn encabezados() -> Vec<String> {
    ENCABEZADOS.iter().map(|e| e.to_string()).collect()
}

/// `true` si una fila de datos ya corresponde al mismo hecho (mismo
/// indicador, período y mes que la fila a escribir).
pub fn coincide_fila(fila_destino: &[String], fila: &FilaHecho) -> bool {
    let id = fila_destino.get(COL_INDICADOR_ID).map(String::as_str).unwrap_or("");
    let periodo = fila_destino.get(COL_PERIODO).map(String::as_str).unwrap_or("");
    let mes = fila_destino.get(COL_MES).map(String::as_str).unwrap_or("");
    id == fila.indicador_id.to_string()
        && periodo == fila.periodo
        && mes_a_nombre(mes) == mes_a_nombre(&fila.mes)
}
