//! Consultas sobre el catálogo (ministerios, compromisos, indicadores).
//!
//! El catálogo es una dependencia de sólo lectura para el flujo de revisión;
//! las funciones de alta existen para que la importación de planillas pueda
//! materializar entidades nuevas.

use rusqlite::{OptionalExtension, params};

use crate::db::Almacen;
use crate::errors::Error;
use crate::models::{Compromiso, Indicador, Ministerio, Periodicidad};

fn fila_a_indicador(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, i64, String, String, String, bool)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get::<_, i64>(5)? != 0,
    ))
}

fn armar_indicador(
    (id, compromiso_id, nombre, periodicidad, unidad, activo): (i64, i64, String, String, String, bool),
) -> Result<Indicador, Error> {
    let periodicidad = Periodicidad::from_str(&periodicidad).ok_or_else(|| {
        Error::Interno(format!("periodicidad desconocida en catálogo: '{}'", periodicidad))
    })?;
    Ok(Indicador { id, compromiso_id, nombre, periodicidad, unidad, activo })
}

pub fn indicador_por_id(almacen: &Almacen, id: i64) -> Result<Indicador, Error> {
    let conn = almacen.conexion()?;
    let fila = conn
        .query_row(
            "SELECT id, compromiso_id, nombre, periodicidad, unidad, activo
             FROM indicadores WHERE id = ?1",
            params![id],
            fila_a_indicador,
        )
        .optional()?;
    match fila {
        Some(f) => armar_indicador(f),
        None => Err(Error::NoEncontrado(format!("indicador {}", id))),
    }
}

pub fn compromiso_por_id(almacen: &Almacen, id: i64) -> Result<Compromiso, Error> {
    let conn = almacen.conexion()?;
    conn.query_row(
        "SELECT id, ministerio_id, titulo FROM compromisos WHERE id = ?1",
        params![id],
        |row| {
            Ok(Compromiso {
                id: row.get(0)?,
                ministerio_id: row.get(1)?,
                titulo: row.get(2)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| Error::NoEncontrado(format!("compromiso {}", id)))
}

pub fn ministerio_por_id(almacen: &Almacen, id: i64) -> Result<Ministerio, Error> {
    let conn = almacen.conexion()?;
    conn.query_row(
        "SELECT id, nombre FROM ministerios WHERE id = ?1",
        params![id],
        |row| Ok(Ministerio { id: row.get(0)?, nombre: row.get(1)? }),
    )
    .optional()?
    .ok_or_else(|| Error::NoEncontrado(format!("ministerio {}", id)))
}

/// Resuelve la cadena completa indicador → compromiso → ministerio. Se usa
/// antes de cada transición de estado y antes de cada escritura del
/// sincronizador (resolución de nombres).
pub fn contexto_indicador(
    almacen: &Almacen,
    indicador_id: i64,
) -> Result<(Indicador, Compromiso, Ministerio), Error> {
    let indicador = indicador_por_id(almacen, indicador_id)?;
    let compromiso = compromiso_por_id(almacen, indicador.compromiso_id)?;
    let ministerio = ministerio_por_id(almacen, compromiso.ministerio_id)?;
    Ok((indicador, compromiso, ministerio))
}

pub fn ministerio_por_nombre(almacen: &Almacen, nombre: &str) -> Result<Option<Ministerio>, Error> {
    let conn = almacen.conexion()?;
    Ok(conn
        .query_row(
            "SELECT id, nombre FROM ministerios WHERE nombre = ?1",
            params![nombre.trim()],
            |row| Ok(Ministerio { id: row.get(0)?, nombre: row.get(1)? }),
        )
        .optional()?)
}

pub fn crear_ministerio(almacen: &Almacen, nombre: &str) -> Result<Ministerio, Error> {
    let conn = almacen.conexion()?;
    conn.execute("INSERT INTO ministerios (nombre) VALUES (?1)", params![nombre.trim()])?;
    let id = conn.last_insert_rowid();
    Ok(Ministerio { id, nombre: nombre.trim().to_string() })
}

pub fn buscar_o_crear_ministerio(almacen: &Almacen, nombre: &str) -> Result<Ministerio, Error> {
    match ministerio_por_nombre(almacen, nombre)? {
        Some(m) => Ok(m),
        None => crear_ministerio(almacen, nombre),
    }
}

pub fn listar_compromisos_de(almacen: &Almacen, ministerio_id: i64) -> Result<Vec<Compromiso>, Error> {
    let conn = almacen.conexion()?;
    let mut stmt = conn.prepare(
        "SELECT id, ministerio_id, titulo FROM compromisos WHERE ministerio_id = ?1 ORDER BY id",
    )?;
    let filas = stmt.query_map(params![ministerio_id], |row| {
        Ok(Compromiso {
            id: row.get(0)?,
            ministerio_id: row.get(1)?,
            titulo: row.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for f in filas {
        out.push(f?);
    }
    Ok(out)
}

pub fn crear_compromiso(almacen: &Almacen, ministerio_id: i64, titulo: &str) -> Result<Compromiso, Error> {
    let conn = almacen.conexion()?;
    conn.execute(
        "INSERT INTO compromisos (ministerio_id, titulo) VALUES (?1, ?2)",
        params![ministerio_id, titulo.trim()],
    )?;
    Ok(Compromiso {
        id: conn.last_insert_rowid(),
        ministerio_id,
        titulo: titulo.trim().to_string(),
    })
}

pub fn listar_indicadores_de(almacen: &Almacen, compromiso_id: i64) -> Result<Vec<Indicador>, Error> {
    let conn = almacen.conexion()?;
    let mut stmt = conn.prepare(
        "SELECT id, compromiso_id, nombre, periodicidad, unidad, activo
         FROM indicadores WHERE compromiso_id = ?1 ORDER BY id",
    )?;
    let filas = stmt.query_map(params![compromiso_id], fila_a_indicador)?;
    let mut out = Vec::new();
    for f in filas {
        out.push(armar_indicador(f?)?);
    }
    Ok(out)
}

pub fn crear_indicador(
    almacen: &Almacen,
    compromiso_id: i64,
    nombre: &str,
    periodicidad: Periodicidad,
    unidad: &str,
) -> Result<Indicador, Error> {
    let conn = almacen.conexion()?;
    conn.execute(
        "INSERT INTO indicadores (compromiso_id, nombre, periodicidad, unidad, activo)
         VALUES (?1, ?2, ?3, ?4, 1)",
        params![compromiso_id, nombre.trim(), periodicidad.as_str(), unidad],
    )?;
    Ok(Indicador {
        id: conn.last_insert_rowid(),
        compromiso_id,
        nombre: nombre.trim().to_string(),
        periodicidad,
        unidad: unidad.to_string(),
        activo: true,
    })
}
