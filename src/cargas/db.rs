//! Persistencia de cargas sobre SQLite (conexiones de vida corta).

use rusqlite::{OptionalExtension, Row, params};

use crate::db::Almacen;
use crate::errors::Error;
use crate::models::{Carga, EstadoCarga, Periodicidad};

fn fila_a_carga(row: &Row<'_>) -> rusqlite::Result<Carga> {
    let periodicidad: String = row.get(4)?;
    let estado: String = row.get(14)?;
    Ok(Carga {
        id: row.get(0)?,
        indicador_id: row.get(1)?,
        compromiso_id: row.get(2)?,
        ministerio_id: row.get(3)?,
        periodicidad: Periodicidad::from_str(&periodicidad).unwrap_or(Periodicidad::Mensual),
        periodo: row.get(5)?,
        mes: row.get(6)?,
        valor: row.get(7)?,
        unidad: row.get(8)?,
        meta: row.get(9)?,
        fuente: row.get(10)?,
        responsable: row.get(11)?,
        responsable_email: row.get(12)?,
        observaciones: row.get(13)?,
        estado: EstadoCarga::from_str(&estado).unwrap_or(EstadoCarga::Borrador),
        publicado: row.get::<_, i64>(15)? != 0,
        creado_por: row.get(16)?,
        actualizado_por: row.get(17)?,
        creado_en: row.get(18)?,
        actualizado_en: row.get(19)?,
    })
}

const COLUMNAS: &str = "id, indicador_id, compromiso_id, ministerio_id, periodicidad, periodo, mes, \
     valor, unidad, meta, fuente, responsable, responsable_email, observaciones, estado, \
     publicado, creado_por, actualizado_por, creado_en, actualizado_en";

/// Inserta la carga y devuelve el id asignado. Un choque con el índice único
/// de cargas activas se traduce a `Error::Precondicion` (el perdedor de una
/// creación concurrente recibe conflicto, nunca un registro fusionado).
pub fn insertar(almacen: &Almacen, carga: &Carga) -> Result<i64, Error> {
    let conn = almacen.conexion()?;
    conn.execute(
        "INSERT INTO cargas (indicador_id, compromiso_id, ministerio_id, periodicidad, periodo, \
         mes, valor, unidad, meta, fuente, responsable, responsable_email, observaciones, estado, \
         publicado, creado_por, actualizado_por, creado_en, actualizado_en)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            carga.indicador_id,
            carga.compromiso_id,
            carga.ministerio_id,
            carga.periodicidad.as_str(),
            carga.periodo,
            carga.mes,
            carga.valor,
            carga.unidad,
            carga.meta,
            carga.fuente,
            carga.responsable,
            carga.responsable_email,
            carga.observaciones,
            carga.estado.as_str(),
            carga.publicado as i64,
            carga.creado_por,
            carga.actualizado_por,
            carga.creado_en,
            carga.actualizado_en,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn obtener(almacen: &Almacen, id: i64) -> Result<Carga, Error> {
    let conn = almacen.conexion()?;
    let sql = format!("SELECT {} FROM cargas WHERE id = ?1", COLUMNAS);
    conn.query_row(&sql, params![id], fila_a_carga)
        .optional()?
        .ok_or_else(|| Error::NoEncontrado(format!("carga {}", id)))
}

pub fn actualizar(almacen: &Almacen, carga: &Carga) -> Result<(), Error> {
    let conn = almacen.conexion()?;
    let cambiadas = conn.execute(
        "UPDATE cargas SET periodo = ?1, mes = ?2, valor = ?3, unidad = ?4, meta = ?5, \
         fuente = ?6, responsable = ?7, responsable_email = ?8, observaciones = ?9, estado = ?10, \
         publicado = ?11, actualizado_por = ?12, actualizado_en = ?13
         WHERE id = ?14",
        params![
            carga.periodo,
            carga.mes,
            carga.valor,
            carga.unidad,
            carga.meta,
            carga.fuente,
            carga.responsable,
            carga.responsable_email,
            carga.observaciones,
            carga.estado.as_str(),
            carga.publicado as i64,
            carga.actualizado_por,
            carga.actualizado_en,
            carga.id,
        ],
    )?;
    if cambiadas == 0 {
        return Err(Error::NoEncontrado(format!("carga {}", carga.id)));
    }
    Ok(())
}

pub fn eliminar(almacen: &Almacen, id: i64) -> Result<(), Error> {
    let conn = almacen.conexion()?;
    let borradas = conn.execute("DELETE FROM cargas WHERE id = ?1", params![id])?;
    if borradas == 0 {
        return Err(Error::NoEncontrado(format!("carga {}", id)));
    }
    Ok(())
}

/// `true` si existe una carga no terminal (borrador o pendiente) para el
/// triple (indicador, período, ministerio).
pub fn existe_no_terminal(
    almacen: &Almacen,
    indicador_id: i64,
    periodo: &str,
    ministerio_id: i64,
) -> Result<bool, Error> {
    let conn = almacen.conexion()?;
    let cuenta: i64 = conn.query_row(
        "SELECT COUNT(*) FROM cargas
         WHERE indicador_id = ?1 AND periodo = ?2 AND ministerio_id = ?3
           AND estado IN ('borrador', 'pendiente')",
        params![indicador_id, periodo, ministerio_id],
        |row| row.get(0),
    )?;
    Ok(cuenta > 0)
}

/// Devuelve la carga no terminal del triple, si existe.
pub fn buscar_no_terminal(
    almacen: &Almacen,
    indicador_id: i64,
    periodo: &str,
    ministerio_id: i64,
) -> Result<Option<Carga>, Error> {
    let conn = almacen.conexion()?;
    let sql = format!(
        "SELECT {} FROM cargas
         WHERE indicador_id = ?1 AND periodo = ?2 AND ministerio_id = ?3
           AND estado IN ('borrador', 'pendiente')
         LIMIT 1",
        COLUMNAS
    );
    Ok(conn
        .query_row(&sql, params![indicador_id, periodo, ministerio_id], fila_a_carga)
        .optional()?)
}

pub fn listar_por_estado(almacen: &Almacen, estado: EstadoCarga) -> Result<Vec<Carga>, Error> {
    let conn = almacen.conexion()?;
    let sql = format!("SELECT {} FROM cargas WHERE estado = ?1 ORDER BY id", COLUMNAS);
    let mut stmt = conn.prepare(&sql)?;
    let filas = stmt.query_map(params![estado.as_str()], fila_a_carga)?;
    let mut out = Vec::new();
    for f in filas {
        out.push(f?);
    }
    Ok(out)
}

/// Conteo por estado para el tablero de estadísticas.
pub fn contar_por_estado(almacen: &Almacen) -> Result<Vec<(String, i64)>, Error> {
    let conn = almacen.conexion()?;
    let mut stmt =
        conn.prepare("SELECT estado, COUNT(*) FROM cargas GROUP BY estado ORDER BY estado")?;
    let filas = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut out = Vec::new();
    for f in filas {
        out.push(f?);
    }
    Ok(out)
}
