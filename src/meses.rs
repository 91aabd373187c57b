//! Tabla de meses y helpers de conversión.
//!
//! Los encabezados de mes en las planillas cargadas vienen en texto libre
//! (completo o abreviado, castellano o inglés, cualquier capitalización); la
//! planilla pública en cambio usa siempre el nombre completo en castellano.

/// Nombre canónico por mes (1-based) junto con los alias aceptados en
/// encabezados. Los alias se comparan contra tokens normalizados.
const MESES: [(&str, &[&str]); 12] = [
    ("Enero", &["enero", "ene", "january", "jan"]),
    ("Febrero", &["febrero", "feb", "february"]),
    ("Marzo", &["marzo", "mar", "march"]),
    ("Abril", &["abril", "abr", "april", "apr"]),
    ("Mayo", &["mayo", "may"]),
    ("Junio", &["junio", "jun", "june"]),
    ("Julio", &["julio", "jul", "july"]),
    ("Agosto", &["agosto", "ago", "august", "aug"]),
    ("Septiembre", &["septiembre", "setiembre", "sep", "sept", "september"]),
    ("Octubre", &["octubre", "oct", "october"]),
    ("Noviembre", &["noviembre", "nov", "november"]),
    ("Diciembre", &["diciembre", "dic", "december", "dec"]),
];

/// Quita tildes y pasa a minúsculas para comparar texto libre.
pub fn sin_tildes(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'Á' | 'À' | 'Ä' => 'a',
            'é' | 'è' | 'ë' | 'É' | 'È' | 'Ë' => 'e',
            'í' | 'ì' | 'ï' | 'Í' | 'Ì' | 'Ï' => 'i',
            'ó' | 'ò' | 'ö' | 'Ó' | 'Ò' | 'Ö' => 'o',
            'ú' | 'ù' | 'ü' | 'Ú' | 'Ù' | 'Ü' => 'u',
            'ñ' | 'Ñ' => 'n',
            _ => c,
        })
        .collect::<String>()
        .to_lowercase()
}

/// Intenta reconocer un mes en un encabezado de texto libre.
/// Devuelve el nombre canónico en castellano.
pub fn mes_desde_encabezado(encabezado: &str) -> Option<&'static str> {
    let norm = sin_tildes(encabezado.trim());
    if norm.is_empty() {
        return None;
    }
    // Primero el nombre completo como subcadena ("Valores de Enero 2023")
    for (canonico, alias) in MESES.iter() {
        let completo = alias[0];
        if norm.contains(completo) {
            return Some(canonico);
        }
    }
    // Luego alias exactos por token ("Ene.", "SEP", "mar-23")
    for token in norm.split(|c: char| !c.is_ascii_alphabetic()) {
        if token.is_empty() {
            continue;
        }
        for (canonico, alias) in MESES.iter() {
            if alias.iter().any(|a| *a == token) {
                return Some(canonico);
            }
        }
    }
    None
}

/// Número 1..=12 para un nombre o alias de mes.
pub fn numero_de_mes(nombre: &str) -> Option<u32> {
    let norm = sin_tildes(nombre.trim());
    for (i, (_, alias)) in MESES.iter().enumerate() {
        if alias.iter().any(|a| *a == norm) {
            return Some((i + 1) as u32);
        }
    }
    None
}

/// Convierte el mes de un registro (número, código o texto libre) al nombre
/// con el que la planilla pública identifica la fila. Si no se reconoce se
/// devuelve el texto tal cual, recortado.
pub fn mes_a_nombre(mes: &str) -> String {
    let t = mes.trim();
    if let Ok(n) = t.parse::<u32>() {
        if (1..=12).contains(&n) {
            return MESES[(n - 1) as usize].0.to_string();
        }
    }
    if let Some(canonico) = mes_desde_encabezado(t) {
        return canonico.to_string();
    }
    t.to_string()
}

/// Nombre canónico del mes `n` (1..=12).
pub fn nombre_de_mes(n: u32) -> Option<&'static str> {
    if (1..=12).contains(&n) {
        Some(MESES[(n - 1) as usize].0)
    } else {
        None
    }
}
