use std::sync::OnceLock;

use calamine::Data;
use regex::Regex;

use crate::meses::sin_tildes;

/// Convierte un `Data` de calamine a String (versión genérica para celdas)
pub fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if (f.floor() - f).abs() < f64::EPSILON {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => format!("{}", i),
        Data::Bool(b) => format!("{}", b),
        Data::Empty => String::new(),
        Data::Error(_) => String::new(),
        Data::DateTime(s) => s.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Normaliza encabezados eliminando espacios, tildes y pasando a minúsculas.
pub fn normalize_header(s: &str) -> String {
    sin_tildes(s).chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normaliza un nombre de catálogo para matching: minúsculas, sin tildes,
/// espacios colapsados.
pub fn normalizar_nombre(s: &str) -> String {
    sin_tildes(s)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn regex_numero() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").unwrap())
}

/// Extrae un valor numérico de una celda de texto libre.
///
/// Acepta un número literal ("12", "3,5") o el primer número embebido en el
/// texto ("39%", "4 casos", "aprox. 12.5"). Un sufijo `%` divide por 100.
/// Devuelve `None` si no hay número reconocible.
pub fn extraer_numero(texto: &str) -> Option<f64> {
    let t = texto.trim();
    if t.is_empty() {
        return None;
    }

    // Literal directo, con coma decimal y/o porcentaje
    let directo = t.trim_end_matches('%').trim().replace(',', ".");
    if let Ok(v) = directo.parse::<f64>() {
        return Some(if t.ends_with('%') { v / 100.0 } else { v });
    }

    // Primer número embebido ("4 casos", "avance: 39% acumulado")
    let normalizado = t.replace(',', ".");
    let m = regex_numero().find(&normalizado)?;
    let v: f64 = m.as_str().parse().ok()?;
    let resto = &normalizado[m.end()..];
    Some(if resto.trim_start().starts_with('%') {
        v / 100.0
    } else {
        v
    })
}
