use seguimiento::models::Periodicidad;
use seguimiento::periodo::{PERIODO_ANUAL, PERIODO_GESTION, es_periodo_valido, validar_periodo};

#[test]
fn test_mensual() {
    assert!(es_periodo_valido("2023-01", Periodicidad::Mensual));
    assert!(es_periodo_valido("2024-12", Periodicidad::Mensual));
    // Mes fuera de rango o formato incompleto
    assert!(!es_periodo_valido("2023-13", Periodicidad::Mensual));
    assert!(!es_periodo_valido("2023-00", Periodicidad::Mensual));
    assert!(!es_periodo_valido("2023-1", Periodicidad::Mensual));
    assert!(!es_periodo_valido("2023", Periodicidad::Mensual));
}

#[test]
fn test_trimestral() {
    assert!(es_periodo_valido("2023Q1", Periodicidad::Trimestral));
    assert!(es_periodo_valido("2023Q4", Periodicidad::Trimestral));
    assert!(!es_periodo_valido("2023Q5", Periodicidad::Trimestral));
    assert!(!es_periodo_valido("2023T1", Periodicidad::Trimestral));
    assert!(!es_periodo_valido("2023-03", Periodicidad::Trimestral));
}

#[test]
fn test_semestral() {
    assert!(es_periodo_valido("2023S1", Periodicidad::Semestral));
    assert!(es_periodo_valido("2023S2", Periodicidad::Semestral));
    assert!(!es_periodo_valido("2023S3", Periodicidad::Semestral));
    assert!(!es_periodo_valido("2023Q1", Periodicidad::Semestral));
}

#[test]
fn test_anual() {
    assert!(es_periodo_valido("2023", Periodicidad::Anual));
    assert!(es_periodo_valido("1999", Periodicidad::Anual));
    assert!(!es_periodo_valido("23", Periodicidad::Anual));
    assert!(!es_periodo_valido("2023-01", Periodicidad::Anual));
}

#[test]
fn test_centinelas_validos_para_cualquier_periodicidad() {
    // Los dos literales fijos pasan aunque no calcen con el patrón de la
    // periodicidad.
    assert!(es_periodo_valido(PERIODO_ANUAL, Periodicidad::Mensual));
    assert!(es_periodo_valido(PERIODO_ANUAL, Periodicidad::Trimestral));
    assert!(es_periodo_valido(PERIODO_GESTION, Periodicidad::Mensual));
    assert!(es_periodo_valido(PERIODO_GESTION, Periodicidad::Anual));
    // Un rango cualquiera que no sea el centinela sigue siendo inválido
    assert!(!es_periodo_valido("2019-2022", Periodicidad::Anual));
}

#[test]
fn test_validar_periodo_nombra_periodo_y_periodicidad() {
    let err = validar_periodo("2023X9", Periodicidad::Trimestral)
        .expect_err("Debe rechazar un período malformado");
    let mensaje = err.to_string();
    assert!(mensaje.contains("2023X9"), "el mensaje debe nombrar el período: {}", mensaje);
    assert!(
        mensaje.contains("trimestral"),
        "el mensaje debe nombrar la periodicidad: {}",
        mensaje
    );
}
