use seguimiento::excel::io::extraer_numero;
use seguimiento::excel::parsear_hoja;

fn fila(celdas: &[&str]) -> Vec<String> {
    celdas.iter().map(|c| c.to_string()).collect()
}

/// Hoja de fixture con el armado típico: fila 0 de encabezados de campo,
/// fila 1 de meses, y celdas combinadas (vacías en las continuaciones).
fn hoja_tipica() -> Vec<Vec<String>> {
    vec![
        fila(&["Area", "Compromisos", "Indicadores", "", "", ""]),
        fila(&["", "", "", "Enero", "Febrero", "Marzo"]),
        fila(&["Salud", "A) Plan de vacunación federal", "Dosis aplicadas por mes", "39%", "", ""]),
        fila(&["", "", "Centros de vacunación abiertos", "", "4 casos", ""]),
        fila(&["", "", "Campañas de difusión realizadas", "", "", "12"]),
        fila(&["", "B) Red de atención primaria", "Centros renovados", "0", "-", "7"]),
        fila(&["", "", "Turnos digitales otorgados", "", "250", ""]),
        // Filtración de encabezado por celdas combinadas: se ignora
        fila(&["", "Compromisos", "Indicadores", "", "", ""]),
    ]
}

#[test]
fn test_dos_compromisos_con_sus_indicadores() {
    let hoja = parsear_hoja("Ministerio de Salud", &hoja_tipica())
        .expect("Debe parsear la hoja");
    assert_eq!(hoja.ministerio, "Ministerio de Salud");
    assert_eq!(hoja.compromisos.len(), 2, "dos grupos de compromiso: {:#?}", hoja.compromisos);

    let primero = &hoja.compromisos[0];
    assert_eq!(primero.titulo, "A) Plan de vacunación federal");
    assert_eq!(primero.indicadores.len(), 3);

    let segundo = &hoja.compromisos[1];
    assert_eq!(segundo.titulo, "B) Red de atención primaria");
    assert_eq!(segundo.indicadores.len(), 2);
}

#[test]
fn test_valores_mensuales_con_porcentaje_y_texto() {
    let hoja = parsear_hoja("Ministerio de Salud", &hoja_tipica())
        .expect("Debe parsear la hoja");

    let primero = &hoja.compromisos[0];
    // "39%" se divide por 100
    assert_eq!(primero.valores_mensuales.get("Enero"), Some(&0.39));
    // "4 casos" extrae el número embebido
    assert_eq!(primero.valores_mensuales.get("Febrero"), Some(&4.0));
    assert_eq!(primero.valores_mensuales.get("Marzo"), Some(&12.0));

    let segundo = &hoja.compromisos[1];
    // "0" y "-" no se almacenan; los valores de las dos filas de indicador
    // se acumulan en el mismo grupo
    assert_eq!(segundo.valores_mensuales.get("Enero"), None, "el cero se descarta");
    assert_eq!(segundo.valores_mensuales.get("Febrero"), Some(&250.0));
    assert_eq!(segundo.valores_mensuales.get("Marzo"), Some(&7.0));
}

#[test]
fn test_fila_de_encabezado_filtrado_se_ignora() {
    let hoja = parsear_hoja("Ministerio de Salud", &hoja_tipica())
        .expect("Debe parsear la hoja");
    for compromiso in hoja.compromisos.iter() {
        assert_ne!(compromiso.titulo, "Compromisos");
        assert!(
            !compromiso.indicadores.iter().any(|i| i == "Indicadores"),
            "el encabezado filtrado no es un indicador"
        );
    }
}

#[test]
fn test_numeraciones_aceptadas() {
    // Las cuatro convenciones de numeración abren compromiso
    let filas = vec![
        fila(&["", "Compromisos", "Indicadores", ""]),
        fila(&["", "", "", "Enero"]),
        fila(&["", "1. Obras viales terminadas", "Kilómetros pavimentados", "3"]),
        fila(&["", "2) Escuelas inauguradas", "Edificios entregados", "5"]),
        fila(&["", "3 Hospitales ampliados", "Camas nuevas", "8"]),
        fila(&["", "C) Conectividad rural", "Antenas instaladas", "2"]),
    ];
    let hoja = parsear_hoja("Obras", &filas).expect("Debe parsear la hoja");
    let titulos: Vec<&str> = hoja.compromisos.iter().map(|c| c.titulo.as_str()).collect();
    assert_eq!(
        titulos,
        vec![
            "1. Obras viales terminadas",
            "2) Escuelas inauguradas",
            "3 Hospitales ampliados",
            "C) Conectividad rural"
        ]
    );
}

#[test]
fn test_compromiso_sin_indicadores_no_se_emite() {
    let filas = vec![
        fila(&["", "Compromisos", "Indicadores", ""]),
        fila(&["", "", "", "Enero"]),
        fila(&["", "A) Compromiso vacío", "", ""]),
        fila(&["", "B) Compromiso con datos", "Indicador real", "9"]),
    ];
    let hoja = parsear_hoja("Prueba", &filas).expect("Debe parsear la hoja");
    assert_eq!(hoja.compromisos.len(), 1);
    assert_eq!(hoja.compromisos[0].titulo, "B) Compromiso con datos");
}

#[test]
fn test_texto_de_compromiso_en_columna_de_indicadores_se_descarta() {
    // La guardia de numeración evita que un título filtrado a la columna de
    // indicadores cuente como indicador.
    let filas = vec![
        fila(&["", "Compromisos", "Indicadores", ""]),
        fila(&["", "", "", "Enero"]),
        fila(&["", "A) Compromiso real", "1. Este texto es un compromiso", ""]),
        fila(&["", "", "Indicador legítimo", "4"]),
    ];
    let hoja = parsear_hoja("Prueba", &filas).expect("Debe parsear la hoja");
    assert_eq!(hoja.compromisos.len(), 1);
    assert_eq!(hoja.compromisos[0].indicadores, vec!["Indicador legítimo"]);
}

#[test]
fn test_hoja_sin_encabezados_minimos() {
    let filas = vec![fila(&["solo una fila"])];
    assert!(parsear_hoja("Vacía", &filas).is_none());
}

#[test]
fn test_celdas_cortas_o_vacias_no_abren_compromiso() {
    let filas = vec![
        fila(&["", "Compromisos", "Indicadores", ""]),
        fila(&["", "", "", "Enero"]),
        fila(&["", "1)", "Indicador suelto sin compromiso", "3"]),
    ];
    let hoja = parsear_hoja("Prueba", &filas).expect("Debe parsear la hoja");
    // "1)" mide menos de 4 caracteres: no abre compromiso y el indicador
    // suelto queda sin grupo al que sumarse.
    assert!(hoja.compromisos.is_empty(), "{:#?}", hoja.compromisos);
}

#[test]
fn test_extraer_numero() {
    assert_eq!(extraer_numero("39%"), Some(0.39));
    assert_eq!(extraer_numero("4 casos"), Some(4.0));
    assert_eq!(extraer_numero("12"), Some(12.0));
    assert_eq!(extraer_numero("3,5"), Some(3.5));
    assert_eq!(extraer_numero("avance 12.5% acumulado"), Some(0.125));
    assert_eq!(extraer_numero("0"), Some(0.0), "el cero se descarta aguas arriba");
    assert_eq!(extraer_numero("-"), None);
    assert_eq!(extraer_numero(""), None);
    assert_eq!(extraer_numero("sin datos"), None);
}
