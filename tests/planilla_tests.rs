use std::collections::HashMap;
use std::sync::Mutex;

use seguimiento::cargas::{self, DecisionRevision};
use seguimiento::catalogo;
use seguimiento::db::Almacen;
use seguimiento::models::{Actor, NuevaCarga, Periodicidad};
use seguimiento::sync::destino::encabezados;
use seguimiento::sync::{
    ErrorPlanilla, PlanillaXlsx, PoliticaReintentos, ServicioPlanilla, sincronizar_todo,
};

#[test]
fn test_planilla_xlsx_ciclo_completo() {
    let dir = tempfile::tempdir().expect("Debe crear el directorio temporal");
    let planilla = PlanillaXlsx::nueva(dir.path().join("publica.xlsx"));

    // Sin archivo todavía: alcanzable y sin pestañas
    planilla.verificar_conexion().expect("Debe responder sin archivo");
    assert!(planilla.listar_pestanas().expect("Debe listar").is_empty());

    planilla.crear_pestana("Salud").expect("Debe crear la pestaña");
    planilla
        .actualizar_valores("Salud", 1, &encabezados())
        .expect("Debe escribir el encabezado");
    planilla
        .agregar_fila("Salud", &vec!["1".to_string(), "Ministerio de Salud".to_string()])
        .expect("Debe agregar una fila");

    let pestanas = planilla.listar_pestanas().expect("Debe listar");
    assert_eq!(pestanas, vec!["Salud".to_string()]);

    let filas = planilla.leer_valores("Salud").expect("Debe leer");
    assert_eq!(filas.len(), 2);
    assert_eq!(filas[0][0], "ID Carga");
    assert_eq!(filas[1][0], "1");
    assert_eq!(filas[1][1], "Ministerio de Salud");

    // Releer una pestaña inexistente es error de formato, no de red
    let err = planilla.leer_valores("Educacion").expect_err("No existe");
    assert!(matches!(err, ErrorPlanilla::Formato(_)), "{:?}", err);
}

/// Servicio falso mínimo para la resincronización masiva.
#[derive(Default)]
struct PlanillaFalsa {
    pestanas: Mutex<HashMap<String, Vec<Vec<String>>>>,
    caida: bool,
}

impl ServicioPlanilla for PlanillaFalsa {
    fn verificar_conexion(&self) -> Result<(), ErrorPlanilla> {
        if self.caida {
            Err(ErrorPlanilla::Timeout("sin respuesta".to_string()))
        } else {
            Ok(())
        }
    }

    fn listar_pestanas(&self) -> Result<Vec<String>, ErrorPlanilla> {
        Ok(self.pestanas.lock().expect("lock").keys().cloned().collect())
    }

    fn crear_pestana(&self, nombre: &str) -> Result<(), ErrorPlanilla> {
        self.pestanas
            .lock()
            .expect("lock")
            .insert(nombre.to_string(), Vec::new());
        Ok(())
    }

    fn leer_valores(&self, pestana: &str) -> Result<Vec<Vec<String>>, ErrorPlanilla> {
        Ok(self
            .pestanas
            .lock()
            .expect("lock")
            .get(pestana)
            .cloned()
            .unwrap_or_default())
    }

    fn actualizar_valores(
        &self,
        pestana: &str,
        fila: u32,
        valores: &[String],
    ) -> Result<(), ErrorPlanilla> {
        let mut pestanas = self.pestanas.lock().expect("lock");
        let filas = pestanas.entry(pestana.to_string()).or_default();
        let indice = (fila - 1) as usize;
        while filas.len() <= indice {
            filas.push(Vec::new());
        }
        filas[indice] = valores.to_vec();
        Ok(())
    }

    fn agregar_fila(&self, pestana: &str, valores: &[String]) -> Result<(), ErrorPlanilla> {
        self.pestanas
            .lock()
            .expect("lock")
            .entry(pestana.to_string())
            .or_default()
            .push(valores.to_vec());
        Ok(())
    }
}

fn almacen_con_validadas() -> (tempfile::TempDir, Almacen) {
    let dir = tempfile::tempdir().expect("Debe crear el directorio temporal");
    let almacen = Almacen::nuevo(dir.path().join("cargas.db"));
    almacen.init_db().expect("Debe inicializar la base");

    let revisor = Actor::revisor("revisor@ejemplo.gob");
    let ministerio =
        catalogo::crear_ministerio(&almacen, "Ministerio de Salud").expect("Debe crear");
    let compromiso =
        catalogo::crear_compromiso(&almacen, ministerio.id, "A) Plan de vacunación federal")
            .expect("Debe crear");
    let indicador = catalogo::crear_indicador(
        &almacen,
        compromiso.id,
        "Dosis aplicadas por mes",
        Periodicidad::Mensual,
        "%",
    )
    .expect("Debe crear");

    for (periodo, mes) in [("2023-01", "Enero"), ("2023-02", "Febrero")] {
        let carga = cargas::crear(
            &almacen,
            &revisor,
            &NuevaCarga {
                indicador_id: indicador.id,
                periodo: periodo.to_string(),
                mes: mes.to_string(),
                valor: 0.39,
                unidad: "%".to_string(),
                meta: None,
                fuente: "Informe".to_string(),
                responsable: String::new(),
                responsable_email: String::new(),
                observaciones: None,
                borrador: false,
            },
        )
        .expect("Debe crear la carga");
        cargas::revisar(&almacen, &revisor, carga.id, DecisionRevision::Validar, None, None)
            .expect("Debe validar");
    }
    (dir, almacen)
}

#[tokio::test]
async fn test_resincronizacion_masiva_proyecta_todo() {
    let (_dir, almacen) = almacen_con_validadas();
    let servicio = PlanillaFalsa::default();

    let resumen = sincronizar_todo(&almacen, &servicio, &PoliticaReintentos::sin_espera())
        .await
        .expect("Debe resincronizar");
    assert_eq!(resumen.total, 2);
    assert_eq!(resumen.exitosas, 2);
    assert_eq!(resumen.fallidas, 0);

    let filas = servicio.pestanas.lock().expect("lock").get("Salud").cloned().unwrap();
    assert_eq!(filas.len(), 3, "encabezado + dos filas");

    // Idempotencia: volver a correrla no duplica filas
    let resumen = sincronizar_todo(&almacen, &servicio, &PoliticaReintentos::sin_espera())
        .await
        .expect("Debe resincronizar de nuevo");
    assert_eq!(resumen.exitosas, 2);
    let filas = servicio.pestanas.lock().expect("lock").get("Salud").cloned().unwrap();
    assert_eq!(filas.len(), 3, "sin duplicados tras el segundo pase");
}

#[tokio::test]
async fn test_preflight_caido_aborta_sin_escribir() {
    let (_dir, almacen) = almacen_con_validadas();
    let servicio = PlanillaFalsa { caida: true, ..PlanillaFalsa::default() };

    sincronizar_todo(&almacen, &servicio, &PoliticaReintentos::sin_espera())
        .await
        .expect_err("El preflight caído debe abortar la operación");
    assert!(
        servicio.pestanas.lock().expect("lock").is_empty(),
        "no se escribió nada"
    );
}
