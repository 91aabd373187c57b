use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use seguimiento::models::{EstadoCarga, FilaHecho, Periodicidad};
use seguimiento::sync::destino::{ENCABEZADOS, encabezados, fila_a_celdas};
use seguimiento::sync::{
    ErrorPlanilla, PoliticaReintentos, ServicioPlanilla, resolver_nombre_pestana,
    sanear_nombre_pestana, upsert_fila,
};

/// Servicio falso en memoria con inyección de errores controlada.
#[derive(Default)]
struct PlanillaFalsa {
    pestanas: Mutex<HashMap<String, Vec<Vec<String>>>>,
    /// Cantidad de llamadas a `listar_pestanas` (primer paso de cada
    /// intento del upsert).
    intentos: AtomicU32,
    refrescos: AtomicU32,
    /// Errores a inyectar antes de responder bien.
    fallas_pendientes: AtomicU32,
    /// `true` inyecta errores de credencial; si no, de red.
    falla_credencial: bool,
}

impl PlanillaFalsa {
    fn con_fallas(fallas: u32, credencial: bool) -> PlanillaFalsa {
        PlanillaFalsa {
            fallas_pendientes: AtomicU32::new(fallas),
            falla_credencial: credencial,
            ..PlanillaFalsa::default()
        }
    }

    fn fallar_si_corresponde(&self) -> Result<(), ErrorPlanilla> {
        let restantes = self.fallas_pendientes.load(Ordering::SeqCst);
        if restantes > 0 {
            self.fallas_pendientes.store(restantes - 1, Ordering::SeqCst);
            if self.falla_credencial {
                Err(ErrorPlanilla::Credencial("token vencido".to_string()))
            } else {
                Err(ErrorPlanilla::Red("conexión reiniciada".to_string()))
            }
        } else {
            Ok(())
        }
    }

    fn filas_de(&self, pestana: &str) -> Vec<Vec<String>> {
        self.pestanas
            .lock()
            .expect("lock")
            .get(pestana)
            .cloned()
            .unwrap_or_default()
    }
}

impl ServicioPlanilla for PlanillaFalsa {
    fn verificar_conexion(&self) -> Result<(), ErrorPlanilla> {
        self.fallar_si_corresponde()
    }

    fn listar_pestanas(&self) -> Result<Vec<String>, ErrorPlanilla> {
        self.intentos.fetch_add(1, Ordering::SeqCst);
        self.fallar_si_corresponde()?;
        Ok(self.pestanas.lock().expect("lock").keys().cloned().collect())
    }

    fn crear_pestana(&self, nombre: &str) -> Result<(), ErrorPlanilla> {
        self.fallar_si_corresponde()?;
        self.pestanas
            .lock()
            .expect("lock")
            .insert(nombre.to_string(), Vec::new());
        Ok(())
    }

    fn leer_valores(&self, pestana: &str) -> Result<Vec<Vec<String>>, ErrorPlanilla> {
        self.fallar_si_corresponde()?;
        Ok(self.filas_de(pestana))
    }

    fn actualizar_valores(
        &self,
        pestana: &str,
        fila: u32,
        valores: &[String],
    ) -> Result<(), ErrorPlanilla> {
        self.fallar_si_corresponde()?;
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
        self.fallar_si_corresponde()?;
        self.pestanas
            .lock()
            .expect("lock")
            .entry(pestana.to_string())
            .or_default()
            .push(valores.to_vec());
        Ok(())
    }

    fn refrescar_credencial(&self) -> Result<(), ErrorPlanilla> {
        self.refrescos.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn fila_de_prueba(carga_id: i64, periodo: &str, mes: &str) -> FilaHecho {
    FilaHecho {
        carga_id,
        ministerio: "Ministerio de Salud".to_string(),
        compromiso: "A) Plan de vacunación federal".to_string(),
        indicador_id: 12,
        indicador: "Dosis aplicadas por mes".to_string(),
        periodicidad: Periodicidad::Mensual,
        periodo: periodo.to_string(),
        mes: mes.to_string(),
        valor: 0.39,
        unidad: "%".to_string(),
        meta: Some(0.5),
        fuente: "Informe mensual".to_string(),
        responsable: "María Pérez".to_string(),
        responsable_email: "mperez@ejemplo.gob".to_string(),
        observaciones: String::new(),
        estado: EstadoCarga::Validada,
        publicado: true,
        creado_en: "2023-04-02T12:00:00+00:00".to_string(),
        actualizado_en: "2023-04-05T09:30:00+00:00".to_string(),
    }
}

#[tokio::test]
async fn test_aprovisiona_pestana_y_agrega_fila() {
    let servicio = PlanillaFalsa::default();
    let fila = fila_de_prueba(1, "2023-04", "4");

    upsert_fila(&servicio, &fila, &PoliticaReintentos::sin_espera())
        .await
        .expect("Debe sincronizar");

    let filas = servicio.filas_de("Salud");
    assert_eq!(filas.len(), 2, "encabezado + una fila de datos");
    assert_eq!(filas[0], encabezados());
    assert_eq!(filas[1][0], "1");
    assert_eq!(filas[1][7], "Abril", "el mes numérico sale con nombre humano");
    assert_eq!(filas[1].len(), ENCABEZADOS.len());
}

#[tokio::test]
async fn test_actualiza_en_lugar_sin_duplicar() {
    let servicio = PlanillaFalsa::default();
    let politica = PoliticaReintentos::sin_espera();

    let original = fila_de_prueba(1, "2023-04", "Abril");
    upsert_fila(&servicio, &original, &politica).await.expect("Debe agregar");

    // Mismo hecho (indicador, período, mes) con valor nuevo
    let mut corregida = fila_de_prueba(1, "2023-04", "4");
    corregida.valor = 0.41;
    upsert_fila(&servicio, &corregida, &politica).await.expect("Debe actualizar");

    let filas = servicio.filas_de("Salud");
    assert_eq!(filas.len(), 2, "no se duplicó la fila: {:#?}", filas);
    assert_eq!(filas[1][8], "0.41", "se actualizó en el lugar");

    // Otro mes del mismo indicador sí agrega
    let otro_mes = fila_de_prueba(2, "2023-05", "Mayo");
    upsert_fila(&servicio, &otro_mes, &politica).await.expect("Debe agregar");
    assert_eq!(servicio.filas_de("Salud").len(), 3);
}

#[tokio::test]
async fn test_migra_encabezado_desactualizado() {
    let servicio = PlanillaFalsa::default();
    servicio.pestanas.lock().expect("lock").insert(
        "Salud".to_string(),
        vec![vec!["ID".to_string(), "Viejo".to_string()]],
    );

    let fila = fila_de_prueba(1, "2023-04", "Abril");
    upsert_fila(&servicio, &fila, &PoliticaReintentos::sin_espera())
        .await
        .expect("Debe sincronizar");

    let filas = servicio.filas_de("Salud");
    assert_eq!(filas[0], encabezados(), "el encabezado se reescribió");
}

#[tokio::test]
async fn test_reintenta_tres_veces_y_devuelve_el_error() {
    // Más fallas de las que la política tolera: los tres intentos fallan
    let servicio = PlanillaFalsa::con_fallas(10, false);
    let fila = fila_de_prueba(1, "2023-04", "Abril");

    let err = upsert_fila(&servicio, &fila, &PoliticaReintentos::sin_espera())
        .await
        .expect_err("Debe agotar los intentos");
    assert!(matches!(err, ErrorPlanilla::Red(_)), "{:?}", err);
    assert_eq!(servicio.intentos.load(Ordering::SeqCst), 3, "exactamente 3 intentos");
    assert_eq!(servicio.refrescos.load(Ordering::SeqCst), 0, "sin refresco para errores de red");
}

#[tokio::test]
async fn test_recupera_tras_falla_transitoria() {
    // Dos fallas y después anda: el tercer intento escribe
    let servicio = PlanillaFalsa::con_fallas(2, false);
    let fila = fila_de_prueba(1, "2023-04", "Abril");

    upsert_fila(&servicio, &fila, &PoliticaReintentos::sin_espera())
        .await
        .expect("El tercer intento debe andar");
    assert_eq!(servicio.filas_de("Salud").len(), 2);
}

#[tokio::test]
async fn test_error_de_credencial_dispara_refresco() {
    let servicio = PlanillaFalsa::con_fallas(1, true);
    let fila = fila_de_prueba(1, "2023-04", "Abril");

    upsert_fila(&servicio, &fila, &PoliticaReintentos::sin_espera())
        .await
        .expect("Debe recuperarse tras refrescar");
    assert_eq!(servicio.refrescos.load(Ordering::SeqCst), 1, "un refresco por la falla de credencial");
}

#[test]
fn test_resolver_nombre_pestana_tabla_fija() {
    assert_eq!(resolver_nombre_pestana("Ministerio de Salud"), "Salud");
    assert_eq!(resolver_nombre_pestana("ministerio de educación"), "Educacion");
    assert_eq!(resolver_nombre_pestana("Jefatura de Gabinete"), "Jefatura_Gabinete");
}

#[test]
fn test_resolver_nombre_pestana_derivacion_saneada() {
    assert_eq!(
        resolver_nombre_pestana("Secretaría de Energía"),
        "Secretaría_de_Energía"
    );
    assert_eq!(sanear_nombre_pestana("  Obras / Viales (2023)  "), "Obras_Viales_2023");
    // Recorte al largo máximo de pestaña
    let largo = sanear_nombre_pestana(
        "Ministerio de Infraestructura, Vivienda y Servicios Públicos",
    );
    assert!(largo.chars().count() <= 31, "'{}' excede el largo de pestaña", largo);
}

#[test]
fn test_fila_a_celdas_respeta_el_contrato() {
    let celdas = fila_a_celdas(&fila_de_prueba(7, "2023-04", "4"));
    assert_eq!(celdas.len(), ENCABEZADOS.len());
    assert_eq!(celdas[0], "7");
    assert_eq!(celdas[6], "2023-04");
    assert_eq!(celdas[7], "Abril");
    assert_eq!(celdas[16], "SI");
}
