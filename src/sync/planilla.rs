//! Puerto hacia el servicio de planilla externa.
//!
//! El sincronizador no habla con la planilla directamente sino a través del
//! trait `ServicioPlanilla`, de modo que los tests puedan inyectar un
//! servicio falso con errores controlados. La implementación concreta es un
//! workbook xlsx compartido en disco, serializado detrás de un mutex: dentro
//! del proceso no hay dos escritores simultáneos sobre una pestaña. Entre
//! procesos no existe bloqueo alguno; la secuencia buscar-fila-y-escribir
//! sigue siendo carrera abierta, igual que en la planilla real.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use umya_spreadsheet::{Spreadsheet, new_file, reader, writer};

/// Errores internos del sincronizador. Nunca llegan al llamador del flujo de
/// revisión: se reintentan y, agotados los intentos, se registran y absorben.
#[derive(Debug, thiserror::Error)]
pub enum ErrorPlanilla {
    #[error("error de red del servicio de planilla: {0}")]
    Red(String),

    #[error("tiempo de espera agotado: {0}")]
    Timeout(String),

    #[error("credencial vencida o inválida: {0}")]
    Credencial(String),

    #[error("contenido inesperado en la planilla: {0}")]
    Formato(String),
}

impl ErrorPlanilla {
    /// `true` cuando conviene refrescar la credencial antes del próximo
    /// intento.
    pub fn es_credencial(&self) -> bool {
        matches!(self, ErrorPlanilla::Credencial(_))
    }
}

/// Operaciones mínimas sobre una grilla con pestañas. Las filas son 1-based;
/// la fila 1 es el encabezado.
pub trait ServicioPlanilla: Send + Sync {
    /// Chequeo de alcanzabilidad previo a una sincronización masiva.
    fn verificar_conexion(&self) -> Result<(), ErrorPlanilla>;

    fn listar_pestanas(&self) -> Result<Vec<String>, ErrorPlanilla>;

    fn crear_pestana(&self, nombre: &str) -> Result<(), ErrorPlanilla>;

    /// Devuelve todas las filas de la pestaña, encabezado incluido.
    fn leer_valores(&self, pestana: &str) -> Result<Vec<Vec<String>>, ErrorPlanilla>;

    /// Reescribe una fila completa (1-based) desde la columna A.
    fn actualizar_valores(
        &self,
        pestana: &str,
        fila: u32,
        valores: &[String],
    ) -> Result<(), ErrorPlanilla>;

    /// Agrega una fila al final de la pestaña.
    fn agregar_fila(&self, pestana: &str, valores: &[String]) -> Result<(), ErrorPlanilla>;

    /// Intento de renovar la credencial del servicio. Efecto colateral de la
    /// política de reintentos; para el workbook local es un no-op.
    fn refrescar_credencial(&self) -> Result<(), ErrorPlanilla> {
        Ok(())
    }
}

/// Ruta por defecto del workbook público.
pub const RUTA_PLANILLA_DEFECTO: &str = "data/planilla_publica.xlsx";

/// Implementación sobre un workbook xlsx en disco.
pub struct PlanillaXlsx {
    ruta: PathBuf,
    lock: Mutex<()>,
}

impl PlanillaXlsx {
    pub fn nueva<P: Into<PathBuf>>(ruta: P) -> PlanillaXlsx {
        PlanillaXlsx {
            ruta: ruta.into(),
            lock: Mutex::new(()),
        }
    }

    /// Resuelve la ruta desde `PLANILLA_PUBLICA_PATH` (o el valor por
    /// defecto).
    pub fn desde_env() -> PlanillaXlsx {
        let _ = dotenv::dotenv();
        let ruta = env::var("PLANILLA_PUBLICA_PATH")
            .unwrap_or_else(|_| RUTA_PLANILLA_DEFECTO.to_string());
        PlanillaXlsx::nueva(ruta)
    }

    fn guardia(&self) -> std::sync::MutexGuard<'_, ()> {
        match self.lock.lock() {
            Ok(g) => g,
            Err(e) => e.into_inner(),
        }
    }

    fn abrir(&self) -> Result<Spreadsheet, ErrorPlanilla> {
        reader::xlsx::read(&self.ruta)
            .map_err(|e| ErrorPlanilla::Red(format!("no se pudo leer {:?}: {}", self.ruta, e)))
    }

    /// Abre el workbook o arma uno nuevo si todavía no existe. Devuelve
    /// también si es recién creado (para descartar la hoja por defecto).
    fn abrir_o_crear(&self) -> Result<(Spreadsheet, bool), ErrorPlanilla> {
        if self.ruta.exists() {
            Ok((self.abrir()?, false))
        } else {
            Ok((new_file(), true))
        }
    }

    fn guardar(&self, book: &Spreadsheet) -> Result<(), ErrorPlanilla> {
        if let Some(dir) = self.ruta.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| {
                    ErrorPlanilla::Red(format!("no se pudo crear {:?}: {}", dir, e))
                })?;
            }
        }
        writer::xlsx::write(book, &self.ruta)
            .map_err(|e| ErrorPlanilla::Red(format!("no se pudo escribir {:?}: {}", self.ruta, e)))
    }
}

impl ServicioPlanilla for PlanillaXlsx {
    fn verificar_conexion(&self) -> Result<(), ErrorPlanilla> {
        let _guardia = self.guardia();
        if self.ruta.exists() {
            // Alcanzable si el workbook se deja abrir.
            self.abrir().map(|_| ())
        } else {
            // Todavía no existe: se creará con la primera escritura.
            Ok(())
        }
    }

    fn listar_pestanas(&self) -> Result<Vec<String>, ErrorPlanilla> {
        let _guardia = self.guardia();
        if !self.ruta.exists() {
            return Ok(Vec::new());
        }
        let book = self.abrir()?;
        Ok(book
            .get_sheet_collection()
            .iter()
            .map(|hoja| hoja.get_name().to_string())
            .collect())
    }

    fn crear_pestana(&self, nombre: &str) -> Result<(), ErrorPlanilla> {
        let _guardia = self.guardia();
        let (mut book, nuevo) = self.abrir_o_crear()?;
        book.new_sheet(nombre)
            .map_err(|e| ErrorPlanilla::Formato(format!("no se pudo crear '{}': {}", nombre, e)))?;
        if nuevo && nombre != "Sheet1" {
            // La hoja por defecto del workbook recién creado no forma parte
            // del contrato de pestañas.
            let _ = book.remove_sheet_by_name("Sheet1");
        }
        self.guardar(&book)
    }

    fn leer_valores(&self, pestana: &str) -> Result<Vec<Vec<String>>, ErrorPlanilla> {
        let _guardia = self.guardia();
        let book = self.abrir()?;
        let hoja = book
            .get_sheet_by_name(pestana)
            .ok_or_else(|| ErrorPlanilla::Formato(format!("pestaña inexistente: '{}'", pestana)))?;

        let max_fila = hoja.get_highest_row();
        let max_col = hoja.get_highest_column();
        let mut filas = Vec::with_capacity(max_fila as usize);
        for f in 1..=max_fila {
            let mut fila = Vec::with_capacity(max_col as usize);
            for c in 1..=max_col {
                fila.push(hoja.get_value((c, f)));
            }
            filas.push(fila);
        }
        Ok(filas)
    }

    fn actualizar_valores(
        &self,
        pestana: &str,
        fila: u32,
        valores: &[String],
    ) -> Result<(), ErrorPlanilla> {
        let _guardia = self.guardia();
        let mut book = self.abrir()?;
        let hoja = book
            .get_sheet_by_name_mut(pestana)
            .ok_or_else(|| ErrorPlanilla::Formato(format!("pestaña inexistente: '{}'", pestana)))?;
        for (i, valor) in valores.iter().enumerate() {
            hoja.get_cell_mut(((i + 1) as u32, fila)).set_value(valor);
        }
        self.guardar(&book)
    }

    fn agregar_fila(&self, pestana: &str, valores: &[String]) -> Result<(), ErrorPlanilla> {
        let _guardia = self.guardia();
        let mut book = self.abrir()?;
        let hoja = book
            .get_sheet_by_name_mut(pestana)
            .ok_or_else(|| ErrorPlanilla::Formato(format!("pestaña inexistente: '{}'", pestana)))?;
        let fila = hoja.get_highest_row() + 1;
        for (i, valor) in valores.iter().enumerate() {
            hoja.get_cell_mut(((i + 1) as u32, fila)).set_value(valor);
        }
        self.guardar(&book)
    }
}
