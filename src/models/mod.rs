// Estructuras de datos principales

use serde::{Deserialize, Serialize};

/// Cadencia de reporte de un indicador. Se copia a la carga al crearla y no
/// se edita de forma independiente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Periodicidad {
    Mensual,
    Trimestral,
    Semestral,
    Anual,
}

impl Periodicidad {
    pub fn as_str(&self) -> &'static str {
        match self {
            Periodicidad::Mensual => "mensual",
            Periodicidad::Trimestral => "trimestral",
            Periodicidad::Semestral => "semestral",
            Periodicidad::Anual => "anual",
        }
    }

    pub fn from_str(s: &str) -> Option<Periodicidad> {
        match s.trim().to_lowercase().as_str() {
            "mensual" => Some(Periodicidad::Mensual),
            "trimestral" => Some(Periodicidad::Trimestral),
            "semestral" => Some(Periodicidad::Semestral),
            "anual" => Some(Periodicidad::Anual),
            _ => None,
        }
    }
}

/// Estado de una carga dentro del flujo de revisión.
///
/// `borrador` y `pendiente` son los únicos estados no terminales. Desde la
/// revisión se llega a `validada`, `observada` o `rechazada`; reenviar un
/// valor observado o rechazado implica crear una carga nueva.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstadoCarga {
    Borrador,
    Pendiente,
    Validada,
    Observada,
    Rechazada,
}

impl EstadoCarga {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoCarga::Borrador => "borrador",
            EstadoCarga::Pendiente => "pendiente",
            EstadoCarga::Validada => "validada",
            EstadoCarga::Observada => "observada",
            EstadoCarga::Rechazada => "rechazada",
        }
    }

    pub fn from_str(s: &str) -> Option<EstadoCarga> {
        match s.trim().to_lowercase().as_str() {
            "borrador" => Some(EstadoCarga::Borrador),
            "pendiente" => Some(EstadoCarga::Pendiente),
            "validada" => Some(EstadoCarga::Validada),
            "observada" => Some(EstadoCarga::Observada),
            "rechazada" => Some(EstadoCarga::Rechazada),
            _ => None,
        }
    }

    pub fn es_terminal(&self) -> bool {
        matches!(
            self,
            EstadoCarga::Validada | EstadoCarga::Observada | EstadoCarga::Rechazada
        )
    }
}

/// Una carga: el valor reportado para un indicador, un compromiso y un
/// ministerio en un período concreto.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carga {
    pub id: i64,
    pub indicador_id: i64,
    pub compromiso_id: i64,
    pub ministerio_id: i64,
    pub periodicidad: Periodicidad,
    pub periodo: String,
    pub mes: String,
    pub valor: f64,
    pub unidad: String,
    pub meta: Option<f64>,
    pub fuente: String,
    pub responsable: String,
    pub responsable_email: String,
    pub observaciones: Option<String>,
    pub estado: EstadoCarga,
    pub publicado: bool,
    pub creado_por: String,
    pub actualizado_por: String,
    pub creado_en: String,
    pub actualizado_en: String,
}

/// Datos de entrada para crear una carga. El compromiso y el ministerio se
/// resuelven desde el catálogo a partir del indicador.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NuevaCarga {
    pub indicador_id: i64,
    pub periodo: String,
    pub mes: String,
    pub valor: f64,
    #[serde(default)]
    pub unidad: String,
    #[serde(default)]
    pub meta: Option<f64>,
    #[serde(default)]
    pub fuente: String,
    #[serde(default)]
    pub responsable: String,
    #[serde(default)]
    pub responsable_email: String,
    #[serde(default)]
    pub observaciones: Option<String>,
    /// Si es `true` la carga nace en `borrador`; el formulario web crea
    /// directamente en `pendiente`.
    #[serde(default)]
    pub borrador: bool,
}

/// Campos editables de una carga. Los ausentes se dejan como están.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdicionCarga {
    #[serde(default)]
    pub periodo: Option<String>,
    #[serde(default)]
    pub mes: Option<String>,
    #[serde(default)]
    pub valor: Option<f64>,
    #[serde(default)]
    pub unidad: Option<String>,
    #[serde(default)]
    pub meta: Option<f64>,
    #[serde(default)]
    pub fuente: Option<String>,
    #[serde(default)]
    pub responsable: Option<String>,
    #[serde(default)]
    pub responsable_email: Option<String>,
    #[serde(default)]
    pub observaciones: Option<String>,
}

/// Rol del actor que ejecuta una operación. La emisión de sesiones y las
/// guardas por ruta quedan fuera de este subsistema; acá sólo interesa el rol
/// efectivo ya resuelto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Usuario,
    Revisor,
}

impl Rol {
    pub fn from_str(s: &str) -> Option<Rol> {
        match s.trim().to_lowercase().as_str() {
            "usuario" => Some(Rol::Usuario),
            "revisor" => Some(Rol::Revisor),
            _ => None,
        }
    }
}

/// Identidad efectiva del que opera sobre las cargas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub email: String,
    pub rol: Rol,
    /// Ministerio al que pertenece el actor (sólo relevante para `Usuario`).
    pub ministerio_id: Option<i64>,
}

impl Actor {
    pub fn revisor(email: &str) -> Actor {
        Actor {
            email: email.to_string(),
            rol: Rol::Revisor,
            ministerio_id: None,
        }
    }

    pub fn usuario(email: &str, ministerio_id: i64) -> Actor {
        Actor {
            email: email.to_string(),
            rol: Rol::Usuario,
            ministerio_id: Some(ministerio_id),
        }
    }

    pub fn es_revisor(&self) -> bool {
        self.rol == Rol::Revisor
    }

    /// Un revisor opera sobre cualquier ministerio; un usuario sólo sobre el
    /// propio.
    pub fn autorizado_para(&self, ministerio_id: i64) -> bool {
        self.es_revisor() || self.ministerio_id == Some(ministerio_id)
    }
}

// --- Catálogo (ministerios 1—* compromisos 1—* indicadores) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ministerio {
    pub id: i64,
    pub nombre: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compromiso {
    pub id: i64,
    pub ministerio_id: i64,
    pub titulo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicador {
    pub id: i64,
    pub compromiso_id: i64,
    pub nombre: String,
    pub periodicidad: Periodicidad,
    pub unidad: String,
    pub activo: bool,
}

/// Proyección de una carga validada hacia la planilla externa: una fila por
/// (indicador, período, mes) en la pestaña del ministerio. El orden de los
/// 19 campos es el contrato de columnas de la planilla.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilaHecho {
    pub carga_id: i64,
    pub ministerio: String,
    pub compromiso: String,
    pub indicador_id: i64,
    pub indicador: String,
    pub periodicidad: Periodicidad,
    pub periodo: String,
    pub mes: String,
    pub valor: f64,
    pub unidad: String,
    pub meta: Option<f64>,
    pub fuente: String,
    pub responsable: String,
    pub responsable_email: String,
    pub observaciones: String,
    pub estado: EstadoCarga,
    pub publicado: bool,
    pub creado_en: String,
    pub actualizado_en: String,
}
