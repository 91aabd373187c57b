//! Ciclo de vida de las cargas: persistencia y máquina de estados.

pub mod db;
pub mod estado;

pub use estado::{DecisionRevision, crear, editar, eliminar, enviar, revisar};
