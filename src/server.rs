use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use serde_json::json;
use tokio::sync::mpsc;

use crate::db::Almacen;
use crate::server_handlers::{
    crear_carga_handler, editar_carga_handler, eliminar_carga_handler, enviar_carga_handler,
    estadisticas_handler, importar_handler, obtener_carga_handler, revisar_carga_handler,
    sincronizar_handler,
};
use crate::sync::{self, PlanillaXlsx, PoliticaReintentos, ServicioPlanilla, SolicitudSync};

/// Estado compartido del sincronizador: el canal hacia el worker y el
/// servicio/política para la resincronización masiva.
#[derive(Clone)]
pub struct EstadoSync {
    pub tx: mpsc::Sender<SolicitudSync>,
    pub servicio: Arc<dyn ServicioPlanilla>,
    pub politica: PoliticaReintentos,
}

pub async fn run_server(bind_addr: &str) -> std::io::Result<()> {
    let almacen = Almacen::desde_env();
    almacen
        .init_db()
        .map_err(|e| std::io::Error::other(format!("no se pudo inicializar la base: {}", e)))?;

    let servicio: Arc<dyn ServicioPlanilla> = Arc::new(PlanillaXlsx::desde_env());
    let politica = PoliticaReintentos::default();
    let tx = sync::iniciar_worker(servicio.clone(), politica);
    let estado_sync = EstadoSync { tx, servicio, politica };

    let datos_almacen = web::Data::new(almacen);
    let datos_sync = web::Data::new(estado_sync);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(datos_almacen.clone())
            .app_data(datos_sync.clone())
            .route("/cargas", web::post().to(crear_carga_handler))
            .route("/cargas/{id}", web::get().to(obtener_carga_handler))
            .route("/cargas/{id}", web::put().to(editar_carga_handler))
            .route("/cargas/{id}", web::delete().to(eliminar_carga_handler))
            .route("/cargas/{id}/enviar", web::post().to(enviar_carga_handler))
            .route("/cargas/{id}/revisar", web::post().to(revisar_carga_handler))
            .route("/importar", web::post().to(importar_handler))
            .route("/sincronizar", web::post().to(sincronizar_handler))
            .route("/estadisticas", web::get().to(estadisticas_handler))
            .route("/help", web::get().to(help_handler))
    })
    .bind(bind_addr)?
    .run()
    .await
}

async fn help_handler() -> impl Responder {
    let ejemplo_carga = json!({
        "indicador_id": 12,
        "periodo": "2023-04",
        "mes": "Abril",
        "valor": 0.39,
        "unidad": "%",
        "fuente": "Informe mensual de gestión",
        "responsable": "María Pérez",
        "responsable_email": "mperez@ejemplo.gob",
        "borrador": false
    });

    let help = json!({
        "description": "API de seguimiento de cargas de indicadores. Las altas entran en \
            pendiente (o borrador), un revisor resuelve con validar/observar/rechazar y lo \
            validado se proyecta a la planilla pública.",
        "identidad": "encabezados X-Usuario-Email, X-Usuario-Rol (usuario|revisor) y \
            X-Usuario-Ministerio",
        "post_cargas_example": ejemplo_carga,
        "post_revisar_example": json!({"decision": "observar", "observaciones": "Falta la fuente"}),
        "post_importar": "multipart con el workbook (una hoja por ministerio); query \
            anio, validar, sincronizar",
        "post_sincronizar": "reproyecta todas las cargas validadas a la planilla pública",
        "get_estadisticas": "conteo de cargas por estado"
    });

    HttpResponse::Ok().json(help)
}
