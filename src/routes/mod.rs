pub mod bookings;
pub mod catalog;
pub mod users;

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)));
    users::configure(cfg);
    bookings::configure(cfg);
    catalog::configure(cfg);
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

/// Catch-all for unknown routes, wired as the app's `default_service`.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "erro": "Rota não encontrada",
        "caminho": req.path(),
    }))
}
