use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;

use crate::{
    auth::{bearer_validator, new_id, require_admin, AuthUser},
    error::ApiError,
    models::AttendanceTypeRow,
    state::AppState,
};

#[derive(Deserialize)]
struct AttendanceTypePayload {
    name: String,
    duration: i64,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/tipos-atendimento")
            .wrap(HttpAuthentication::bearer(bearer_validator))
            .service(
                web::resource("")
                    .route(web::get().to(list_types))
                    .route(web::post().to(create_type)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::put().to(update_type))
                    .route(web::delete().to(delete_type)),
            ),
    );
}

fn validate(payload: &AttendanceTypePayload) -> Result<(String, i64), ApiError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::Validation("O nome é obrigatório.".to_string()));
    }
    if payload.duration <= 0 {
        return Err(ApiError::Validation(
            "A duração deve ser maior que zero.".to_string(),
        ));
    }
    Ok((name, payload.duration))
}

async fn list_types(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, AttendanceTypeRow>(
        "SELECT id, name, duration_minutes FROM attendance_types ORDER BY name",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(HttpResponse::Ok().json(rows))
}

async fn create_type(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<AttendanceTypePayload>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&auth)?;
    let (name, duration) = validate(&payload)?;

    let row = AttendanceTypeRow {
        id: new_id(),
        name,
        duration_minutes: duration,
    };
    sqlx::query("INSERT INTO attendance_types (id, name, duration_minutes) VALUES (?, ?, ?)")
        .bind(&row.id)
        .bind(&row.name)
        .bind(row.duration_minutes)
        .execute(&state.db)
        .await?;

    Ok(HttpResponse::Created().json(row))
}

async fn update_type(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<AttendanceTypePayload>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&auth)?;
    let type_id = path.into_inner();
    let (name, duration) = validate(&payload)?;

    // Bookings carry a snapshot of the type name; editing the catalog does not
    // rewrite them.
    let result =
        sqlx::query("UPDATE attendance_types SET name = ?, duration_minutes = ? WHERE id = ?")
            .bind(&name)
            .bind(duration)
            .bind(&type_id)
            .execute(&state.db)
            .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Tipo de atendimento"));
    }

    Ok(HttpResponse::Ok().json(AttendanceTypeRow {
        id: type_id,
        name,
        duration_minutes: duration,
    }))
}

async fn delete_type(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&auth)?;
    let type_id = path.into_inner();

    let result = sqlx::query("DELETE FROM attendance_types WHERE id = ?")
        .bind(&type_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Tipo de atendimento"));
    }

    Ok(HttpResponse::NoContent().finish())
}
