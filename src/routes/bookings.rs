use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{bearer_validator, new_id, require_admin, AuthUser},
    db::fetch_booking,
    error::ApiError,
    models::{BookingRow, BookingStatus},
    slots,
    state::AppState,
};

#[derive(Deserialize)]
struct CreateBookingPayload {
    data: String,
    hora: String,
    #[serde(rename = "servicoPrestado")]
    servico_prestado: String,
}

#[derive(Deserialize)]
struct UpdateBookingPayload {
    data: Option<String>,
    hora: Option<String>,
    status: Option<BookingStatus>,
    #[serde(rename = "servicoPrestado")]
    servico_prestado: Option<String>,
}

#[derive(Deserialize)]
struct AvailabilityQuery {
    data: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/agendamentos")
            .wrap(HttpAuthentication::bearer(bearer_validator))
            .service(
                web::resource("")
                    .route(web::get().to(list_bookings))
                    .route(web::post().to(create_booking)),
            )
            .service(web::resource("/disponibilidade").route(web::get().to(availability)))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_booking))
                    .route(web::put().to(update_booking))
                    .route(web::delete().to(delete_booking)),
            ),
    );
}

async fn list_bookings(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
) -> Result<HttpResponse, ApiError> {
    // Ownership is enforced here, not left to the client view.
    let rows = if auth.is_admin() {
        sqlx::query_as::<_, BookingRow>(
            r#"SELECT id, date, time, status, user_id, user_name, service
               FROM appointments
               ORDER BY date, time"#,
        )
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, BookingRow>(
            r#"SELECT id, date, time, status, user_id, user_name, service
               FROM appointments
               WHERE user_id = ?
               ORDER BY date, time"#,
        )
        .bind(&auth.id)
        .fetch_all(&state.db)
        .await?
    };

    Ok(HttpResponse::Ok().json(rows))
}

async fn availability(
    state: web::Data<AppState>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, ApiError> {
    let date = query.data.trim().to_string();
    if date.is_empty() {
        return Err(ApiError::Validation("A data é obrigatória.".to_string()));
    }

    let bookings = sqlx::query_as::<_, BookingRow>(
        r#"SELECT id, date, time, status, user_id, user_name, service
           FROM appointments
           WHERE date = ?"#,
    )
    .bind(&date)
    .fetch_all(&state.db)
    .await?;

    let horarios = slots::available_slots(&date, &bookings);
    Ok(HttpResponse::Ok().json(json!({ "data": date, "horarios": horarios })))
}

async fn create_booking(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<CreateBookingPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let date = payload.data.trim().to_string();
    let time = payload.hora.trim().to_string();
    let service = payload.servico_prestado.trim().to_string();

    if date.is_empty() || time.is_empty() || service.is_empty() {
        return Err(ApiError::Validation(
            "Preencha todos os campos.".to_string(),
        ));
    }
    if !slots::is_valid_slot(&time) {
        return Err(ApiError::Validation(
            "Horário fora da grade de atendimento (09:00–17:30, a cada 30 minutos).".to_string(),
        ));
    }

    // Availability (§ /disponibilidade) is advisory only: there is no
    // uniqueness check here, so two racing creates for the same slot can both
    // succeed.
    let booking = BookingRow {
        id: new_id(),
        date,
        time,
        status: BookingStatus::Pending.as_str().to_string(),
        user_id: auth.id.clone(),
        user_name: auth.name.clone(),
        service,
    };

    sqlx::query(
        r#"INSERT INTO appointments (id, date, time, status, user_id, user_name, service)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&booking.id)
    .bind(&booking.date)
    .bind(&booking.time)
    .bind(&booking.status)
    .bind(&booking.user_id)
    .bind(&booking.user_name)
    .bind(&booking.service)
    .execute(&state.db)
    .await?;

    log::info!(
        "booking {} created by {} for {} {}",
        booking.id,
        auth.id,
        booking.date,
        booking.time
    );
    Ok(HttpResponse::Created().json(booking))
}

async fn get_booking(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let booking_id = path.into_inner();
    let booking = fetch_booking(&state.db, &booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Agendamento"))?;

    if booking.user_id != auth.id && !auth.is_admin() {
        return Err(ApiError::Forbidden(
            "Você só pode consultar os seus próprios agendamentos.".to_string(),
        ));
    }

    Ok(HttpResponse::Ok().json(booking))
}

async fn update_booking(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<UpdateBookingPayload>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&auth)?;
    let booking_id = path.into_inner();
    let payload = payload.into_inner();

    let current = fetch_booking(&state.db, &booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Agendamento"))?;

    let status = match payload.status {
        Some(next) => {
            let from = BookingStatus::parse(&current.status)
                .ok_or_else(|| ApiError::Internal(format!("corrupt status: {}", current.status)))?;
            if !from.can_transition_to(next) {
                return Err(ApiError::Validation(format!(
                    "Transição de status inválida: {} → {}.",
                    from.as_str(),
                    next.as_str()
                )));
            }
            next.as_str().to_string()
        }
        None => current.status.clone(),
    };

    let date = payload.data.unwrap_or_else(|| current.date.clone());
    let time = match payload.hora {
        Some(time) => {
            if !slots::is_valid_slot(&time) {
                return Err(ApiError::Validation(
                    "Horário fora da grade de atendimento (09:00–17:30, a cada 30 minutos)."
                        .to_string(),
                ));
            }
            time
        }
        None => current.time.clone(),
    };
    let service = payload
        .servico_prestado
        .unwrap_or_else(|| current.service.clone());

    // A changed date/time is not checked against other bookings.
    sqlx::query(
        "UPDATE appointments SET date = ?, time = ?, status = ?, service = ? WHERE id = ?",
    )
    .bind(&date)
    .bind(&time)
    .bind(&status)
    .bind(&service)
    .bind(&booking_id)
    .execute(&state.db)
    .await?;

    let updated = fetch_booking(&state.db, &booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Agendamento"))?;
    Ok(HttpResponse::Ok().json(updated))
}

async fn delete_booking(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let booking_id = path.into_inner();
    let booking = fetch_booking(&state.db, &booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Agendamento"))?;

    if !auth.is_admin() {
        if booking.user_id != auth.id {
            return Err(ApiError::Forbidden(
                "Você só pode excluir os seus próprios agendamentos.".to_string(),
            ));
        }
        let status = BookingStatus::parse(&booking.status)
            .ok_or_else(|| ApiError::Internal(format!("corrupt status: {}", booking.status)))?;
        if !status.is_terminal() {
            return Err(ApiError::Forbidden(
                "Só é possível excluir agendamentos cancelados ou concluídos.".to_string(),
            ));
        }
    }

    sqlx::query("DELETE FROM appointments WHERE id = ?")
        .bind(&booking_id)
        .execute(&state.db)
        .await?;

    log::info!("booking {} deleted by {}", booking_id, auth.id);
    Ok(HttpResponse::NoContent().finish())
}
