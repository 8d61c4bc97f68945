use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{
        bearer_validator, hash_password, issue_token, new_id, require_admin, verify_password,
        AuthUser,
    },
    db::{fetch_user, fetch_user_by_email},
    error::{map_user_insert_error, ApiError},
    models::{UserRow, UserSummary, ROLE_USER},
    state::AppState,
};

#[derive(Deserialize)]
struct RegisterPayload {
    nome: String,
    email: String,
    senha: String,
}

// Login takes `password` while registration takes `senha`; the original
// clients send exactly this split, so both names stay.
#[derive(Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct UserUpdatePayload {
    nome: Option<String>,
    email: Option<String>,
    senha: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/usuarios")
            .service(web::resource("/registrar").route(web::post().to(register)))
            .service(web::resource("/login").route(web::post().to(login)))
            .service(
                web::scope("")
                    .wrap(HttpAuthentication::bearer(bearer_validator))
                    .service(web::resource("/listarUser").route(web::get().to(list_users)))
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(update_user))
                            .route(web::delete().to(delete_user)),
                    ),
            ),
    );
}

async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let name = payload.nome.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    if name.len() < 3 {
        return Err(ApiError::Validation(
            "O nome deve ter pelo menos 3 caracteres.".to_string(),
        ));
    }
    if email.is_empty() {
        return Err(ApiError::Validation("O e-mail é obrigatório.".to_string()));
    }
    if payload.senha.is_empty() {
        return Err(ApiError::Validation("A senha é obrigatória.".to_string()));
    }

    if fetch_user_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::DuplicateEmail);
    }

    let password_hash = hash_password(&payload.senha)
        .map_err(|err| ApiError::Internal(format!("password hash failed: {err}")))?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO users (id, name, email, role, password_hash, active, created_at)
           VALUES (?, ?, ?, ?, ?, 1, ?)"#,
    )
    .bind(new_id())
    .bind(&name)
    .bind(&email)
    .bind(ROLE_USER)
    .bind(password_hash)
    .bind(now)
    .execute(&state.db)
    .await
    .map_err(map_user_insert_error)?;

    Ok(HttpResponse::Created().json(json!({ "message": "Usuário criado com sucesso!" })))
}

async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    let user = fetch_user_by_email(&state.db, payload.email.trim())
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if user.active != 1 || !verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let auth = AuthUser {
        id: user.id.clone(),
        name: user.name.clone(),
        role: user.role.clone(),
    };
    let token = issue_token(&state.tokens, &auth)?;

    Ok(HttpResponse::Ok().json(json!({
        "token": token,
        "user": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "type": user.role,
        }
    })))
}

async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = sqlx::query_as::<_, UserRow>(
        r#"SELECT id, name, email, role, password_hash, active, created_at
           FROM users
           ORDER BY created_at"#,
    )
    .fetch_all(&state.db)
    .await?;

    let summaries: Vec<UserSummary> = rows.into_iter().map(UserSummary::from).collect();
    Ok(HttpResponse::Ok().json(summaries))
}

async fn update_user(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<UserUpdatePayload>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    if auth.id != user_id && !auth.is_admin() {
        return Err(ApiError::Forbidden(
            "Você só pode editar o seu próprio perfil.".to_string(),
        ));
    }

    let current = fetch_user(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Usuário"))?;

    let payload = payload.into_inner();
    let name = match payload.nome {
        Some(name) => {
            let name = name.trim().to_string();
            if name.len() < 3 {
                return Err(ApiError::Validation(
                    "O nome deve ter pelo menos 3 caracteres.".to_string(),
                ));
            }
            name
        }
        None => current.name.clone(),
    };

    let email = match payload.email {
        Some(email) => {
            let email = email.trim().to_lowercase();
            if email.is_empty() {
                return Err(ApiError::Validation("O e-mail é obrigatório.".to_string()));
            }
            if let Some(other) = fetch_user_by_email(&state.db, &email).await? {
                if other.id != user_id {
                    return Err(ApiError::DuplicateEmail);
                }
            }
            email
        }
        None => current.email.clone(),
    };

    let password_hash = match payload.senha {
        Some(senha) if !senha.is_empty() => hash_password(&senha)
            .map_err(|err| ApiError::Internal(format!("password hash failed: {err}")))?,
        _ => current.password_hash.clone(),
    };

    sqlx::query("UPDATE users SET name = ?, email = ?, password_hash = ? WHERE id = ?")
        .bind(&name)
        .bind(&email)
        .bind(&password_hash)
        .bind(&user_id)
        .execute(&state.db)
        .await?;

    // Denormalized owner names on bookings follow the profile.
    sqlx::query("UPDATE appointments SET user_name = ? WHERE user_id = ?")
        .bind(&name)
        .bind(&user_id)
        .execute(&state.db)
        .await?;

    let updated = fetch_user(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Usuário"))?;
    Ok(HttpResponse::Ok().json(UserSummary::from(updated)))
}

async fn delete_user(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&auth)?;
    let user_id = path.into_inner();

    let target = fetch_user(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Usuário"))?;

    if target.role == crate::models::ROLE_ADMIN {
        return Err(ApiError::Forbidden(
            "Não é possível excluir usuários administradores.".to_string(),
        ));
    }

    // Removing a user takes their bookings with them; an orphaned booking has
    // no owner left who could ever cancel or delete it.
    sqlx::query("DELETE FROM appointments WHERE user_id = ?")
        .bind(&user_id)
        .execute(&state.db)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&user_id)
        .execute(&state.db)
        .await?;

    log::info!("user {} removed by {}", user_id, auth.id);
    Ok(HttpResponse::NoContent().finish())
}
