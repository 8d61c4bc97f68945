use std::{env, fs, path::Path};

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    auth::{hash_password, new_id},
    models::{BookingRow, UserRow, ROLE_ADMIN},
};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    seed_admin(pool).await?;
    seed_attendance_types(pool).await?;
    Ok(())
}

async fn seed_admin(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM users WHERE role = ? LIMIT 1")
        .bind(ROLE_ADMIN)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@admin.com".to_string());
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "1234".to_string());
    let name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrador".to_string());

    if password == "1234" {
        log::warn!(
            "ADMIN_PASSWORD not set. Using default password '1234'. Set ADMIN_PASSWORD in production."
        );
    }

    let password_hash =
        hash_password(&password).map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO users (id, name, email, role, password_hash, active, created_at)
           VALUES (?, ?, ?, ?, ?, 1, ?)"#,
    )
    .bind(new_id())
    .bind(name)
    .bind(email.to_lowercase())
    .bind(ROLE_ADMIN)
    .bind(password_hash)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

async fn seed_attendance_types(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance_types")
            .fetch_one(pool)
            .await?;
    if existing > 0 {
        return Ok(());
    }

    let defaults = [
        ("Consulta", 30i64),
        ("Orientação", 45),
        ("Atendimento Geral", 30),
        ("Reunião", 60),
    ];

    for (name, duration) in defaults {
        sqlx::query(
            "INSERT INTO attendance_types (id, name, duration_minutes) VALUES (?, ?, ?)",
        )
        .bind(new_id())
        .bind(name)
        .bind(duration)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_booking(pool: &SqlitePool, id: &str) -> Result<Option<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(
        r#"SELECT id, date, time, status, user_id, user_name, service
           FROM appointments
           WHERE id = ?
           LIMIT 1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_user(pool: &SqlitePool, id: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"SELECT id, name, email, role, password_hash, active, created_at
           FROM users
           WHERE id = ?
           LIMIT 1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"SELECT id, name, email, role, password_hash, active, created_at
           FROM users
           WHERE email = ? COLLATE NOCASE
           LIMIT 1"#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}
