use serde::{Deserialize, Serialize};

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Booking lifecycle states. `pending -> confirmed -> completed`, with
/// `cancelled` reachable from any non-terminal state. `completed` and
/// `cancelled` are terminal; deletion is the only further operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    #[serde(rename = "pending", alias = "ativo")]
    Pending,
    #[serde(rename = "confirmed")]
    Confirmed,
    #[serde(rename = "completed", alias = "concluido")]
    Completed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a status string, accepting the legacy vocabulary
    /// (`ativo`, `concluido`) still sent by older clients.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" | "ativo" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" | "concluido" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        if *self == next {
            return true;
        }
        match self {
            BookingStatus::Pending => {
                matches!(next, BookingStatus::Confirmed | BookingStatus::Cancelled)
            }
            BookingStatus::Confirmed => {
                matches!(next, BookingStatus::Completed | BookingStatus::Cancelled)
            }
            BookingStatus::Completed | BookingStatus::Cancelled => false,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
    pub active: i64,
    pub created_at: String,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub role: String,
    #[serde(rename = "ativo")]
    pub active: bool,
    #[serde(rename = "criadoEm")]
    pub created_at: String,
}

impl From<UserRow> for UserSummary {
    fn from(row: UserRow) -> Self {
        UserSummary {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            active: row.active == 1,
            created_at: row.created_at,
        }
    }
}

/// Booking record. Serialized field names match the original client wire
/// format (`data`, `hora`, `usuarioId`, `servicoPrestado`).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BookingRow {
    pub id: String,
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "hora")]
    pub time: String,
    pub status: String,
    #[serde(rename = "usuarioId")]
    pub user_id: String,
    #[serde(rename = "name")]
    pub user_name: String,
    #[serde(rename = "servicoPrestado")]
    pub service: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AttendanceTypeRow {
    pub id: String,
    pub name: String,
    #[serde(rename = "duration")]
    pub duration_minutes: i64,
}
