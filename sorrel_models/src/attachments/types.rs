use chrono::{DateTime, Utc};
use postgres_types::FromSql;
use uuid::Uuid;

#[derive(Clone, FromSql)]
#[postgres(name = "media_attachment")]
pub struct DbMediaAttachment {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub post_id: Option<Uuid>,
    pub file_name: String,
    pub media_type: Option<String>,
    pub created_at: DateTime<Utc>,
}
