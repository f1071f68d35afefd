use uuid::Uuid;

use sorrel_utils::id::generate_ulid;

use crate::database::{DatabaseClient, DatabaseError};

use super::types::DbMediaAttachment;

pub async fn create_attachment(
    db_client: &impl DatabaseClient,
    owner_id: Uuid,
    file_name: &str,
    media_type: Option<&str>,
) -> Result<DbMediaAttachment, DatabaseError> {
    let attachment_id = generate_ulid();
    let row = db_client.query_one(
        "
        INSERT INTO media_attachment (id, owner_id, file_name, media_type)
        VALUES ($1, $2, $3, $4)
        RETURNING media_attachment
        ",
        &[&attachment_id, &owner_id, &file_name, &media_type],
    ).await?;
    let attachment = row.try_get("media_attachment")?;
    Ok(attachment)
}
