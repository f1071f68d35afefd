use chrono::{DateTime, Utc};
use postgres_types::FromSql;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::attachments::types::DbMediaAttachment;
use crate::database::{
    int_enum::{int_enum_from_sql, int_enum_to_sql},
    DatabaseError,
    DatabaseTypeError,
};
use crate::profiles::types::DbActorProfile;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Visibility {
    #[default]
    Public,
    Unlisted,
    Followers,
    Direct,
}

impl From<&Visibility> for i16 {
    fn from(value: &Visibility) -> i16 {
        match value {
            Visibility::Public => 1,
            Visibility::Unlisted => 2,
            Visibility::Followers => 3,
            Visibility::Direct => 4,
        }
    }
}

impl TryFrom<i16> for Visibility {
    type Error = DatabaseTypeError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        let visibility = match value {
            1 => Self::Public,
            2 => Self::Unlisted,
            3 => Self::Followers,
            4 => Self::Direct,
            _ => return Err(DatabaseTypeError),
        };
        Ok(visibility)
    }
}

int_enum_from_sql!(Visibility);
int_enum_to_sql!(Visibility);

#[derive(FromSql)]
#[postgres(name = "post")]
pub struct DbPost {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: Option<String>,
    pub in_reply_to_id: Option<Uuid>,
    pub repost_of_id: Option<Uuid>,
    pub visibility: Visibility,
    pub is_sensitive: bool,
    pub object_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct Post {
    pub id: Uuid,
    pub author: DbActorProfile,
    pub content: Option<String>,
    pub in_reply_to_id: Option<Uuid>,
    pub repost_of_id: Option<Uuid>,
    pub visibility: Visibility,
    pub is_sensitive: bool,
    pub object_id: Option<String>,
    pub attachments: Vec<DbMediaAttachment>,
    pub mentions: Vec<DbActorProfile>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn new(
        db_post: DbPost,
        author: DbActorProfile,
        attachments: Vec<DbMediaAttachment>,
        mentions: Vec<DbActorProfile>,
        tags: Vec<String>,
    ) -> Result<Self, DatabaseTypeError> {
        if author.id != db_post.author_id {
            return Err(DatabaseTypeError);
        };
        // Local posts must not have object ID, except pure reposts
        // where it holds the Announce activity ID
        if author.is_local() &&
            db_post.object_id.is_some() &&
            db_post.repost_of_id.is_none()
        {
            return Err(DatabaseTypeError);
        };
        let post = Self {
            id: db_post.id,
            author,
            content: db_post.content,
            in_reply_to_id: db_post.in_reply_to_id,
            repost_of_id: db_post.repost_of_id,
            visibility: db_post.visibility,
            is_sensitive: db_post.is_sensitive,
            object_id: db_post.object_id,
            attachments,
            mentions,
            tags,
            created_at: db_post.created_at,
            deleted_at: db_post.deleted_at,
        };
        Ok(post)
    }

    pub fn is_local(&self) -> bool {
        self.author.is_local()
    }

    pub fn is_public(&self) -> bool {
        matches!(self.visibility, Visibility::Public | Visibility::Unlisted)
    }

    /// Pure repost: no content of its own
    pub fn is_repost(&self) -> bool {
        self.repost_of_id.is_some() && self.content.is_none()
    }

    pub fn expect_content(&self) -> &str {
        self.content.as_deref()
            .expect("content should be present")
    }
}

impl TryFrom<&Row> for Post {
    type Error = DatabaseError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let db_post: DbPost = row.try_get("post")?;
        let author: DbActorProfile = row.try_get("actor_profile")?;
        let attachments: Vec<DbMediaAttachment> = row.try_get("attachments")?;
        let mentions: Vec<DbActorProfile> = row.try_get("mentions")?;
        let tags: Vec<String> = row.try_get("tags")?;
        let post = Self::new(db_post, author, attachments, mentions, tags)?;
        Ok(post)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for Post {
    fn default() -> Self {
        Self {
            id: sorrel_utils::id::generate_ulid(),
            author: DbActorProfile::default(),
            content: Some("".to_string()),
            in_reply_to_id: None,
            repost_of_id: None,
            visibility: Visibility::Public,
            is_sensitive: false,
            object_id: None,
            attachments: vec![],
            mentions: vec![],
            tags: vec![],
            created_at: Utc::now(),
            deleted_at: None,
        }
    }
}

pub struct PostCreateData {
    pub id: Option<Uuid>,
    pub content: Option<String>,
    pub in_reply_to_id: Option<Uuid>,
    pub repost_of_id: Option<Uuid>,
    pub visibility: Visibility,
    pub is_sensitive: bool,
    pub object_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub attachments: Vec<Uuid>,
    pub mentions: Vec<Uuid>,
    pub tags: Vec<String>,
}

impl PostCreateData {
    pub fn repost(
        repost_of_id: Uuid,
        visibility: Visibility,
        activity_id: Option<String>,
    ) -> Self {
        Self {
            id: None,
            content: None,
            in_reply_to_id: None,
            repost_of_id: Some(repost_of_id),
            visibility,
            is_sensitive: false,
            object_id: activity_id,
            created_at: None,
            attachments: vec![],
            mentions: vec![],
            tags: vec![],
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for PostCreateData {
    fn default() -> Self {
        Self {
            id: None,
            content: Some("".to_string()),
            in_reply_to_id: None,
            repost_of_id: None,
            visibility: Visibility::Public,
            is_sensitive: false,
            object_id: None,
            created_at: None,
            attachments: vec![],
            mentions: vec![],
            tags: vec![],
        }
    }
}
