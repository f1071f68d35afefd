use chrono::{DateTime, Utc};
use uuid::Uuid;

use sorrel_utils::id::generate_ulid;

use crate::database::{
    catch_unique_violation,
    DatabaseClient,
    DatabaseError,
};
use crate::profiles::queries::update_post_count;
use crate::profiles::types::DbActorProfile;

use super::types::{Post, PostCreateData, Visibility};

const RELATED_ATTACHMENTS: &str =
    "ARRAY(
        SELECT media_attachment
        FROM media_attachment
        WHERE media_attachment.post_id = post.id
        ORDER BY media_attachment.created_at
    ) AS attachments";

const RELATED_MENTIONS: &str =
    "ARRAY(
        SELECT actor_profile
        FROM post_mention
        JOIN actor_profile ON post_mention.profile_id = actor_profile.id
        WHERE post_mention.post_id = post.id
    ) AS mentions";

const RELATED_TAGS: &str =
    "ARRAY(
        SELECT tag.tag_name
        FROM post_tag
        JOIN tag ON post_tag.tag_id = tag.id
        WHERE post_tag.post_id = post.id
    ) AS tags";

async fn create_post_attachments(
    db_client: &impl DatabaseClient,
    post_id: Uuid,
    author_id: Uuid,
    attachments: Vec<Uuid>,
) -> Result<(), DatabaseError> {
    let attachments_rows = db_client.query(
        "
        UPDATE media_attachment
        SET post_id = $1
        WHERE owner_id = $2 AND id = ANY($3)
        RETURNING id
        ",
        &[&post_id, &author_id, &attachments],
    ).await?;
    if attachments_rows.len() != attachments.len() {
        // Some attachments were not found
        return Err(DatabaseError::NotFound("attachment"));
    };
    Ok(())
}

async fn create_post_mentions(
    db_client: &impl DatabaseClient,
    post_id: Uuid,
    mentions: Vec<Uuid>,
) -> Result<(), DatabaseError> {
    let mentions_rows = db_client.query(
        "
        INSERT INTO post_mention (post_id, profile_id)
        SELECT $1, actor_profile.id
        FROM actor_profile WHERE actor_profile.id = ANY($2)
        RETURNING profile_id
        ",
        &[&post_id, &mentions],
    ).await?;
    if mentions_rows.len() != mentions.len() {
        // Some profiles were not found
        return Err(DatabaseError::NotFound("profile"));
    };
    Ok(())
}

async fn create_post_tags(
    db_client: &impl DatabaseClient,
    post_id: Uuid,
    tags: Vec<String>,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "
        INSERT INTO tag (tag_name)
        SELECT unnest($1::text[])
        ON CONFLICT (tag_name) DO NOTHING
        ",
        &[&tags],
    ).await?;
    let tags_rows = db_client.query(
        "
        INSERT INTO post_tag (post_id, tag_id)
        SELECT $1, tag.id FROM tag WHERE tag_name = ANY($2)
        RETURNING tag_id
        ",
        &[&post_id, &tags],
    ).await?;
    if tags_rows.len() != tags.len() {
        return Err(DatabaseError::NotFound("tag"));
    };
    Ok(())
}

// Pure reposts inherit hashtags and mentions from the original post
async fn inherit_post_relations(
    db_client: &impl DatabaseClient,
    post_id: Uuid,
    repost_of_id: Uuid,
) -> Result<(), DatabaseError> {
    db_client.execute(
        "
        INSERT INTO post_tag (post_id, tag_id)
        SELECT $1, tag_id FROM post_tag WHERE post_id = $2
        ",
        &[&post_id, &repost_of_id],
    ).await?;
    db_client.execute(
        "
        INSERT INTO post_mention (post_id, profile_id)
        SELECT $1, profile_id FROM post_mention WHERE post_id = $2
        ",
        &[&post_id, &repost_of_id],
    ).await?;
    Ok(())
}

pub async fn create_post(
    db_client: &mut impl DatabaseClient,
    author_id: Uuid,
    post_data: PostCreateData,
) -> Result<Post, DatabaseError> {
    let transaction = db_client.transaction().await?;
    let post_id = post_data.id.unwrap_or_else(generate_ulid);
    let created_at = post_data.created_at.unwrap_or_else(Utc::now);
    let is_pure_repost =
        post_data.repost_of_id.is_some() && post_data.content.is_none();
    let inserted_rows = transaction.query(
        "
        INSERT INTO post (
            id,
            author_id,
            content,
            in_reply_to_id,
            repost_of_id,
            visibility,
            is_sensitive,
            object_id,
            created_at
        )
        SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
        WHERE
        -- don't allow replies to pure reposts or deleted posts
        NOT EXISTS (
            SELECT 1 FROM post
            WHERE post.id = $4 AND (
                post.repost_of_id IS NOT NULL AND post.content IS NULL
                OR post.deleted_at IS NOT NULL
            )
        )
        -- don't allow reposts of reposts, of non-public posts,
        -- or of deleted posts
        AND NOT EXISTS (
            SELECT 1 FROM post
            WHERE post.id = $5 AND (
                post.repost_of_id IS NOT NULL AND post.content IS NULL
                OR post.visibility NOT IN ($10, $11)
                OR post.deleted_at IS NOT NULL
            )
        )
        RETURNING post.id
        ",
        &[
            &post_id,
            &author_id,
            &post_data.content,
            &post_data.in_reply_to_id,
            &post_data.repost_of_id,
            &post_data.visibility,
            &post_data.is_sensitive,
            &post_data.object_id,
            &created_at,
            &i16::from(&Visibility::Public),
            &i16::from(&Visibility::Unlisted),
        ],
    ).await.map_err(catch_unique_violation("post"))?;
    if inserted_rows.is_empty() {
        // Relation guard failed
        return Err(DatabaseError::NotFound("post"));
    };
    if is_pure_repost {
        let repost_of_id = post_data.repost_of_id
            .expect("repost ID should be present");
        inherit_post_relations(&transaction, post_id, repost_of_id).await?;
    } else {
        create_post_tags(&transaction, post_id, post_data.tags).await?;
        create_post_mentions(&transaction, post_id, post_data.mentions).await?;
        create_post_attachments(
            &transaction,
            post_id,
            author_id,
            post_data.attachments,
        ).await?;
    };
    update_post_count(&transaction, author_id, 1).await?;
    let post = get_post_by_id(&transaction, post_id).await?;
    transaction.commit().await?;
    Ok(post)
}

pub async fn get_post_by_id(
    db_client: &impl DatabaseClient,
    post_id: Uuid,
) -> Result<Post, DatabaseError> {
    let statement = format!(
        "
        SELECT post, actor_profile, {related_attachments}, {related_mentions}, {related_tags}
        FROM post
        JOIN actor_profile ON post.author_id = actor_profile.id
        WHERE post.id = $1
        ",
        related_attachments=RELATED_ATTACHMENTS,
        related_mentions=RELATED_MENTIONS,
        related_tags=RELATED_TAGS,
    );
    let maybe_row = db_client.query_opt(
        &statement,
        &[&post_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("post"))?;
    let post = Post::try_from(&row)?;
    Ok(post)
}

pub async fn get_remote_post_by_object_id(
    db_client: &impl DatabaseClient,
    object_id: &str,
) -> Result<Post, DatabaseError> {
    let statement = format!(
        "
        SELECT post, actor_profile, {related_attachments}, {related_mentions}, {related_tags}
        FROM post
        JOIN actor_profile ON post.author_id = actor_profile.id
        WHERE post.object_id = $1
        ",
        related_attachments=RELATED_ATTACHMENTS,
        related_mentions=RELATED_MENTIONS,
        related_tags=RELATED_TAGS,
    );
    let maybe_row = db_client.query_opt(
        &statement,
        &[&object_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("post"))?;
    let post = Post::try_from(&row)?;
    Ok(post)
}

/// Finds a pure repost of the given post made by the given author
pub async fn get_repost_by_author(
    db_client: &impl DatabaseClient,
    repost_of_id: Uuid,
    author_id: Uuid,
) -> Result<Post, DatabaseError> {
    let statement = format!(
        "
        SELECT post, actor_profile, {related_attachments}, {related_mentions}, {related_tags}
        FROM post
        JOIN actor_profile ON post.author_id = actor_profile.id
        WHERE
            post.repost_of_id = $1 AND post.author_id = $2
            AND post.content IS NULL
            AND post.deleted_at IS NULL
        ",
        related_attachments=RELATED_ATTACHMENTS,
        related_mentions=RELATED_MENTIONS,
        related_tags=RELATED_TAGS,
    );
    let maybe_row = db_client.query_opt(
        &statement,
        &[&repost_of_id, &author_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("post"))?;
    let post = Post::try_from(&row)?;
    Ok(post)
}

pub async fn get_post_author(
    db_client: &impl DatabaseClient,
    post_id: Uuid,
) -> Result<DbActorProfile, DatabaseError> {
    let maybe_row = db_client.query_opt(
        "
        SELECT actor_profile
        FROM post
        JOIN actor_profile ON post.author_id = actor_profile.id
        WHERE post.id = $1
        ",
        &[&post_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("post"))?;
    let author = row.try_get("actor_profile")?;
    Ok(author)
}

/// Returns author's public posts, newest first (outbox)
pub async fn get_posts_by_author(
    db_client: &impl DatabaseClient,
    profile_id: Uuid,
    limit: u16,
) -> Result<Vec<Post>, DatabaseError> {
    let statement = format!(
        "
        SELECT post, actor_profile, {related_attachments}, {related_mentions}, {related_tags}
        FROM post
        JOIN actor_profile ON post.author_id = actor_profile.id
        WHERE
            post.author_id = $1
            AND post.visibility = $2
            AND post.deleted_at IS NULL
        ORDER BY post.created_at DESC
        LIMIT $3
        ",
        related_attachments=RELATED_ATTACHMENTS,
        related_mentions=RELATED_MENTIONS,
        related_tags=RELATED_TAGS,
    );
    let rows = db_client.query(
        &statement,
        &[&profile_id, &Visibility::Public, &i64::from(limit)],
    ).await?;
    let posts = rows.iter()
        .map(Post::try_from)
        .collect::<Result<_, _>>()?;
    Ok(posts)
}

/// Marks post as deleted; repeated deletion is a no-op
pub async fn delete_post(
    db_client: &mut impl DatabaseClient,
    post_id: Uuid,
    deleted_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let transaction = db_client.transaction().await?;
    let maybe_row = transaction.query_opt(
        "
        SELECT post.author_id, post.deleted_at
        FROM post WHERE post.id = $1
        ",
        &[&post_id],
    ).await?;
    let row = maybe_row.ok_or(DatabaseError::NotFound("post"))?;
    let author_id: Uuid = row.try_get("author_id")?;
    let maybe_deleted_at: Option<DateTime<Utc>> = row.try_get("deleted_at")?;
    if maybe_deleted_at.is_some() {
        // Already deleted
        return Ok(());
    };
    transaction.execute(
        "UPDATE post SET deleted_at = $1 WHERE id = $2",
        &[&deleted_at, &post_id],
    ).await?;
    update_post_count(&transaction, author_id, -1).await?;
    transaction.commit().await?;
    Ok(())
}

pub async fn get_post_count(
    db_client: &impl DatabaseClient,
    only_local: bool,
) -> Result<i64, DatabaseError> {
    let statement = format!(
        "
        SELECT count(post) AS post_count
        FROM post
        JOIN actor_profile ON post.author_id = actor_profile.id
        WHERE post.deleted_at IS NULL {condition}
        ",
        condition=if only_local { "AND actor_profile.hostname IS NULL" } else { "" },
    );
    let row = db_client.query_one(&statement, &[]).await?;
    let count = row.try_get("post_count")?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use crate::database::test_utils::create_test_database;
    use crate::profiles::queries::create_profile;
    use crate::profiles::types::ProfileCreateData;
    use super::*;

    async fn create_test_profile(
        db_client: &impl DatabaseClient,
        username: &str,
    ) -> DbActorProfile {
        let profile_data = ProfileCreateData {
            username: username.to_string(),
            hostname: None,
            display_name: None,
            bio: None,
            public_keys: vec![],
            actor_json: None,
        };
        create_profile(db_client, profile_data).await.unwrap()
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_create_post_with_tags() {
        let db_client = &mut create_test_database().await;
        let author = create_test_profile(db_client, "author").await;
        let post_data = PostCreateData {
            content: Some("hello #world".to_string()),
            tags: vec!["world".to_string()],
            ..Default::default()
        };
        let post = create_post(db_client, author.id, post_data).await.unwrap();
        assert_eq!(post.expect_content(), "hello #world");
        assert_eq!(post.tags, vec!["world".to_string()]);
        assert_eq!(post.author.id, author.id);
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_create_repost_twice() {
        let db_client = &mut create_test_database().await;
        let author = create_test_profile(db_client, "author").await;
        let reposter = create_test_profile(db_client, "reposter").await;
        let post = create_post(
            db_client,
            author.id,
            PostCreateData {
                content: Some("test".to_string()),
                ..Default::default()
            },
        ).await.unwrap();
        let repost_data = PostCreateData::repost(post.id, Visibility::Public, None);
        create_post(db_client, reposter.id, repost_data).await.unwrap();
        let repost_data = PostCreateData::repost(post.id, Visibility::Public, None);
        let result = create_post(db_client, reposter.id, repost_data).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists("post"))));
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_create_repost_of_repost() {
        let db_client = &mut create_test_database().await;
        let author = create_test_profile(db_client, "author").await;
        let post = create_post(
            db_client,
            author.id,
            PostCreateData {
                content: Some("test".to_string()),
                ..Default::default()
            },
        ).await.unwrap();
        let repost = create_post(
            db_client,
            author.id,
            PostCreateData::repost(post.id, Visibility::Public, None),
        ).await.unwrap();
        let result = create_post(
            db_client,
            author.id,
            PostCreateData::repost(repost.id, Visibility::Public, None),
        ).await;
        assert!(matches!(result, Err(DatabaseError::NotFound("post"))));
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_create_post_with_attachment() {
        use crate::attachments::queries::create_attachment;
        let db_client = &mut create_test_database().await;
        let author = create_test_profile(db_client, "author").await;
        let attachment = create_attachment(
            db_client,
            author.id,
            "image.png",
            Some("image/png"),
        ).await.unwrap();
        let post_data = PostCreateData {
            content: Some("with attachment".to_string()),
            attachments: vec![attachment.id],
            ..Default::default()
        };
        let post = create_post(db_client, author.id, post_data).await.unwrap();
        assert_eq!(post.attachments.len(), 1);
        assert_eq!(post.attachments[0].file_name, "image.png");
    }

    #[tokio::test]
    #[serial]
    #[ignore]
    async fn test_delete_post_idempotent() {
        let db_client = &mut create_test_database().await;
        let author = create_test_profile(db_client, "author").await;
        let post = create_post(
            db_client,
            author.id,
            PostCreateData {
                content: Some("test".to_string()),
                ..Default::default()
            },
        ).await.unwrap();
        delete_post(db_client, post.id, Utc::now()).await.unwrap();
        let post = get_post_by_id(db_client, post.id).await.unwrap();
        assert_eq!(post.deleted_at.is_some(), true);
        // Repeated deletion does not fail
        delete_post(db_client, post.id, Utc::now()).await.unwrap();
    }
}
