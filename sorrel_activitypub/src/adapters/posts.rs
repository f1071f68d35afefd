use chrono::Utc;

use sorrel_config::Config;
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::posts::queries::{create_post, delete_post};
use sorrel_models::posts::types::{Post, PostCreateData, Visibility};
use sorrel_models::profiles::queries::get_profile_by_acct;
use sorrel_models::users::types::User;
use uuid::Uuid;

use crate::builders::announce::prepare_announce;
use crate::builders::create_note::prepare_create_note;
use crate::builders::delete_note::prepare_delete_note;
use crate::errors::HandlerError;
use crate::importers::{import_profile_by_acct, ApClient};
use crate::microsyntax::{find_hashtags, find_mentions};

/// Creates a local post and schedules delivery of Create(Note)
/// to every follower and mentioned actor
pub async fn publish_post(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    author: &User,
    content: String,
    visibility: Visibility,
    in_reply_to_id: Option<Uuid>,
) -> Result<Post, HandlerError> {
    let instance = config.instance();
    let tags = find_hashtags(&content);
    // Mentioned actors that are not known yet are resolved
    // through webfinger
    let mut mentions = vec![];
    let ap_client = ApClient::new(config);
    for address in find_mentions(&content) {
        let profile = if address.hostname() == instance.hostname() {
            match get_profile_by_acct(
                db_client,
                address.username(),
                None,
            ).await {
                Ok(profile) => profile,
                Err(DatabaseError::NotFound(_)) => continue,
                Err(other_error) => return Err(other_error.into()),
            }
        } else {
            match import_profile_by_acct(&ap_client, db_client, &address).await {
                Ok(profile) => profile,
                Err(error) => {
                    log::warn!("failed to resolve mention {} ({})", address, error);
                    continue;
                },
            }
        };
        mentions.push(profile.id);
    };
    let post_data = PostCreateData {
        id: None,
        content: Some(content),
        in_reply_to_id,
        repost_of_id: None,
        visibility,
        is_sensitive: false,
        object_id: None,
        created_at: None,
        attachments: vec![],
        mentions,
        tags,
    };
    let post = create_post(db_client, author.id, post_data).await?;
    prepare_create_note(db_client, &instance, author, &post)
        .await?
        .enqueue(db_client)
        .await?;
    Ok(post)
}

/// Creates a local repost and schedules delivery of Announce
pub async fn repost_post(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    author: &User,
    post_id: Uuid,
) -> Result<Post, DatabaseError> {
    let instance = config.instance();
    let repost_data = PostCreateData::repost(
        post_id,
        Visibility::Public,
        None,
    );
    let repost = create_post(db_client, author.id, repost_data).await?;
    prepare_announce(db_client, &instance, author, &repost)
        .await?
        .enqueue(db_client)
        .await?;
    Ok(repost)
}

// 1. Generate activity
// 2. Update database
// 3. Send activity
pub async fn delete_local_post(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    author: &User,
    post: &Post,
) -> Result<(), DatabaseError> {
    assert_eq!(author.id, post.author.id);
    let instance = config.instance();
    let delete_note = prepare_delete_note(
        db_client,
        &instance,
        author,
        post,
    ).await?;
    delete_post(db_client, post.id, Utc::now()).await?;
    delete_note.enqueue(db_client).await?;
    Ok(())
}
