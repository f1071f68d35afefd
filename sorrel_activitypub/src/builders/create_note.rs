use chrono::{DateTime, Utc};
use serde::Serialize;

use sorrel_config::Instance;
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::posts::queries::get_post_by_id;
use sorrel_models::posts::types::{Post, Visibility};
use sorrel_models::relationships::queries::get_followers;
use sorrel_models::users::types::User;

use crate::contexts::{build_default_context, Context};
use crate::deliverer::{OutgoingActivity, Recipient};
use crate::vocabulary::CREATE;

use super::note::{build_note, Note};

#[derive(Serialize)]
pub struct CreateNote {
    #[serde(rename = "@context")]
    _context: Context,

    #[serde(rename = "type")]
    activity_type: String,

    id: String,
    actor: String,
    object: Note,

    to: Vec<String>,
    cc: Vec<String>,

    published: DateTime<Utc>,
}

pub fn build_create_note(
    instance_hostname: &str,
    instance_url: &str,
    post: &Post,
    maybe_in_reply_to: Option<&Post>,
) -> CreateNote {
    let object = build_note(
        instance_hostname,
        instance_url,
        post,
        maybe_in_reply_to,
        false,
    );
    let primary_audience = object.to.clone();
    let secondary_audience = object.cc.clone();
    let activity_id = format!("{}/create", object.id);
    CreateNote {
        _context: build_default_context(),
        activity_type: CREATE.to_string(),
        id: activity_id,
        actor: object.attributed_to.clone(),
        published: object.published,
        object,
        to: primary_audience,
        cc: secondary_audience,
    }
}

pub(super) async fn get_note_recipients(
    db_client: &impl DatabaseClient,
    post: &Post,
    maybe_in_reply_to: Option<&Post>,
) -> Result<Vec<Recipient>, DatabaseError> {
    let mut audience = vec![];
    match post.visibility {
        Visibility::Public |
            Visibility::Unlisted |
            Visibility::Followers =>
        {
            let followers = get_followers(db_client, post.author.id).await?;
            audience.extend(followers);
        },
        Visibility::Direct => (),
    };
    if let Some(in_reply_to) = maybe_in_reply_to {
        audience.push(in_reply_to.author.clone());
    };
    audience.extend(post.mentions.clone());

    // Local profiles are processed in-place and don't appear here
    let recipients = audience.iter()
        .filter_map(|profile| profile.actor_json.as_ref())
        .map(Recipient::for_actor)
        .collect();
    Ok(recipients)
}

pub async fn prepare_create_note(
    db_client: &impl DatabaseClient,
    instance: &Instance,
    author: &User,
    post: &Post,
) -> Result<OutgoingActivity, DatabaseError> {
    assert_eq!(author.id, post.author.id);
    let maybe_in_reply_to = match post.in_reply_to_id {
        Some(in_reply_to_id) => {
            let in_reply_to = get_post_by_id(db_client, in_reply_to_id).await?;
            Some(in_reply_to)
        },
        None => None,
    };
    let activity = build_create_note(
        &instance.hostname(),
        &instance.url(),
        post,
        maybe_in_reply_to.as_ref(),
    );
    let recipients = get_note_recipients(
        db_client,
        post,
        maybe_in_reply_to.as_ref(),
    ).await?;
    Ok(OutgoingActivity::new(
        instance,
        author,
        activity,
        recipients,
    ))
}

#[cfg(test)]
mod tests {
    use sorrel_federation::constants::AP_PUBLIC;
    use sorrel_models::profiles::types::DbActorProfile;
    use super::*;

    const INSTANCE_HOSTNAME: &str = "social.example";
    const INSTANCE_URL: &str = "https://social.example";

    #[test]
    fn test_build_create_note() {
        let author = DbActorProfile::local_for_test("author");
        let post = Post {
            author,
            content: Some("hello".to_string()),
            ..Default::default()
        };
        let activity = build_create_note(
            INSTANCE_HOSTNAME,
            INSTANCE_URL,
            &post,
            None,
        );

        assert_eq!(
            activity.id,
            format!("{}/api/posts/{}/create", INSTANCE_URL, post.id),
        );
        assert_eq!(activity.activity_type, CREATE);
        assert_eq!(
            activity.actor,
            format!("{}/api/users/{}", INSTANCE_URL, post.author.id),
        );
        assert_eq!(activity.to, vec![AP_PUBLIC]);
        assert_eq!(activity.object._context.is_none(), true);
        assert_eq!(activity.object.attributed_to, activity.actor);
        assert_eq!(activity.object.to, activity.to);
        assert_eq!(activity.object.cc, activity.cc);
        assert_eq!(activity.published, post.created_at);
    }
}
