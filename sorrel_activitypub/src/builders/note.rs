use chrono::{DateTime, Utc};
use serde::Serialize;

use sorrel_federation::constants::AP_PUBLIC;
use sorrel_models::posts::types::{Post, Visibility};

use crate::contexts::{build_default_context, Context};
use crate::identifiers::{
    local_actor_followers,
    local_actor_id,
    local_object_id,
    post_object_id,
    profile_actor_id,
};
use crate::vocabulary::{DOCUMENT, HASHTAG, MENTION, NOTE};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleTag {
    #[serde(rename = "type")]
    pub tag_type: String,
    pub href: String,
    pub name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachment {
    #[serde(rename = "type")]
    attachment_type: String,
    media_type: Option<String>,
    url: String,
}

fn media_file_url(instance_url: &str, file_name: &str) -> String {
    format!("{}/media/{}", instance_url, file_name)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub(super) _context: Option<Context>,

    pub id: String,

    #[serde(rename = "type")]
    object_type: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachment: Vec<MediaAttachment>,

    pub attributed_to: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,

    pub content: String,
    pub sensitive: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<SimpleTag>,

    pub to: Vec<String>,
    pub cc: Vec<String>,

    pub published: DateTime<Utc>,
}

fn local_tag_collection(instance_url: &str, tag_name: &str) -> String {
    format!("{}/api/hashtags/{}", instance_url, tag_name)
}

pub fn build_note(
    instance_hostname: &str,
    instance_url: &str,
    post: &Post,
    maybe_in_reply_to: Option<&Post>,
    with_context: bool,
) -> Note {
    let object_id = local_object_id(instance_url, post.id);
    let actor_id = local_actor_id(instance_url, post.author.id);
    let attachments: Vec<MediaAttachment> = post.attachments.iter()
        .map(|db_item| {
            MediaAttachment {
                attachment_type: DOCUMENT.to_string(),
                media_type: db_item.media_type.clone(),
                url: media_file_url(instance_url, &db_item.file_name),
            }
        })
        .collect();

    let mut primary_audience = vec![];
    let mut secondary_audience = vec![];
    let followers_collection_id =
        local_actor_followers(instance_url, post.author.id);
    match post.visibility {
        Visibility::Public => {
            primary_audience.push(AP_PUBLIC.to_string());
            secondary_audience.push(followers_collection_id);
        },
        Visibility::Unlisted => {
            primary_audience.push(followers_collection_id);
            secondary_audience.push(AP_PUBLIC.to_string());
        },
        Visibility::Followers => {
            primary_audience.push(followers_collection_id);
        },
        Visibility::Direct => (),
    };

    let mut tags = vec![];
    for profile in &post.mentions {
        let tag_name = format!("@{}", profile.acct(instance_hostname));
        let mentioned_actor_id = profile_actor_id(instance_url, profile);
        if !primary_audience.contains(&mentioned_actor_id) {
            primary_audience.push(mentioned_actor_id.clone());
        };
        let tag = SimpleTag {
            tag_type: MENTION.to_string(),
            name: tag_name,
            href: mentioned_actor_id,
        };
        tags.push(tag);
    };
    for tag_name in &post.tags {
        let tag = SimpleTag {
            tag_type: HASHTAG.to_string(),
            name: format!("#{}", tag_name),
            href: local_tag_collection(instance_url, tag_name),
        };
        tags.push(tag);
    };

    let in_reply_to_object_id = match maybe_in_reply_to {
        Some(in_reply_to) => {
            assert_eq!(Some(in_reply_to.id), post.in_reply_to_id);
            let in_reply_to_actor_id =
                profile_actor_id(instance_url, &in_reply_to.author);
            if !primary_audience.contains(&in_reply_to_actor_id) {
                primary_audience.push(in_reply_to_actor_id);
            };
            Some(post_object_id(instance_url, in_reply_to))
        },
        None => None,
    };
    Note {
        _context: with_context.then(build_default_context),
        id: object_id,
        object_type: NOTE.to_string(),
        attachment: attachments,
        attributed_to: actor_id,
        in_reply_to: in_reply_to_object_id,
        content: post.expect_content().to_string(),
        sensitive: post.is_sensitive,
        tag: tags,
        to: primary_audience,
        cc: secondary_audience,
        published: post.created_at,
    }
}
