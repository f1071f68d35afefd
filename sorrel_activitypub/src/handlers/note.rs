use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value as JsonValue};

use sorrel_federation::deserialization::{
    deserialize_into_id_array,
    deserialize_into_object_id_opt,
    deserialize_object_array,
};
use sorrel_federation::utils::is_public;
use sorrel_models::database::{DatabaseClient, DatabaseError};
use sorrel_models::posts::queries::{create_post, get_remote_post_by_object_id};
use sorrel_models::posts::types::{Post, PostCreateData, Visibility};
use sorrel_utils::urls::is_same_origin;

use crate::errors::{HandlerError, ValidationError};
use crate::importers::{get_post_by_object_id, ActorIdResolver, ApClient};
use crate::vocabulary::{HASHTAG, NOTE};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributedObject {
    pub id: String,

    #[serde(rename = "type")]
    pub object_type: String,

    #[serde(default, deserialize_with = "deserialize_into_id_array")]
    attributed_to: Vec<String>,

    pub content: Option<String>,

    #[serde(default, deserialize_with = "deserialize_into_object_id_opt")]
    pub in_reply_to: Option<String>,

    pub published: Option<DateTime<Utc>>,

    #[serde(default)]
    pub sensitive: bool,

    #[serde(default, deserialize_with = "deserialize_into_id_array")]
    pub to: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_into_id_array")]
    pub cc: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_object_array")]
    pub tag: Vec<JsonValue>,
}

impl AttributedObject {
    pub fn attributed_to(&self) -> Result<&str, ValidationError> {
        let author_id = self.attributed_to.first()
            .ok_or(ValidationError("invalid 'attributedTo' property"))?;
        Ok(author_id)
    }

    pub fn audience(&self) -> Vec<String> {
        [self.to.clone(), self.cc.clone()].concat()
    }

    fn hashtags(&self) -> Vec<String> {
        let mut tags = vec![];
        for tag_value in &self.tag {
            if tag_value["type"].as_str() != Some(HASHTAG) {
                continue;
            };
            let Some(tag_name) = tag_value["name"].as_str() else {
                continue;
            };
            let tag_name = tag_name
                .trim_start_matches('#')
                .to_lowercase();
            if !tag_name.is_empty() && !tags.contains(&tag_name) {
                tags.push(tag_name);
            };
        };
        tags
    }
}

/// Audience-based visibility:
/// the public collection in `to` makes a post public,
/// in `cc` unlisted; a followers collection in `to` makes it
/// followers-only; otherwise the post is direct.
pub fn get_object_visibility(to: &[String], cc: &[String]) -> Visibility {
    if to.iter().any(is_public) {
        Visibility::Public
    } else if cc.iter().any(is_public) {
        Visibility::Unlisted
    } else if to.iter().any(|target_id| target_id.ends_with("/followers")) {
        Visibility::Followers
    } else {
        Visibility::Direct
    }
}

pub async fn create_remote_post(
    ap_client: &ApClient,
    db_client: &mut impl DatabaseClient,
    object: AttributedObject,
) -> Result<Post, HandlerError> {
    if object.object_type != NOTE {
        return Err(HandlerError::ValidationError(
            format!("unsupported object type: {}", object.object_type),
        ));
    };
    let author_id = object.attributed_to()?.to_owned();
    // The object must belong to its author's origin
    if !is_same_origin(&object.id, &author_id).unwrap_or(false) {
        return Err(ValidationError("object owner has different origin").into());
    };
    let author = ActorIdResolver::default().only_remote().resolve(
        ap_client,
        db_client,
        &author_id,
    ).await?;
    let maybe_in_reply_to_id = match object.in_reply_to {
        Some(ref in_reply_to_id) => {
            // Ancestors are imported before their replies
            let in_reply_to = get_post_by_object_id(
                db_client,
                &ap_client.instance.url(),
                in_reply_to_id,
            ).await?;
            Some(in_reply_to.id)
        },
        None => None,
    };
    let content = object.content.clone()
        .ok_or(ValidationError("missing 'content' property"))?;
    let visibility = get_object_visibility(&object.to, &object.cc);
    let post_data = PostCreateData {
        id: None,
        content: Some(content),
        in_reply_to_id: maybe_in_reply_to_id,
        repost_of_id: None,
        visibility,
        is_sensitive: object.sensitive,
        object_id: Some(object.id.clone()),
        created_at: object.published,
        attachments: vec![],
        mentions: vec![],
        tags: object.hashtags(),
    };
    let post = match create_post(db_client, author.id, post_data).await {
        Ok(post) => post,
        Err(DatabaseError::AlreadyExists(_)) => {
            // Delivered twice (possibly by different means)
            get_remote_post_by_object_id(db_client, &object.id).await?
        },
        Err(other_error) => return Err(other_error.into()),
    };
    Ok(post)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sorrel_federation::constants::AP_PUBLIC;
    use super::*;

    #[test]
    fn test_deserialize_object() {
        let object_value = json!({
            "id": "https://peer.example/notes/n1",
            "type": "Note",
            "attributedTo": "https://peer.example/users/B",
            "content": "hi",
            "published": "2024-02-26T09:22:31Z",
            "to": [AP_PUBLIC],
            "cc": ["https://peer.example/users/B/followers"],
            "inReplyTo": "https://social.example/api/posts/018d5e74",
        });
        let object: AttributedObject =
            serde_json::from_value(object_value).unwrap();
        assert_eq!(object.object_type, "Note");
        assert_eq!(object.attributed_to().unwrap(), "https://peer.example/users/B");
        assert_eq!(object.content.as_deref(), Some("hi"));
        assert_eq!(
            object.in_reply_to.as_deref(),
            Some("https://social.example/api/posts/018d5e74"),
        );
        assert_eq!(object.published.is_some(), true);
    }

    #[test]
    fn test_deserialize_object_attributed_to_array() {
        let object_value = json!({
            "id": "https://peer.example/notes/n1",
            "type": "Note",
            "attributedTo": [{"id": "https://peer.example/users/B"}],
            "content": "hi",
        });
        let object: AttributedObject =
            serde_json::from_value(object_value).unwrap();
        assert_eq!(
            object.attributed_to().unwrap(),
            "https://peer.example/users/B",
        );
    }

    #[test]
    fn test_object_hashtags() {
        let object_value = json!({
            "id": "https://peer.example/notes/n1",
            "type": "Note",
            "attributedTo": "https://peer.example/users/B",
            "content": "hello #World",
            "tag": [
                {"type": "Hashtag", "name": "#World"},
                {"type": "Mention", "name": "@user@social.example"},
            ],
        });
        let object: AttributedObject =
            serde_json::from_value(object_value).unwrap();
        assert_eq!(object.hashtags(), vec!["world".to_string()]);
    }

    #[test]
    fn test_get_object_visibility_public() {
        let to = vec![AP_PUBLIC.to_string()];
        let cc = vec![];
        let visibility = get_object_visibility(&to, &cc);
        assert_eq!(visibility, Visibility::Public);
    }

    #[test]
    fn test_get_object_visibility_unlisted() {
        let to = vec!["https://peer.example/users/B/followers".to_string()];
        let cc = vec![AP_PUBLIC.to_string()];
        let visibility = get_object_visibility(&to, &cc);
        assert_eq!(visibility, Visibility::Unlisted);
    }

    #[test]
    fn test_get_object_visibility_followers() {
        let to = vec!["https://peer.example/users/B/followers".to_string()];
        let cc = vec![];
        let visibility = get_object_visibility(&to, &cc);
        assert_eq!(visibility, Visibility::Followers);
    }

    #[test]
    fn test_get_object_visibility_direct() {
        let to = vec!["https://social.example/api/users/1".to_string()];
        let cc = vec![];
        let visibility = get_object_visibility(&to, &cc);
        assert_eq!(visibility, Visibility::Direct);
    }
}
