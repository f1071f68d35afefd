use regex::Regex;
use uuid::Uuid;

use sorrel_models::posts::types::Post;
use sorrel_models::profiles::types::DbActorProfile;

use crate::errors::ValidationError;

pub enum LocalActorCollection {
    Inbox,
    Outbox,
    Followers,
    Following,
}

impl LocalActorCollection {
    pub fn of(&self, actor_id: &str) -> String {
        let name = match self {
            Self::Inbox => "inbox",
            Self::Outbox => "outbox",
            Self::Followers => "followers",
            Self::Following => "following",
        };
        format!("{}/{}", actor_id, name)
    }
}

pub fn local_actor_id(instance_url: &str, profile_id: Uuid) -> String {
    format!("{}/api/users/{}", instance_url, profile_id)
}

pub fn local_instance_actor_id(instance_url: &str) -> String {
    format!("{}/actor", instance_url)
}

pub fn local_actor_key_id(actor_id: &str) -> String {
    format!("{}#main-key", actor_id)
}

pub fn local_actor_followers(instance_url: &str, profile_id: Uuid) -> String {
    let actor_id = local_actor_id(instance_url, profile_id);
    LocalActorCollection::Followers.of(&actor_id)
}

pub fn local_object_id(instance_url: &str, post_id: Uuid) -> String {
    format!("{}/api/posts/{}", instance_url, post_id)
}

pub fn local_activity_id(
    instance_url: &str,
    activity_type: &str,
    internal_id: Uuid,
) -> String {
    format!(
        "{}/api/activities/{}/{}",
        instance_url,
        activity_type.to_lowercase(),
        internal_id,
    )
}

fn parse_local_id(
    instance_url: &str,
    object_id: &str,
    path_re: &str,
) -> Result<Uuid, ValidationError> {
    let path = object_id.strip_prefix(instance_url)
        .ok_or(ValidationError("instance mismatch"))?;
    let path_re = Regex::new(path_re).expect("regexp should be valid");
    let caps = path_re.captures(path)
        .ok_or(ValidationError("invalid local object ID"))?;
    let internal_id = caps["uuid"].parse()
        .map_err(|_| ValidationError("invalid local object ID"))?;
    Ok(internal_id)
}

pub fn parse_local_actor_id(
    instance_url: &str,
    actor_id: &str,
) -> Result<Uuid, ValidationError> {
    parse_local_id(instance_url, actor_id, r"^/api/users/(?P<uuid>[0-9a-f-]+)$")
}

pub fn parse_local_object_id(
    instance_url: &str,
    object_id: &str,
) -> Result<Uuid, ValidationError> {
    parse_local_id(instance_url, object_id, r"^/api/posts/(?P<uuid>[0-9a-f-]+)$")
}

pub fn parse_local_activity_id(
    instance_url: &str,
    activity_id: &str,
) -> Result<Uuid, ValidationError> {
    parse_local_id(
        instance_url,
        activity_id,
        r"^/api/activities/[a-z]+/(?P<uuid>[0-9a-f-]+)$",
    )
}

/// Returns canonical actor ID of a profile, minting it for local profiles
pub fn profile_actor_id(instance_url: &str, profile: &DbActorProfile) -> String {
    match profile.actor_json {
        Some(ref actor) => actor.id.clone(),
        None => local_actor_id(instance_url, profile.id),
    }
}

/// Returns canonical object ID of a post.
/// Must not be used for pure reposts (they are activities, not objects).
pub fn post_object_id(instance_url: &str, post: &Post) -> String {
    assert!(!post.is_repost(), "reposts don't have object IDs");
    match post.object_id {
        Some(ref object_id) => object_id.clone(),
        None => local_object_id(instance_url, post.id),
    }
}

#[cfg(test)]
mod tests {
    use sorrel_utils::id::generate_ulid;
    use super::*;

    const INSTANCE_URL: &str = "https://social.example";

    #[test]
    fn test_local_actor_id() {
        let profile_id = generate_ulid();
        let actor_id = local_actor_id(INSTANCE_URL, profile_id);
        assert_eq!(
            actor_id,
            format!("https://social.example/api/users/{}", profile_id),
        );
        let parsed = parse_local_actor_id(INSTANCE_URL, &actor_id).unwrap();
        assert_eq!(parsed, profile_id);
    }

    #[test]
    fn test_parse_local_actor_id_instance_mismatch() {
        let profile_id = generate_ulid();
        let actor_id = local_actor_id("https://other.example", profile_id);
        let result = parse_local_actor_id(INSTANCE_URL, &actor_id);
        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn test_parse_local_object_id() {
        let post_id = generate_ulid();
        let object_id = local_object_id(INSTANCE_URL, post_id);
        let parsed = parse_local_object_id(INSTANCE_URL, &object_id).unwrap();
        assert_eq!(parsed, post_id);
    }

    #[test]
    fn test_parse_local_object_id_invalid_uuid() {
        let object_id = "https://social.example/api/posts/123-abc";
        let result = parse_local_object_id(INSTANCE_URL, object_id);
        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn test_local_activity_id() {
        let internal_id = generate_ulid();
        let activity_id = local_activity_id(INSTANCE_URL, "Follow", internal_id);
        assert_eq!(
            activity_id,
            format!("https://social.example/api/activities/follow/{}", internal_id),
        );
        let parsed = parse_local_activity_id(INSTANCE_URL, &activity_id).unwrap();
        assert_eq!(parsed, internal_id);
    }

    #[test]
    fn test_profile_actor_id() {
        let local_profile = DbActorProfile::local_for_test("local");
        assert_eq!(
            profile_actor_id(INSTANCE_URL, &local_profile),
            format!("https://social.example/api/users/{}", local_profile.id),
        );
        let remote_profile =
            DbActorProfile::remote_for_test("remote", "remote.example");
        assert_eq!(
            profile_actor_id(INSTANCE_URL, &remote_profile),
            "https://remote.example/users/remote",
        );
    }
}
