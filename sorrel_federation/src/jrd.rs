//! JSON Resource Descriptor
//! <https://datatracker.ietf.org/doc/html/rfc7033>
use serde::{Deserialize, Serialize};

use crate::constants::AP_MEDIA_TYPE;

pub const JRD_MEDIA_TYPE: &str = "application/jrd+json";

const LINK_REL_SELF: &str = "self";

#[derive(Deserialize, Serialize)]
pub struct Link {
    pub rel: String,

    #[serde(
        rename = "type",
        skip_serializing_if = "Option::is_none",
    )]
    pub media_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Link {
    pub fn actor(actor_id: &str) -> Self {
        Self {
            rel: LINK_REL_SELF.to_string(),
            media_type: Some(AP_MEDIA_TYPE.to_string()),
            href: Some(actor_id.to_string()),
        }
    }

    pub fn is_actor_link(&self) -> bool {
        self.rel == LINK_REL_SELF &&
            self.media_type.as_deref() == Some(AP_MEDIA_TYPE)
    }
}

#[derive(Deserialize, Serialize)]
pub struct JsonResourceDescriptor {
    pub subject: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    pub links: Vec<Link>,
}

impl JsonResourceDescriptor {
    /// Picks the first link that points to an ActivityPub actor
    pub fn find_actor_id(&self) -> Option<String> {
        self.links.iter()
            .find(|link| link.is_actor_link())
            .and_then(|link| link.href.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn test_find_actor_id() {
        let jrd_value = json!({
            "subject": "acct:alice@social.example",
            "links": [
                {
                    "rel": "http://webfinger.net/rel/profile-page",
                    "type": "text/html",
                    "href": "https://social.example/@alice",
                },
                {
                    "rel": "self",
                    "type": "application/activity+json",
                    "href": "https://social.example/users/alice",
                },
            ],
        });
        let jrd: JsonResourceDescriptor =
            serde_json::from_value(jrd_value).unwrap();
        assert_eq!(
            jrd.find_actor_id().unwrap(),
            "https://social.example/users/alice",
        );
    }

    #[test]
    fn test_find_actor_id_not_present() {
        let jrd = JsonResourceDescriptor {
            subject: "acct:alice@social.example".to_string(),
            aliases: vec![],
            links: vec![],
        };
        assert_eq!(jrd.find_actor_id(), None);
    }
}
