use http::header::HeaderValue;

use crate::constants::AP_PUBLIC;

// Aliases seen in the wild
const PUBLIC_ALIASES: [&str; 3] = [
    AP_PUBLIC,
    "as:Public",
    "Public",
];

pub fn is_public(audience_item: impl AsRef<str>) -> bool {
    PUBLIC_ALIASES.contains(&audience_item.as_ref())
}

/// Key ID is the actor ID plus a fragment
pub fn key_id_to_actor_id(key_id: &str) -> Result<String, &'static str> {
    let actor_id = key_id
        .split('#').next()
        .expect("split should produce at least one element")
        // Workaround for GNU Social
        .split('?').next()
        .expect("split should produce at least one element")
        .to_string();
    if actor_id.is_empty() {
        return Err("invalid key ID");
    };
    Ok(actor_id)
}

/// Extracts media type from Content-Type header value,
/// dropping parameters such as charset
pub fn extract_media_type(header_value: &HeaderValue) -> Option<String> {
    header_value.to_str().ok()
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_public() {
        assert_eq!(is_public(AP_PUBLIC), true);
        assert_eq!(is_public("as:Public"), true);
        assert_eq!(is_public("https://social.example/users/1"), false);
    }

    #[test]
    fn test_key_id_to_actor_id() {
        let key_id = "https://social.example/users/1#main-key";
        assert_eq!(
            key_id_to_actor_id(key_id).unwrap(),
            "https://social.example/users/1",
        );
        // GNU Social style
        let key_id = "https://social.example/user/1?id=123";
        assert_eq!(
            key_id_to_actor_id(key_id).unwrap(),
            "https://social.example/user/1",
        );
    }

    #[test]
    fn test_extract_media_type() {
        let header_value =
            HeaderValue::from_static("application/activity+json; charset=utf-8");
        assert_eq!(
            extract_media_type(&header_value).unwrap(),
            "application/activity+json",
        );
    }
}
