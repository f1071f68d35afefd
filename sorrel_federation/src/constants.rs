pub const AP_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";
pub const AP_MEDIA_TYPE: &str = "application/activity+json";
pub const AS_MEDIA_TYPE: &str =
    r#"application/ld+json; profile="https://www.w3.org/ns/activitystreams""#;

/// Special collection denoting the public audience
pub const AP_PUBLIC: &str = "https://www.w3.org/ns/activitystreams#Public";
