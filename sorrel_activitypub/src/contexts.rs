use indexmap::IndexMap;

pub use sorrel_federation::constants::AP_CONTEXT;

pub const W3ID_SECURITY_CONTEXT: &str = "https://w3id.org/security/v1";
pub const MASTODON_CONTEXT: &str = "http://joinmastodon.org/ns#";

pub type Context = (
    &'static str,
    &'static str,
    IndexMap<&'static str, &'static str>,
);

// Default context for activities and objects
pub fn build_default_context() -> Context {
    (
        AP_CONTEXT,
        W3ID_SECURITY_CONTEXT,
        IndexMap::from([
            ("Hashtag", "as:Hashtag"),
            ("sensitive", "as:sensitive"),
            ("toot", MASTODON_CONTEXT),
        ]),
    )
}
