// https://www.w3.org/TR/activitystreams-vocabulary/

// Activity types
pub const ACCEPT: &str = "Accept";
pub const ANNOUNCE: &str = "Announce";
pub const CREATE: &str = "Create";
pub const DELETE: &str = "Delete";
pub const FOLLOW: &str = "Follow";
pub const REJECT: &str = "Reject";
pub const UNDO: &str = "Undo";

// Actor types
pub const APPLICATION: &str = "Application";
pub const PERSON: &str = "Person";

// Object types
pub const DOCUMENT: &str = "Document";
pub const NOTE: &str = "Note";
pub const TOMBSTONE: &str = "Tombstone";

// Link types
pub const HASHTAG: &str = "Hashtag";
pub const MENTION: &str = "Mention";

// Collections
pub const ORDERED_COLLECTION: &str = "OrderedCollection";
pub const ORDERED_COLLECTION_PAGE: &str = "OrderedCollectionPage";

// Misc
pub const KEY: &str = "Key";
