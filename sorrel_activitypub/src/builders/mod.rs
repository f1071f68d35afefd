pub mod accept_follow;
pub mod announce;
pub mod collection;
pub mod create_note;
pub mod delete_note;
pub mod follow;
pub mod note;
pub mod undo_follow;
