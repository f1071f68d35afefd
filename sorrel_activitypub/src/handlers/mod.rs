mod accept;
pub mod activity;
mod announce;
mod create;
mod delete;
mod follow;
pub mod note;
mod reject;
mod undo;

use crate::errors::HandlerError;

use activity::Descriptor;

// Handlers should return activity description if activity has been accepted
// or None if it has been ignored
type HandlerResult = Result<Option<Descriptor>, HandlerError>;
