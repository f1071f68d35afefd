use std::fmt;

use serde_json::{Value as JsonValue};

use sorrel_config::Config;
use sorrel_federation::deserialization::object_to_id;
use sorrel_models::database::DatabaseClient;

use crate::errors::{HandlerError, ValidationError};
use crate::vocabulary::*;

use super::{
    accept::handle_accept,
    announce::handle_announce,
    create::handle_create,
    delete::handle_delete,
    follow::handle_follow,
    reject::handle_reject,
    undo::handle_undo,
};

/// Description of a processed activity, used for logging
pub struct Descriptor(String);

impl Descriptor {
    pub fn object(object_type: impl ToString) -> Self {
        Self(object_type.to_string())
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(object_type) = self;
        write!(formatter, "{}", object_type)
    }
}

pub async fn handle_activity(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    activity: &JsonValue,
) -> Result<(), HandlerError> {
    let activity_type = activity["type"].as_str()
        .ok_or(ValidationError("'type' property is missing"))?
        .to_owned();
    let activity_actor = object_to_id(&activity["actor"])
        .map_err(|_| ValidationError("invalid 'actor' property"))?;
    let activity = activity.clone();
    let maybe_object_type = match activity_type.as_str() {
        ACCEPT => {
            handle_accept(config, db_client, activity).await?
        },
        ANNOUNCE => {
            handle_announce(config, db_client, activity).await?
        },
        CREATE => {
            handle_create(config, db_client, activity).await?
        },
        DELETE => {
            handle_delete(config, db_client, activity).await?
        },
        FOLLOW => {
            handle_follow(config, db_client, activity).await?
        },
        REJECT => {
            handle_reject(config, db_client, activity).await?
        },
        UNDO => {
            handle_undo(config, db_client, activity).await?
        },
        _ => {
            return Err(HandlerError::UnsupportedActivity(activity_type));
        },
    };
    if let Some(object_type) = maybe_object_type {
        log::info!(
            "processed {}({}) from {}",
            activity_type,
            object_type,
            activity_actor,
        );
    };
    Ok(())
}
