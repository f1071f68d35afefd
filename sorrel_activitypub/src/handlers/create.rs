use serde::Deserialize;
use serde_json::{Value as JsonValue};

use sorrel_config::Config;
use sorrel_federation::deserialization::deserialize_into_object_id;
use sorrel_models::database::DatabaseClient;

use crate::errors::ValidationError;
use crate::importers::{import_post, ApClient};

use super::note::AttributedObject;
use super::{Descriptor, HandlerResult};

#[derive(Deserialize)]
struct CreateNote {
    #[serde(deserialize_with = "deserialize_into_object_id")]
    actor: String,
    object: JsonValue,
}

pub async fn handle_create(
    config: &Config,
    db_client: &mut impl DatabaseClient,
    activity: JsonValue,
) -> HandlerResult {
    let CreateNote {
        actor: activity_actor,
        object,
    } = serde_json::from_value(activity)?;

    let object: AttributedObject = serde_json::from_value(object)?;
    if object.attributed_to()? != activity_actor {
        return Err(ValidationError("actor is not authorized to create object").into());
    };
    let object_id = object.id.clone();
    let object_type = object.object_type.clone();
    let ap_client = ApClient::new(config);
    // The object has been authenticated by the caller;
    // reply-to ancestors are resolved recursively
    import_post(
        &ap_client,
        db_client,
        object_id,
        Some(object),
    ).await?;
    Ok(Some(Descriptor::object(object_type)))
}
