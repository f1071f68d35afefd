use serde::{
    Deserialize,
    Deserializer,
    de::{
        DeserializeOwned,
        Error as DeserializerError,
    },
};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct DeserializationError(&'static str);

/// Parses object json value and returns its ID as string
pub fn object_to_id(
    object: &Value,
) -> Result<String, DeserializationError> {
    let object_id = match object {
        Value::String(string) => string.to_owned(),
        Value::Object(_) => {
            object["id"].as_str()
                .ok_or(DeserializationError("missing 'id' property"))?
                .to_owned()
        },
        _ => return Err(DeserializationError("unexpected value type")),
    };
    Ok(object_id)
}

pub fn deserialize_into_object_id<'de, D>(
    deserializer: D,
) -> Result<String, D::Error>
    where D: Deserializer<'de>
{
    let value = Value::deserialize(deserializer)?;
    let object_id = object_to_id(&value)
        .map_err(DeserializerError::custom)?;
    Ok(object_id)
}

pub fn deserialize_into_object_id_opt<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
    where D: Deserializer<'de>
{
    let maybe_value: Option<Value> = Option::deserialize(deserializer)?;
    let maybe_object_id = if let Some(value) = maybe_value {
        let object_id = object_to_id(&value)
            .map_err(DeserializerError::custom)?;
        Some(object_id)
    } else {
        None
    };
    Ok(maybe_object_id)
}

/// Transforms arbitrary property value into array of object IDs
pub fn parse_into_id_array(
    value: &Value,
) -> Result<Vec<String>, DeserializationError> {
    let result = match value {
        Value::Null => vec![],
        Value::String(_) | Value::Object(_) => {
            let object_id = object_to_id(value)?;
            vec![object_id]
        },
        Value::Array(array) => {
            let mut results = vec![];
            for value in array {
                let object_id = object_to_id(value)?;
                results.push(object_id);
            };
            results
        },
        _ => return Err(DeserializationError("unexpected value type")),
    };
    Ok(result)
}

pub fn deserialize_into_id_array<'de, D>(
    deserializer: D,
) -> Result<Vec<String>, D::Error>
    where D: Deserializer<'de>
{
    let value: Value = Value::deserialize(deserializer)?;
    parse_into_id_array(&value).map_err(DeserializerError::custom)
}

/// Transforms arbitrary property value into array of structs
pub fn parse_into_array<T: DeserializeOwned>(
    value: &Value,
) -> Result<Vec<T>, DeserializationError> {
    let objects = match value {
        Value::Array(array) => array.clone(),
        Value::Object(_) => vec![value.clone()],
        _ => return Err(DeserializationError("unexpected value type")),
    };
    let mut items = vec![];
    for object in objects {
        let item: T = serde_json::from_value(object)
            .map_err(|_| DeserializationError("invalid array item"))?;
        items.push(item);
    };
    Ok(items)
}

pub fn deserialize_object_array<'de, D, T>(
    deserializer: D,
) -> Result<Vec<T>, D::Error>
    where D: Deserializer<'de>, T: DeserializeOwned
{
    let maybe_value: Option<Value> = Option::deserialize(deserializer)?;
    let objects = if let Some(value) = maybe_value {
        parse_into_array(&value).map_err(DeserializerError::custom)?
    } else {
        vec![]
    };
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn test_object_to_id_string() {
        let value = json!("test_id");
        assert_eq!(object_to_id(&value).unwrap(), "test_id");
    }

    #[test]
    fn test_object_to_id_object() {
        let value = json!({"id": "test_id", "type": "Note"});
        assert_eq!(object_to_id(&value).unwrap(), "test_id");
    }

    #[test]
    fn test_object_to_id_array() {
        let value = json!(["test_id"]);
        assert_eq!(
            object_to_id(&value).err().unwrap().to_string(),
            "unexpected value type",
        );
    }

    #[test]
    fn test_deserialize_into_object_id_opt() {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct TestObject {
            #[serde(default, deserialize_with = "deserialize_into_object_id_opt")]
            in_reply_to: Option<String>,
        }

        let value = json!({});
        let object: TestObject = serde_json::from_value(value).unwrap();
        assert_eq!(object.in_reply_to, None);

        let value = json!({"inReplyTo": "https://social.example/mypost"});
        let object: TestObject = serde_json::from_value(value).unwrap();
        assert_eq!(
            object.in_reply_to,
            Some("https://social.example/mypost".to_string()),
        );
    }

    #[test]
    fn test_parse_into_id_array_with_string() {
        let value = json!("test");
        assert_eq!(
            parse_into_id_array(&value).unwrap(),
            vec!["test".to_string()],
        );
    }

    #[test]
    fn test_parse_into_id_array_with_array_of_objects() {
        let value = json!([{"id": "test1"}, {"id": "test2"}]);
        assert_eq!(
            parse_into_id_array(&value).unwrap(),
            vec!["test1".to_string(), "test2".to_string()],
        );
    }

    #[test]
    fn test_parse_into_id_array_with_empty() {
        let object = json!({"key": 1});
        let value = &object["test"];
        assert_eq!(
            parse_into_id_array(value).unwrap().is_empty(),
            true,
        );
    }

    #[test]
    fn test_deserialize_into_id_array() {
        #[derive(Deserialize)]
        struct TestObject {
            #[serde(default, deserialize_with = "deserialize_into_id_array")]
            to: Vec<String>,
        }

        let value = json!({});
        let object: TestObject = serde_json::from_value(value).unwrap();
        assert_eq!(object.to.is_empty(), true);

        let value = json!({"to": "https://social.example/actor"});
        let object: TestObject = serde_json::from_value(value).unwrap();
        assert_eq!(
            object.to,
            vec!["https://social.example/actor".to_string()],
        );
    }
}
