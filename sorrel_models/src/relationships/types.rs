use chrono::{DateTime, Utc};
use postgres_types::FromSql;
use uuid::Uuid;

use crate::database::{
    int_enum::{int_enum_from_sql, int_enum_to_sql},
    DatabaseTypeError,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FollowRequestDirection {
    Incoming,
    Outgoing,
}

impl From<&FollowRequestDirection> for i16 {
    fn from(value: &FollowRequestDirection) -> i16 {
        match value {
            FollowRequestDirection::Incoming => 1,
            FollowRequestDirection::Outgoing => 2,
        }
    }
}

impl TryFrom<i16> for FollowRequestDirection {
    type Error = DatabaseTypeError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        let direction = match value {
            1 => Self::Incoming,
            2 => Self::Outgoing,
            _ => return Err(DatabaseTypeError),
        };
        Ok(direction)
    }
}

int_enum_from_sql!(FollowRequestDirection);
int_enum_to_sql!(FollowRequestDirection);

#[allow(dead_code)]
#[derive(FromSql)]
#[postgres(name = "follow_request")]
pub struct DbFollowRequest {
    pub id: Uuid,
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub activity_id: Option<String>,
    pub direction: FollowRequestDirection,
    created_at: DateTime<Utc>,
}

pub struct FollowRequestCreateData {
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub activity_id: Option<String>,
    pub direction: FollowRequestDirection,
}
