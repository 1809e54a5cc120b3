use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Certificate {
    pub id: i64,
    pub certificate_number: String,
    pub quiz_id: i64,
    pub attempt_id: i64,
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
}
