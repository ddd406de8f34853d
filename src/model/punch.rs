use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Punch event categories. `Leave`/`Return` are the lunchtime step-out
/// pair and carry time-of-day restrictions (see `api::punch`).
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PunchType {
    In,
    Out,
    Leave,
    Return,
}

impl PunchType {
    /// Display name shown to users.
    pub fn label(self) -> &'static str {
        match self {
            PunchType::In => "上班",
            PunchType::Out => "下班",
            PunchType::Leave => "外出",
            PunchType::Return => "返回",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PunchRecord {
    pub id: u64,
    pub user_id: u64,
    pub punch_type: String,
    #[schema(example = "2026-03-02T00:58:00Z", format = "date-time", value_type = String)]
    pub punch_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn punch_tags_and_labels() {
        assert_eq!(PunchType::from_str("return").unwrap(), PunchType::Return);
        assert_eq!(PunchType::Out.to_string(), "out");
        assert_eq!(PunchType::Leave.label(), "外出");
        assert!(PunchType::from_str("lunch").is_err());
    }
}
