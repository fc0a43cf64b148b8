use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum QuestKind {
    #[serde(rename = "checkin")]
    CheckIn,
    #[serde(rename = "diary")]
    WriteDiary,
    #[serde(rename = "post")]
    SharePost,
}

impl QuestKind {
    pub const ALL: [QuestKind; 3] = [QuestKind::CheckIn, QuestKind::WriteDiary, QuestKind::SharePost];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestKind::CheckIn => "checkin",
            QuestKind::WriteDiary => "diary",
            QuestKind::SharePost => "post",
        }
    }

    pub fn from_type(s: &str) -> Option<Self> {
        match s {
            "checkin" => Some(QuestKind::CheckIn),
            "diary" => Some(QuestKind::WriteDiary),
            "post" => Some(QuestKind::SharePost),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            QuestKind::CheckIn => "Daily Check-in",
            QuestKind::WriteDiary => "Write a Diary Entry",
            QuestKind::SharePost => "Share a Post",
        }
    }

    /// Coin reward granted on claim.
    pub fn reward(&self) -> i64 {
        match self {
            QuestKind::CheckIn => 10,
            QuestKind::WriteDiary => 20,
            QuestKind::SharePost => 15,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestStatus {
    Pending,
    Completed,
}

/// A day-scoped quest instance. Identity is `{type}-{yyyyMMdd}`.
#[derive(Debug, Clone, Serialize)]
pub struct Quest {
    pub quest_id: String,
    pub title: String,
    pub kind: QuestKind,
    pub start_at: DateTime<Utc>,
    /// Exclusive.
    pub end_at: DateTime<Utc>,
    pub status: QuestStatus,
    pub claimed: bool,
    pub reward: i64,
    pub current_progress: i32,
    pub max_progress: i32,
}

pub fn quest_id(kind: QuestKind, date: NaiveDate) -> String {
    format!("{}-{}", kind.as_str(), date.format("%Y%m%d"))
}

pub fn parse_quest_id(id: &str) -> Option<(QuestKind, NaiveDate)> {
    let (kind, date) = id.split_once('-')?;
    let kind = QuestKind::from_type(kind)?;
    if date.len() != 8 {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, "%Y%m%d").ok()?;
    Some((kind, date))
}

/// Result of a reward claim. `granted` is false when a claim marker already existed.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ClaimOutcome {
    pub granted: bool,
    pub reward: i64,
    pub balance: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quest_id_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(quest_id(QuestKind::WriteDiary, date), "diary-20260307");
        assert_eq!(quest_id(QuestKind::CheckIn, date), "checkin-20260307");
    }

    #[test]
    fn test_parse_quest_id_inverts_quest_id() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        for kind in QuestKind::ALL {
            let id = quest_id(kind, date);
            assert_eq!(parse_quest_id(&id), Some((kind, date)));
        }
    }

    #[test]
    fn test_parse_quest_id_rejects_garbage() {
        assert_eq!(parse_quest_id("diary"), None);
        assert_eq!(parse_quest_id("walk-20260101"), None);
        assert_eq!(parse_quest_id("diary-2026-01-01"), None);
        assert_eq!(parse_quest_id("diary-20261340"), None);
    }

    #[test]
    fn test_kind_serializes_as_type_string() {
        for kind in QuestKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
        let kind: QuestKind = serde_json::from_str("\"checkin\"").unwrap();
        assert_eq!(kind, QuestKind::CheckIn);
    }
}
