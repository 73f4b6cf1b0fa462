use serde::{Deserialize, Serialize};

/// One competing group as the remote sheet reports it. The client
/// keeps a read-only cached copy, refreshed on every poll.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Group {
    #[serde(rename = "tenNhom")]
    pub name: String,
    #[serde(rename = "deTai")]
    pub topic: String,
    #[serde(rename = "tongDiem", default)]
    pub total_score: f64,
    #[serde(rename = "xepHang", default)]
    pub rank: u32,
    #[serde(rename = "diemBGK")]
    pub judge_score: Option<f64>,
}

/// Aggregate state returned by `GET <endpoint>`.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    pub status: String,
    #[serde(default)]
    pub data: Vec<Group>,
    #[serde(rename = "isPublished", default)]
    pub is_published: bool,
}

impl Snapshot {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// One-way command requests for `POST <endpoint>`. Responses are never
/// parsed, so these only serialize.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action")]
pub enum Command {
    #[serde(rename = "LOGIN")]
    Login {
        name: String,
        msv: String,
        class: String,
    },
    #[serde(rename = "VOTE")]
    Vote {
        #[serde(rename = "groupName")]
        group_name: String,
    },
    #[serde(rename = "SUBMIT_SCORES")]
    SubmitScores { scores: Vec<ScoreEntry> },
    #[serde(rename = "PUBLISH")]
    Publish,
}

/// One row of a judge score batch. Scores stay string-encoded on the
/// wire, exactly as drafted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    #[serde(rename = "groupName")]
    pub group_name: String,
    pub score: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_parses_sheet_payload() {
        let raw = r#"{
            "status": "success",
            "isPublished": false,
            "data": [
                {"tenNhom": "Team A", "deTai": "Recycling drive", "tongDiem": 8.5, "xepHang": 2},
                {"tenNhom": "Team B", "deTai": "Open mic night", "tongDiem": 9.2, "xepHang": 1, "diemBGK": 9.0}
            ]
        }"#;

        let snapshot: Snapshot = serde_json::from_str(raw).unwrap();
        assert!(snapshot.is_success());
        assert!(!snapshot.is_published);
        assert_eq!(snapshot.data.len(), 2);
        assert_eq!(snapshot.data[0].name, "Team A");
        assert_eq!(snapshot.data[0].judge_score, None);
        assert_eq!(snapshot.data[1].rank, 1);
        assert_eq!(snapshot.data[1].judge_score, Some(9.0));
    }

    #[test]
    fn snapshot_tolerates_missing_fields() {
        let snapshot: Snapshot = serde_json::from_str(r#"{"status": "error"}"#).unwrap();
        assert!(!snapshot.is_success());
        assert!(snapshot.data.is_empty());
        assert!(!snapshot.is_published);
    }

    #[test]
    fn commands_serialize_to_sheet_actions() {
        let login = Command::Login {
            name: "An".into(),
            msv: "B21DCCN001".into(),
            class: "D21CQCN01".into(),
        };
        assert_eq!(
            serde_json::to_value(&login).unwrap(),
            serde_json::json!({
                "action": "LOGIN",
                "name": "An",
                "msv": "B21DCCN001",
                "class": "D21CQCN01"
            })
        );

        let vote = Command::Vote {
            group_name: "Team B".into(),
        };
        assert_eq!(
            serde_json::to_value(&vote).unwrap(),
            serde_json::json!({"action": "VOTE", "groupName": "Team B"})
        );

        let scores = Command::SubmitScores {
            scores: vec![ScoreEntry {
                group_name: "Team A".into(),
                score: "8.5".into(),
            }],
        };
        assert_eq!(
            serde_json::to_value(&scores).unwrap(),
            serde_json::json!({
                "action": "SUBMIT_SCORES",
                "scores": [{"groupName": "Team A", "score": "8.5"}]
            })
        );

        assert_eq!(
            serde_json::to_value(&Command::Publish).unwrap(),
            serde_json::json!({"action": "PUBLISH"})
        );
    }
}
