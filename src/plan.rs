//! Execution plans reported by the agent.

use serde::{Deserialize, Serialize};

/// The agent's current plan for a complex task.
///
/// Each `plan` session update replaces the previous plan wholesale; entries
/// are matched by position, not identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Ordered plan entries.
    pub entries: Vec<PlanEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl Plan {
    pub fn new(entries: Vec<PlanEntry>) -> Self {
        Plan { entries, meta: None }
    }
}

/// A single step in the agent's plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    /// What this step accomplishes, in the user's language.
    pub content: String,
    pub priority: PlanEntryPriority,
    pub status: PlanEntryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "_meta")]
    pub meta: Option<serde_json::Value>,
}

impl PlanEntry {
    pub fn new(
        content: impl Into<String>,
        priority: PlanEntryPriority,
        status: PlanEntryStatus,
    ) -> Self {
        PlanEntry {
            content: content.into(),
            priority,
            status,
            meta: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanEntryPriority {
    High,
    Medium,
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanEntryStatus {
    Pending,
    InProgress,
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plan_round_trips() {
        let plan = Plan::new(vec![
            PlanEntry::new(
                "Find the bug",
                PlanEntryPriority::High,
                PlanEntryStatus::InProgress,
            ),
            PlanEntry::new("Fix it", PlanEntryPriority::Medium, PlanEntryStatus::Pending),
        ]);
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(
            value,
            json!({
                "entries": [
                    { "content": "Find the bug", "priority": "high", "status": "in_progress" },
                    { "content": "Fix it", "priority": "medium", "status": "pending" }
                ]
            })
        );
        let decoded: Plan = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, plan);
    }
}
