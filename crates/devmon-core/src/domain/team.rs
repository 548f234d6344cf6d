use serde::{Deserialize, Serialize};

use crate::{Member, SourceId, Sprint};

/// Aggregate metrics computed on every fetch; never stored historically.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMetrics {
    pub velocity: f64,
    pub active_stories: u32,
    /// Mean cycle time in days, `None` when the tracker data does not allow
    /// computing it.
    #[serde(default)]
    pub average_cycle_time_days: Option<f64>,
    pub sprint_progress: u32,
}

impl TeamMetrics {
    pub const fn zero() -> Self {
        Self {
            velocity: 0.0,
            active_stories: 0,
            average_cycle_time_days: None,
            sprint_progress: 0,
        }
    }
}

/// Read-through projection of a tracker team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub members: Vec<Member>,
    pub sprint: Option<Sprint>,
    pub metrics: TeamMetrics,
    pub source: SourceId,
}

impl Team {
    /// Team with no members, no sprint and zero metrics. Fills the slot of a
    /// team whose detail fetch failed.
    pub fn placeholder(
        id: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
        source: SourceId,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description,
            members: Vec::new(),
            sprint: None,
            metrics: TeamMetrics::zero(),
            source,
        }
    }

    pub fn active_member_count(&self) -> usize {
        self.members.iter().filter(|member| member.is_active).count()
    }
}
