use serde::{Deserialize, Serialize};

/// Closed set of roles a team member can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Developer,
    Lead,
    Qa,
    Designer,
    Product,
}

impl MemberRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Developer => "developer",
            Self::Lead => "lead",
            Self::Qa => "qa",
            Self::Designer => "designer",
            Self::Product => "product",
        }
    }

    /// Best-effort mapping from a tracker's own role vocabulary.
    ///
    /// The lookup is over the lower-cased input; anything not in the table is
    /// a developer.
    pub fn from_source_role(role: &str) -> Self {
        match role.trim().to_ascii_lowercase().as_str() {
            "developer" | "frontend_developer" | "backend_developer" => Self::Developer,
            "lead" | "scrum_master" => Self::Lead,
            "qa" | "test_engineer" => Self::Qa,
            "designer" | "ui_ux_designer" => Self::Designer,
            "product" | "product_owner" => Self::Product,
            _ => Self::Developer,
        }
    }
}

impl Default for MemberRole {
    fn default() -> Self {
        Self::Developer
    }
}

/// Normalized team member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub role: MemberRole,
    pub is_active: bool,
}

impl Member {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: MemberRole,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            avatar_url: None,
            role,
            is_active: true,
        }
    }

    pub fn with_avatar(mut self, avatar_url: Option<String>) -> Self {
        self.avatar_url = avatar_url;
        self
    }
}
