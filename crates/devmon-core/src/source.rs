use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Provenance tag carried by every normalized team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    #[serde(rename = "azure-devops")]
    AzureDevOps,
    Jira,
}

impl SourceId {
    pub const ALL: [Self; 2] = [Self::AzureDevOps, Self::Jira];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AzureDevOps => "azure-devops",
            Self::Jira => "jira",
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "azure-devops" | "azure_devops" | "azuredevops" | "ado" => Ok(Self::AzureDevOps),
            "jira" => Ok(Self::Jira),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}
