use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub const DEFAULT_GUIDELINE: &str = "Please write annotation guideline.";

/// Selects the annotation variant used by every document of a project.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum ProjectType {
    DocumentClassification,
    SequenceLabeling,
    Seq2seq,
}

impl ProjectType {
    pub fn has_labels(&self) -> bool {
        !matches!(self, ProjectType::Seq2seq)
    }
}

impl TryFrom<String> for ProjectType {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub guideline: String,
    #[cfg_attr(feature = "ssr", sqlx(try_from = "String"))]
    pub project_type: ProjectType,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Project {
    /// File name used for dataset exports, e.g. `My  Project` -> `my_project`.
    pub fn export_filename(&self) -> String {
        self.name
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }
}

fn default_guideline() -> String {
    DEFAULT_GUIDELINE.to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_guideline")]
    pub guideline: String,
    pub project_type: ProjectType,
    #[serde(default)]
    pub users: Vec<i64>,
}

/// Partial update of a project. The project type cannot change once documents
/// may have been annotated, so it is not part of the update.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub guideline: Option<String>,
    pub users: Option<Vec<i64>>,
}

impl ProjectUpdate {
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(guideline) = &self.guideline {
            project.guideline = guideline.clone();
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProjectWithUsers {
    #[serde(flatten)]
    pub project: Project,
    pub users: Vec<i64>,
}
