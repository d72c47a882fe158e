use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKGROUND_COLOR: &str = "#209cee";
pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct Label {
    pub id: i64,
    pub text: String,
    pub shortcut: Option<String>,
    pub background_color: String,
    pub text_color: String,
    pub project_id: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewLabel {
    pub text: String,
    pub shortcut: Option<String>,
    pub background_color: String,
    pub text_color: String,
    pub project_id: i64,
}

/// Label fields as sent by clients. Every field is optional so the same shape
/// serves create, full update and partial update.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LabelFields {
    pub text: Option<String>,
    pub shortcut: Option<String>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
}

fn validate_shortcut(shortcut: &Option<String>) -> Result<(), String> {
    match shortcut {
        Some(s) if s.chars().count() != 1 => {
            Err(format!("shortcut must be a single character, got '{s}'"))
        }
        _ => Ok(()),
    }
}

impl LabelFields {
    pub fn into_new_label(self, project_id: i64) -> Result<NewLabel, String> {
        let text = self
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| "label text is required".to_string())?;
        let shortcut = self.shortcut.filter(|s| !s.is_empty());
        validate_shortcut(&shortcut)?;

        Ok(NewLabel {
            text,
            shortcut,
            background_color: self
                .background_color
                .unwrap_or_else(|| DEFAULT_BACKGROUND_COLOR.to_string()),
            text_color: self
                .text_color
                .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
            project_id,
        })
    }

    pub fn apply(self, label: &mut Label) -> Result<(), String> {
        if let Some(text) = self.text {
            if text.trim().is_empty() {
                return Err("label text is required".to_string());
            }
            label.text = text;
        }
        if let Some(shortcut) = self.shortcut {
            let shortcut = Some(shortcut).filter(|s| !s.is_empty());
            validate_shortcut(&shortcut)?;
            label.shortcut = shortcut;
        }
        if let Some(background_color) = self.background_color {
            label.background_color = background_color;
        }
        if let Some(text_color) = self.text_color {
            label.text_color = text_color;
        }
        Ok(())
    }
}
