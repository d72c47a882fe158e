use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::label::Label;
use crate::project::ProjectType;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("field `{0}` is required")]
    MissingField(&'static str),

    #[error("invalid span {start}..{end} for a text of {len} characters")]
    InvalidSpan { start: i64, end: i64, len: usize },
}

/// The part of an annotation that depends on the project type.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum AnnotationBody {
    Span {
        label_id: i64,
        start_offset: i64,
        end_offset: i64,
    },
    Label {
        label_id: i64,
    },
    Text {
        text: String,
    },
}

/// Annotation fields as sent by clients, interpreted according to the project
/// type on create and overlaid on the existing body on update.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AnnotationFields {
    pub label_id: Option<i64>,
    pub start_offset: Option<i64>,
    pub end_offset: Option<i64>,
    pub text: Option<String>,
}

impl AnnotationBody {
    pub fn build(
        project_type: ProjectType,
        fields: &AnnotationFields,
    ) -> Result<AnnotationBody, AnnotationError> {
        match project_type {
            ProjectType::DocumentClassification => Ok(AnnotationBody::Label {
                label_id: fields
                    .label_id
                    .ok_or(AnnotationError::MissingField("label_id"))?,
            }),
            ProjectType::SequenceLabeling => Ok(AnnotationBody::Span {
                label_id: fields
                    .label_id
                    .ok_or(AnnotationError::MissingField("label_id"))?,
                start_offset: fields
                    .start_offset
                    .ok_or(AnnotationError::MissingField("start_offset"))?,
                end_offset: fields
                    .end_offset
                    .ok_or(AnnotationError::MissingField("end_offset"))?,
            }),
            ProjectType::Seq2seq => Ok(AnnotationBody::Text {
                text: fields
                    .text
                    .clone()
                    .ok_or(AnnotationError::MissingField("text"))?,
            }),
        }
    }

    /// Overlays the fields that apply to this variant. Fields that belong to
    /// another variant are ignored.
    pub fn merge(&self, fields: &AnnotationFields) -> AnnotationBody {
        match self {
            AnnotationBody::Label { label_id } => AnnotationBody::Label {
                label_id: fields.label_id.unwrap_or(*label_id),
            },
            AnnotationBody::Span {
                label_id,
                start_offset,
                end_offset,
            } => AnnotationBody::Span {
                label_id: fields.label_id.unwrap_or(*label_id),
                start_offset: fields.start_offset.unwrap_or(*start_offset),
                end_offset: fields.end_offset.unwrap_or(*end_offset),
            },
            AnnotationBody::Text { text } => AnnotationBody::Text {
                text: fields.text.clone().unwrap_or_else(|| text.clone()),
            },
        }
    }

    pub fn project_type(&self) -> ProjectType {
        match self {
            AnnotationBody::Label { .. } => ProjectType::DocumentClassification,
            AnnotationBody::Span { .. } => ProjectType::SequenceLabeling,
            AnnotationBody::Text { .. } => ProjectType::Seq2seq,
        }
    }

    pub fn label_id(&self) -> Option<i64> {
        match self {
            AnnotationBody::Label { label_id } | AnnotationBody::Span { label_id, .. } => {
                Some(*label_id)
            }
            AnnotationBody::Text { .. } => None,
        }
    }

    /// Span offsets are character offsets into the document text.
    pub fn validate(&self, text_len: usize) -> Result<(), AnnotationError> {
        if let AnnotationBody::Span {
            start_offset,
            end_offset,
            ..
        } = self
        {
            let (start, end) = (*start_offset, *end_offset);
            if start < 0 || end <= start || end as usize > text_len {
                return Err(AnnotationError::InvalidSpan {
                    start,
                    end,
                    len: text_len,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Annotation {
    pub id: i64,
    pub document_id: i64,
    pub user_id: i64,
    pub prob: f64,
    pub manual: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(flatten)]
    pub body: AnnotationBody,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewAnnotation {
    pub document_id: i64,
    pub user_id: i64,
    pub prob: f64,
    pub manual: bool,
    pub body: AnnotationBody,
}

/// An annotation together with the names needed for exports and statistics.
#[derive(Debug, Clone)]
pub struct AnnotationDetail {
    pub annotation: Annotation,
    pub label_text: Option<String>,
    pub username: String,
}

/// Client facing shape of an annotation. The label is embedded rather than
/// referenced, and only the fields of the project's variant are present.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AnnotationView {
    pub id: i64,
    pub prob: f64,
    pub manual: bool,
    pub user: i64,
    pub document: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl AnnotationView {
    /// `labels` are the labels of the annotation's project.
    pub fn new(annotation: &Annotation, labels: &[Label]) -> Self {
        let label = annotation
            .body
            .label_id()
            .and_then(|id| labels.iter().find(|label| label.id == id))
            .cloned();

        let (start_offset, end_offset, text) = match &annotation.body {
            AnnotationBody::Span {
                start_offset,
                end_offset,
                ..
            } => (Some(*start_offset), Some(*end_offset), None),
            AnnotationBody::Label { .. } => (None, None, None),
            AnnotationBody::Text { text } => (None, None, Some(text.clone())),
        };

        Self {
            id: annotation.id,
            prob: annotation.prob,
            manual: annotation.manual,
            user: annotation.user_id,
            document: annotation.document_id,
            label,
            start_offset,
            end_offset,
            text,
        }
    }
}
