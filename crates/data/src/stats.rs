use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::annotation::AnnotationDetail;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LabelCounts {
    pub labels: Vec<String>,
    pub data: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserCounts {
    pub users: Vec<String>,
    pub data: Vec<usize>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProjectStats {
    pub label: LabelCounts,
    pub user: UserCounts,
}

impl ProjectStats {
    /// Counts annotations per label and per user. The output follows the order
    /// of `labels` and `users`; names absent from the annotations count zero.
    pub fn compute(
        labels: Vec<String>,
        users: Vec<String>,
        annotations: &[AnnotationDetail],
    ) -> ProjectStats {
        let mut label_count: HashMap<&str, usize> = HashMap::new();
        let mut user_count: HashMap<&str, usize> = HashMap::new();

        for detail in annotations {
            if let Some(label) = &detail.label_text {
                *label_count.entry(label.as_str()).or_default() += 1;
            }
            *user_count.entry(detail.username.as_str()).or_default() += 1;
        }

        let label_data = labels
            .iter()
            .map(|name| label_count.get(name.as_str()).copied().unwrap_or(0))
            .collect();
        let user_data = users
            .iter()
            .map(|name| user_count.get(name.as_str()).copied().unwrap_or(0))
            .collect();

        ProjectStats {
            label: LabelCounts {
                labels,
                data: label_data,
            },
            user: UserCounts {
                users,
                data: user_data,
            },
        }
    }
}
