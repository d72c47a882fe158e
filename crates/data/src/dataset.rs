use crate::{
    annotation::{AnnotationBody, AnnotationDetail},
    document::Document,
    project::ProjectType,
};

/// Builds the export rows of one document.
///
/// * classification: `[doc_id, text, label, username]` per annotation
/// * sequence labeling: `[doc_id, char, tag]` per character using BIO tags
/// * seq2seq: `[doc_id, text, annotation_text, username]` per annotation
pub fn make_dataset(
    project_type: ProjectType,
    document: &Document,
    annotations: &[&AnnotationDetail],
) -> Vec<Vec<String>> {
    match project_type {
        ProjectType::DocumentClassification => annotations
            .iter()
            .map(|detail| {
                vec![
                    document.id.to_string(),
                    document.text.clone(),
                    detail.label_text.clone().unwrap_or_default(),
                    detail.username.clone(),
                ]
            })
            .collect(),
        ProjectType::SequenceLabeling => sequence_rows(document, annotations),
        ProjectType::Seq2seq => annotations
            .iter()
            .filter_map(|detail| match &detail.annotation.body {
                AnnotationBody::Text { text } => Some(vec![
                    document.id.to_string(),
                    document.text.clone(),
                    text.clone(),
                    detail.username.clone(),
                ]),
                _ => None,
            })
            .collect(),
    }
}

fn sequence_rows(document: &Document, annotations: &[&AnnotationDetail]) -> Vec<Vec<String>> {
    let chars: Vec<char> = document.text.chars().collect();
    let mut tags = vec!["O".to_string(); chars.len()];

    for detail in annotations {
        let AnnotationBody::Span {
            start_offset,
            end_offset,
            ..
        } = &detail.annotation.body
        else {
            continue;
        };
        let label = detail.label_text.as_deref().unwrap_or_default();
        let start = (*start_offset).max(0) as usize;
        let end = ((*end_offset).max(0) as usize).min(chars.len());

        for (i, tag) in tags.iter_mut().enumerate().take(end).skip(start) {
            *tag = if i == start {
                format!("B-{label}")
            } else {
                format!("I-{label}")
            };
        }
    }

    chars
        .into_iter()
        .zip(tags)
        .map(|(ch, tag)| vec![document.id.to_string(), ch.to_string(), tag])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Annotation;
    use chrono::Utc;

    fn document(text: &str) -> Document {
        let now = Utc::now().naive_utc();
        Document {
            id: 42,
            text: text.to_string(),
            project_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn detail(body: AnnotationBody, label: Option<&str>, username: &str) -> AnnotationDetail {
        let now = Utc::now().naive_utc();
        AnnotationDetail {
            annotation: Annotation {
                id: 1,
                document_id: 42,
                user_id: 1,
                prob: 0.0,
                manual: true,
                created_at: now,
                updated_at: now,
                body,
            },
            label_text: label.map(str::to_string),
            username: username.to_string(),
        }
    }

    #[test]
    fn test_classification_rows() {
        let doc = document("great movie");
        let positive = detail(AnnotationBody::Label { label_id: 1 }, Some("positive"), "alice");
        let rows = make_dataset(ProjectType::DocumentClassification, &doc, &[&positive]);
        assert_eq!(rows, vec![vec!["42", "great movie", "positive", "alice"]]);
    }

    #[test]
    fn test_sequence_rows_use_bio_tags() {
        let doc = document("Bob ran");
        let person = detail(
            AnnotationBody::Span {
                label_id: 1,
                start_offset: 0,
                end_offset: 3,
            },
            Some("PER"),
            "alice",
        );
        let rows = make_dataset(ProjectType::SequenceLabeling, &doc, &[&person]);
        let tags: Vec<&str> = rows.iter().map(|row| row[2].as_str()).collect();
        assert_eq!(tags, vec!["B-PER", "I-PER", "I-PER", "O", "O", "O", "O"]);
        assert_eq!(rows[0], vec!["42", "B", "B-PER"]);
    }

    #[test]
    fn test_sequence_rows_clamp_out_of_range_spans() {
        let doc = document("ab");
        let span = detail(
            AnnotationBody::Span {
                label_id: 1,
                start_offset: 1,
                end_offset: 10,
            },
            Some("X"),
            "bob",
        );
        let rows = make_dataset(ProjectType::SequenceLabeling, &doc, &[&span]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][2], "B-X");
    }

    #[test]
    fn test_sequence_rows_count_characters_not_bytes() {
        let doc = document("héllo");
        let rows = make_dataset(ProjectType::SequenceLabeling, &doc, &[]);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1][1], "é");
    }

    #[test]
    fn test_seq2seq_rows() {
        let doc = document("bonjour");
        let translation = detail(
            AnnotationBody::Text {
                text: "hello".to_string(),
            },
            None,
            "carol",
        );
        let rows = make_dataset(ProjectType::Seq2seq, &doc, &[&translation]);
        assert_eq!(rows, vec![vec!["42", "bonjour", "hello", "carol"]]);
    }
}
