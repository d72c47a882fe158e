use chrono::NaiveDateTime;
use sqlx::Sqlite;

use crate::error::{RepoError, handle_sql_error};
use data::annotation::{Annotation, AnnotationBody, AnnotationDetail, NewAnnotation};
use data::project::ProjectType;

/// Table holding the annotations of a project type.
pub(crate) fn table(project_type: ProjectType) -> &'static str {
    match project_type {
        ProjectType::DocumentClassification => "document_annotations",
        ProjectType::SequenceLabeling => "sequence_annotations",
        ProjectType::Seq2seq => "seq2seq_annotations",
    }
}

// Every variant is selected into the same column shape so one row type
// decodes all three tables.
fn columns(project_type: ProjectType) -> String {
    let variant_columns = match project_type {
        ProjectType::DocumentClassification => {
            "a.label_id, NULL AS start_offset, NULL AS end_offset, NULL AS text"
        }
        ProjectType::SequenceLabeling => "a.label_id, a.start_offset, a.end_offset, NULL AS text",
        ProjectType::Seq2seq => "NULL AS label_id, NULL AS start_offset, NULL AS end_offset, a.text",
    };
    format!(
        "a.id, a.document_id, a.user_id, a.prob, a.manual, a.created_at, a.updated_at, \
         {variant_columns}"
    )
}

fn select(project_type: ProjectType) -> String {
    format!(
        "SELECT {} FROM {} a",
        columns(project_type),
        table(project_type)
    )
}

fn select_details(project_type: ProjectType) -> String {
    let (label_column, label_join) = if project_type.has_labels() {
        ("l.text AS label_text", "JOIN labels l ON l.id = a.label_id")
    } else {
        ("NULL AS label_text", "")
    };
    format!(
        "SELECT {}, {label_column}, u.username FROM {} a \
         JOIN users u ON u.id = a.user_id {label_join} \
         JOIN documents d ON d.id = a.document_id",
        columns(project_type),
        table(project_type)
    )
}

#[derive(sqlx::FromRow)]
struct AnnotationRow {
    id: i64,
    document_id: i64,
    user_id: i64,
    prob: f64,
    manual: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    label_id: Option<i64>,
    start_offset: Option<i64>,
    end_offset: Option<i64>,
    text: Option<String>,
}

#[derive(sqlx::FromRow)]
struct AnnotationDetailRow {
    #[sqlx(flatten)]
    row: AnnotationRow,
    label_text: Option<String>,
    username: String,
}

impl AnnotationRow {
    fn into_annotation(self, project_type: ProjectType) -> Result<Annotation, RepoError> {
        let corrupt = |column: &str| RepoError::CorruptRow(format!("annotation {}: {column}", self.id));

        let body = match project_type {
            ProjectType::DocumentClassification => AnnotationBody::Label {
                label_id: self.label_id.ok_or_else(|| corrupt("label_id"))?,
            },
            ProjectType::SequenceLabeling => AnnotationBody::Span {
                label_id: self.label_id.ok_or_else(|| corrupt("label_id"))?,
                start_offset: self.start_offset.ok_or_else(|| corrupt("start_offset"))?,
                end_offset: self.end_offset.ok_or_else(|| corrupt("end_offset"))?,
            },
            ProjectType::Seq2seq => AnnotationBody::Text {
                text: self.text.clone().ok_or_else(|| corrupt("text"))?,
            },
        };

        Ok(Annotation {
            id: self.id,
            document_id: self.document_id,
            user_id: self.user_id,
            prob: self.prob,
            manual: self.manual,
            created_at: self.created_at,
            updated_at: self.updated_at,
            body,
        })
    }
}

pub struct AnnotationRepo {}

impl AnnotationRepo {
    pub async fn get_by_id(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_type: ProjectType,
        id: i64,
    ) -> Result<Option<Annotation>, RepoError> {
        let sql = format!("{} WHERE a.id = ?", select(project_type));
        sqlx::query_as::<_, AnnotationRow>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(handle_sql_error)?
            .map(|row| row.into_annotation(project_type))
            .transpose()
    }

    /// Annotations of one document, optionally restricted to one author.
    pub async fn get_by_document(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_type: ProjectType,
        document_id: i64,
        user_id: Option<i64>,
    ) -> Result<Vec<Annotation>, RepoError> {
        let sql = format!(
            "{} WHERE a.document_id = ? AND (? IS NULL OR a.user_id = ?) ORDER BY a.id",
            select(project_type)
        );
        sqlx::query_as::<_, AnnotationRow>(&sql)
            .bind(document_id)
            .bind(user_id)
            .bind(user_id)
            .fetch_all(executor)
            .await
            .map_err(handle_sql_error)?
            .into_iter()
            .map(|row| row.into_annotation(project_type))
            .collect()
    }

    /// Annotations by `user_id` on any of `document_ids`.
    pub async fn get_by_documents_and_user(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_type: ProjectType,
        document_ids: &[i64],
        user_id: i64,
    ) -> Result<Vec<Annotation>, RepoError> {
        if document_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = sqlx::QueryBuilder::<Sqlite>::new(select(project_type));
        builder.push(" WHERE a.user_id = ");
        builder.push_bind(user_id);
        builder.push(" AND a.document_id IN (");
        let mut separated = builder.separated(", ");
        for id in document_ids {
            separated.push_bind(*id);
        }
        builder.push(") ORDER BY a.id");

        builder
            .build_query_as::<AnnotationRow>()
            .fetch_all(executor)
            .await
            .map_err(handle_sql_error)?
            .into_iter()
            .map(|row| row.into_annotation(project_type))
            .collect()
    }

    /// All annotations of a project with label text and author name, ordered by
    /// document and creation.
    pub async fn get_details_by_project(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_type: ProjectType,
        project_id: i64,
    ) -> Result<Vec<AnnotationDetail>, RepoError> {
        let sql = format!(
            "{} WHERE d.project_id = ? ORDER BY a.document_id, a.id",
            select_details(project_type)
        );
        sqlx::query_as::<_, AnnotationDetailRow>(&sql)
            .bind(project_id)
            .fetch_all(executor)
            .await
            .map_err(handle_sql_error)?
            .into_iter()
            .map(|detail| {
                Ok(AnnotationDetail {
                    annotation: detail.row.into_annotation(project_type)?,
                    label_text: detail.label_text,
                    username: detail.username,
                })
            })
            .collect()
    }

    pub async fn create(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        annotation: NewAnnotation,
    ) -> Result<i64, RepoError> {
        let query = match &annotation.body {
            AnnotationBody::Label { label_id } => sqlx::query_scalar(
                r#"
                    INSERT INTO document_annotations
                      (document_id, user_id, prob, manual, label_id)
                    VALUES (?, ?, ?, ?, ?)
                    RETURNING id
                "#,
            )
            .bind(annotation.document_id)
            .bind(annotation.user_id)
            .bind(annotation.prob)
            .bind(annotation.manual)
            .bind(*label_id),
            AnnotationBody::Span {
                label_id,
                start_offset,
                end_offset,
            } => sqlx::query_scalar(
                r#"
                    INSERT INTO sequence_annotations
                      (document_id, user_id, prob, manual, label_id, start_offset, end_offset)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    RETURNING id
                "#,
            )
            .bind(annotation.document_id)
            .bind(annotation.user_id)
            .bind(annotation.prob)
            .bind(annotation.manual)
            .bind(*label_id)
            .bind(*start_offset)
            .bind(*end_offset),
            AnnotationBody::Text { text } => sqlx::query_scalar(
                r#"
                    INSERT INTO seq2seq_annotations
                      (document_id, user_id, prob, manual, text)
                    VALUES (?, ?, ?, ?, ?)
                    RETURNING id
                "#,
            )
            .bind(annotation.document_id)
            .bind(annotation.user_id)
            .bind(annotation.prob)
            .bind(annotation.manual)
            .bind(text.clone()),
        };

        query.fetch_one(executor).await.map_err(handle_sql_error)
    }

    pub async fn update(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        annotation: &Annotation,
    ) -> Result<Option<i64>, RepoError> {
        let query = match &annotation.body {
            AnnotationBody::Label { label_id } => sqlx::query_scalar(
                r#"
                    UPDATE document_annotations
                    SET label_id = ?, prob = ?, manual = ?, updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?
                    RETURNING id
                "#,
            )
            .bind(*label_id),
            AnnotationBody::Span {
                label_id,
                start_offset,
                end_offset,
            } => sqlx::query_scalar(
                r#"
                    UPDATE sequence_annotations
                    SET label_id = ?, start_offset = ?, end_offset = ?, prob = ?, manual = ?,
                        updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?
                    RETURNING id
                "#,
            )
            .bind(*label_id)
            .bind(*start_offset)
            .bind(*end_offset),
            AnnotationBody::Text { text } => sqlx::query_scalar(
                r#"
                    UPDATE seq2seq_annotations
                    SET text = ?, prob = ?, manual = ?, updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?
                    RETURNING id
                "#,
            )
            .bind(text.clone()),
        };

        query
            .bind(annotation.prob)
            .bind(annotation.manual)
            .bind(annotation.id)
            .fetch_optional(executor)
            .await
            .map_err(handle_sql_error)
    }

    pub async fn remove(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_type: ProjectType,
        id: i64,
    ) -> Result<(), RepoError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", table(project_type));
        sqlx::query(&sql)
            .bind(id)
            .execute(executor)
            .await
            .map_err(handle_sql_error)
            .map(|_| ())
    }

    pub async fn count_by_project(
        executor: impl sqlx::Executor<'_, Database = Sqlite>,
        project_type: ProjectType,
        project_id: i64,
    ) -> Result<i64, RepoError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} a JOIN documents d ON d.id = a.document_id \
             WHERE d.project_id = ?",
            table(project_type)
        );
        sqlx::query_scalar(&sql)
            .bind(project_id)
            .fetch_one(executor)
            .await
            .map_err(handle_sql_error)
    }
}
