use sqlx::SqlitePool;

use data::label::LabelFields;
use data::project::ProjectType;
use repos::error::RepoError;
use repos::label::LabelRepo;
use testware::{create_test_label, create_test_project};

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_and_list(pool: SqlitePool) {
    let project = create_test_project(&pool, "P", ProjectType::SequenceLabeling, &[]).await;
    let other = create_test_project(&pool, "Q", ProjectType::SequenceLabeling, &[]).await;

    let person = create_test_label(&pool, project.id, "PER", Some("p")).await;
    let location = create_test_label(&pool, project.id, "LOC", None).await;
    create_test_label(&pool, other.id, "PER", Some("p")).await;

    let labels = LabelRepo::get_by_project(&pool, project.id).await.unwrap();
    assert_eq!(labels, vec![person.clone(), location]);
    assert_eq!(person.background_color, "#209cee");
    assert_eq!(person.text_color, "#ffffff");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_get_by_project_and_id(pool: SqlitePool) {
    let project = create_test_project(&pool, "P", ProjectType::SequenceLabeling, &[]).await;
    let other = create_test_project(&pool, "Q", ProjectType::SequenceLabeling, &[]).await;
    let label = create_test_label(&pool, project.id, "PER", None).await;

    assert!(
        LabelRepo::get_by_project_and_id(&pool, project.id, label.id)
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        LabelRepo::get_by_project_and_id(&pool, other.id, label.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_duplicate_text(pool: SqlitePool) {
    let project = create_test_project(&pool, "P", ProjectType::SequenceLabeling, &[]).await;
    create_test_label(&pool, project.id, "PER", None).await;

    let new_label = LabelFields {
        text: Some("PER".to_string()),
        ..Default::default()
    }
    .into_new_label(project.id)
    .unwrap();

    let result = LabelRepo::create(&pool, new_label).await;
    assert!(matches!(result, Err(RepoError::UniqueViolation(_))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_duplicate_shortcut(pool: SqlitePool) {
    let project = create_test_project(&pool, "P", ProjectType::SequenceLabeling, &[]).await;
    create_test_label(&pool, project.id, "PER", Some("p")).await;
    create_test_label(&pool, project.id, "LOC", None).await;

    let new_label = LabelFields {
        text: Some("ORG".to_string()),
        shortcut: Some("p".to_string()),
        ..Default::default()
    }
    .into_new_label(project.id)
    .unwrap();

    let result = LabelRepo::create(&pool, new_label).await;
    assert!(matches!(result, Err(RepoError::UniqueViolation(_))));

    // Several labels may go without a shortcut.
    create_test_label(&pool, project.id, "MISC", None).await;
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_and_remove(pool: SqlitePool) {
    let project = create_test_project(&pool, "P", ProjectType::SequenceLabeling, &[]).await;
    let mut label = create_test_label(&pool, project.id, "PER", Some("p")).await;

    LabelFields {
        text: Some("PERSON".to_string()),
        background_color: Some("#000000".to_string()),
        ..Default::default()
    }
    .apply(&mut label)
    .unwrap();
    assert_eq!(LabelRepo::update(&pool, &label).await.unwrap(), Some(label.id));

    let found = LabelRepo::get_by_id(&pool, label.id).await.unwrap().unwrap();
    assert_eq!(found.text, "PERSON");
    assert_eq!(found.shortcut.as_deref(), Some("p"));
    assert_eq!(found.background_color, "#000000");

    LabelRepo::remove(&pool, label.id).await.unwrap();
    assert!(LabelRepo::get_by_id(&pool, label.id).await.unwrap().is_none());
}
