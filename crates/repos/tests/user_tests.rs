use sqlx::SqlitePool;

use common::QueryParams;
use data::user::NewUser;
use repos::error::RepoError;
use repos::user::UserRepo;
use testware::create_test_user;

#[sqlx::test(migrations = "../../migrations")]
async fn test_get_by_id(pool: SqlitePool) {
    create_test_user(&pool, "alice", false).await;
    let inserted = create_test_user(&pool, "bob", true).await;

    let found = UserRepo::get_by_id(&pool, inserted.id)
        .await
        .expect("Failed to get user by ID")
        .expect("User not found");

    assert_eq!(found.id, inserted.id);
    assert_eq!(found.username, "bob");
    assert!(found.is_admin);
    assert!(found.last_login_at.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_get_by_id_not_found(pool: SqlitePool) {
    let found = UserRepo::get_by_id(&pool, 4242)
        .await
        .expect("Failed to query with non-existent ID");
    assert!(found.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_get_by_id_error(pool: SqlitePool) {
    let inserted = create_test_user(&pool, "alice", false).await;

    pool.close().await;

    let result = UserRepo::get_by_id(&pool, inserted.id).await;
    assert!(result.is_err(), "Expected an error with closed pool");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_get_by_name(pool: SqlitePool) {
    create_test_user(&pool, "alice", false).await;
    create_test_user(&pool, "bob", true).await;

    let found = UserRepo::get_by_name(&pool, "alice")
        .await
        .expect("Failed to get user by name")
        .expect("User not found");
    assert_eq!(found.username, "alice");
    assert!(!found.is_admin);

    let missing = UserRepo::get_by_name(&pool, "carol").await.unwrap();
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_get_all_with_filter_and_ordering(pool: SqlitePool) {
    create_test_user(&pool, "alice", false).await;
    create_test_user(&pool, "albert", false).await;
    create_test_user(&pool, "bob", true).await;

    let params = QueryParams::default()
        .with_filter(Some("al".to_string()))
        .with_ordering("-username");
    let users = UserRepo::get_all(&pool, params).await.unwrap();

    let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "albert"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_duplicate_username(pool: SqlitePool) {
    create_test_user(&pool, "alice", false).await;

    let result = UserRepo::create(
        &pool,
        NewUser {
            username: "alice".to_string(),
            password_hash: "hash".to_string(),
            is_admin: false,
        },
    )
    .await;

    assert!(matches!(result, Err(RepoError::UniqueViolation(_))));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update(pool: SqlitePool) {
    let mut user = create_test_user(&pool, "alice", false).await;
    user.is_admin = true;
    user.username = "alice2".to_string();

    let updated = UserRepo::update(&pool, user.clone()).await.unwrap();
    assert_eq!(updated, Some(user.id));

    let found = UserRepo::get_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(found.username, "alice2");
    assert!(found.is_admin);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_update_last_login(pool: SqlitePool) {
    let user = create_test_user(&pool, "alice", false).await;

    UserRepo::update_last_login(&pool, user.id).await.unwrap();

    let found = UserRepo::get_by_id(&pool, user.id).await.unwrap().unwrap();
    assert!(found.last_login_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_remove_and_count(pool: SqlitePool) {
    let alice = create_test_user(&pool, "alice", false).await;
    create_test_user(&pool, "bob", false).await;
    assert_eq!(UserRepo::count(&pool).await.unwrap(), 2);

    UserRepo::remove(&pool, alice.id).await.unwrap();

    assert_eq!(UserRepo::count(&pool).await.unwrap(), 1);
    assert!(UserRepo::get_by_id(&pool, alice.id).await.unwrap().is_none());
}
