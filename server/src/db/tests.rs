//! Schema checks against a migrated database.

use sqlx::PgPool;

use crate::permissions::Permissions;

#[sqlx::test]
#[ignore] // Requires PostgreSQL
async fn test_administrator_role_is_seeded_with_every_permission(pool: PgPool) {
    let mask: i64 = sqlx::query_scalar("SELECT permissions FROM roles WHERE name = 'Administrator'")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(mask, 32767);
    assert_eq!(Permissions::from_db(mask), Permissions::all());
}

#[sqlx::test]
#[ignore] // Requires PostgreSQL
async fn test_audit_logs_reject_update_and_delete(pool: PgPool) {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO audit_logs (table_name, row_id, user_id, operation, details)
        VALUES ('tags', 1, 1, 'insert', '{"new":{}}')
        RETURNING id
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let update = sqlx::query("UPDATE audit_logs SET row_id = 2 WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await;
    assert!(update.is_err());

    let delete = sqlx::query("DELETE FROM audit_logs WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await;
    assert!(delete.is_err());

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 1);
}

#[sqlx::test]
#[ignore] // Requires PostgreSQL
async fn test_post_views_cannot_go_negative(pool: PgPool) {
    let user_id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password_hash) VALUES ('Ada', 'ada@example.com', 'x') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let result = sqlx::query(
        "INSERT INTO posts (title, short_description, user_id, views) VALUES ('t', 'd', $1, -1)",
    )
    .bind(user_id)
    .execute(&pool)
    .await;
    assert!(result.is_err());
}
