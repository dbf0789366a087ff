use sqlx::{PgPool, Row};
use thiserror::Error;

use arbor_core::domain::Id;
use arbor_core::domain::listing::{ListQuery, PostSort, SortField};
use arbor_core::domain::posts::{NewPost, Post};

use super::like_pattern;

#[derive(Debug, Error)]
pub enum PostsRepoError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

const POST_COLUMNS: &str = "id, title, content, author, created_at, updated_at";

pub async fn insert_post(pool: &PgPool, new: &NewPost) -> Result<Post, PostsRepoError> {
    let row = sqlx::query(
        r#"
        INSERT INTO posts (title, content, author, created_at, updated_at)
        VALUES ($1, $2, $3, NOW(), NOW())
        RETURNING id, title, content, author, created_at, updated_at
        "#,
    )
    .bind(&new.title)
    .bind(&new.content)
    .bind(&new.author)
    .fetch_one(pool)
    .await?;
    Ok(map_post(&row)?)
}

pub async fn find_post(pool: &PgPool, id: Id) -> Result<Option<Post>, PostsRepoError> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.as_ref().map(map_post).transpose()?)
}

pub async fn post_exists(pool: &PgPool, id: Id) -> Result<bool, PostsRepoError> {
    let row = sqlx::query(
        r#"
        SELECT EXISTS (SELECT 1 FROM posts WHERE id = $1) AS present
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(row.try_get("present")?)
}

/// Removes the post; its thread goes with it through the `post_id` cascade.
pub async fn delete_post(pool: &PgPool, id: Id) -> Result<bool, PostsRepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM posts
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_posts(
    pool: &PgPool,
    query: &ListQuery<PostSort>,
) -> Result<(Vec<Post>, i64), PostsRepoError> {
    let pattern = query.search.as_deref().map(like_pattern);
    let (where_clause, next_param) = if pattern.is_some() {
        ("WHERE title ILIKE $1 OR content ILIKE $1", 2)
    } else {
        ("", 1)
    };

    let count_sql = format!("SELECT COUNT(*) AS total FROM posts {where_clause}");
    let mut count_query = sqlx::query(&count_sql);
    if let Some(pattern) = pattern.as_ref() {
        count_query = count_query.bind(pattern);
    }
    let total: i64 = count_query.fetch_one(pool).await?.try_get("total")?;

    let direction = query.sort_order.as_sql();
    let page_sql = format!(
        "SELECT {POST_COLUMNS} FROM posts {where_clause} \
         ORDER BY {column} {direction}, id {direction} LIMIT ${limit} OFFSET ${offset}",
        column = query.sort_by.column(),
        limit = next_param,
        offset = next_param + 1,
    );
    let mut page_query = sqlx::query(&page_sql);
    if let Some(pattern) = pattern.as_ref() {
        page_query = page_query.bind(pattern);
    }
    let rows = page_query
        .bind(query.limit())
        .bind(query.offset())
        .fetch_all(pool)
        .await?;
    let mut posts = Vec::with_capacity(rows.len());
    for row in &rows {
        posts.push(map_post(row)?);
    }
    Ok((posts, total))
}

fn map_post(row: &sqlx::postgres::PgRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author: row.try_get("author")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        comment_count: 0,
    })
}
