use sqlx::{PgPool, Row};
use thiserror::Error;

use arbor_core::domain::Id;
use arbor_core::domain::comments::{Comment, NewComment};
use arbor_core::domain::listing::{CommentSort, ListQuery, SortField};

use super::like_pattern;

#[derive(Debug, Error)]
pub enum CommentsRepoError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

const COMMENT_COLUMNS: &str = "id, parent_id, post_id, content, author, created_at, updated_at";

pub async fn insert_comment(pool: &PgPool, new: &NewComment) -> Result<Comment, CommentsRepoError> {
    let row = sqlx::query(
        r#"
        INSERT INTO comments (parent_id, post_id, content, author, created_at, updated_at)
        VALUES (
            $1,
            COALESCE((SELECT post_id FROM comments WHERE id = $1), $2),
            $3,
            $4,
            NOW(),
            NOW()
        )
        RETURNING id, parent_id, post_id, content, author, created_at, updated_at
        "#,
    )
    .bind(new.parent_id)
    .bind(new.post_id)
    .bind(&new.content)
    .bind(&new.author)
    .fetch_one(pool)
    .await?;
    Ok(map_comment(&row)?)
}

pub async fn find_comment(pool: &PgPool, id: Id) -> Result<Option<Comment>, CommentsRepoError> {
    let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.as_ref().map(map_comment).transpose()?)
}

pub async fn comment_exists(pool: &PgPool, id: Id) -> Result<bool, CommentsRepoError> {
    let row = sqlx::query(
        r#"
        SELECT EXISTS (SELECT 1 FROM comments WHERE id = $1) AS present
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(row.try_get("present")?)
}

pub async fn list_descendants(pool: &PgPool, root_id: Id) -> Result<Vec<Comment>, CommentsRepoError> {
    let rows = sqlx::query(
        r#"
        WITH RECURSIVE tree AS (
            SELECT id, parent_id, post_id, content, author, created_at, updated_at
            FROM comments
            WHERE id = $1
            UNION ALL
            SELECT c.id, c.parent_id, c.post_id, c.content, c.author, c.created_at, c.updated_at
            FROM comments c
            INNER JOIN tree t ON c.parent_id = t.id
        )
        SELECT id, parent_id, post_id, content, author, created_at, updated_at
        FROM tree
        ORDER BY id
        "#,
    )
    .bind(root_id)
    .fetch_all(pool)
    .await?;
    let mut comments = Vec::with_capacity(rows.len());
    for row in &rows {
        comments.push(map_comment(row)?);
    }
    Ok(comments)
}

pub async fn list_ancestor_ids(pool: &PgPool, id: Id) -> Result<Vec<Id>, CommentsRepoError> {
    let rows = sqlx::query(
        r#"
        WITH RECURSIVE chain AS (
            SELECT id, parent_id, 0 AS depth
            FROM comments
            WHERE id = $1
            UNION ALL
            SELECT c.id, c.parent_id, chain.depth + 1
            FROM comments c
            INNER JOIN chain ON c.id = chain.parent_id
        )
        SELECT id
        FROM chain
        WHERE depth > 0
        ORDER BY depth
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    let mut ids = Vec::with_capacity(rows.len());
    for row in rows {
        ids.push(row.try_get("id")?);
    }
    Ok(ids)
}

pub async fn delete_subtree(pool: &PgPool, id: Id) -> Result<u64, CommentsRepoError> {
    let result = sqlx::query(
        r#"
        WITH RECURSIVE descendants AS (
            SELECT id FROM comments WHERE id = $1
            UNION ALL
            SELECT c.id FROM comments c INNER JOIN descendants d ON c.parent_id = d.id
        )
        DELETE FROM comments
        WHERE id IN (SELECT id FROM descendants)
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_root_comments(
    pool: &PgPool,
    post_id: Option<Id>,
    query: &ListQuery<CommentSort>,
) -> Result<(Vec<Comment>, i64), CommentsRepoError> {
    let mut conditions = vec!["parent_id IS NULL".to_string()];
    let mut next_param = 1;
    if post_id.is_some() {
        conditions.push(format!("post_id = ${next_param}"));
        next_param += 1;
    }
    let pattern = query.search.as_deref().map(like_pattern);
    if pattern.is_some() {
        conditions.push(format!("content ILIKE ${next_param}"));
        next_param += 1;
    }
    let where_clause = conditions.join(" AND ");

    let count_sql = format!("SELECT COUNT(*) AS total FROM comments WHERE {where_clause}");
    let mut count_query = sqlx::query(&count_sql);
    if let Some(post_id) = post_id {
        count_query = count_query.bind(post_id);
    }
    if let Some(pattern) = pattern.as_ref() {
        count_query = count_query.bind(pattern);
    }
    let total: i64 = count_query.fetch_one(pool).await?.try_get("total")?;

    let direction = query.sort_order.as_sql();
    let page_sql = format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE {where_clause} \
         ORDER BY {column} {direction}, id {direction} LIMIT ${limit} OFFSET ${offset}",
        column = query.sort_by.column(),
        limit = next_param,
        offset = next_param + 1,
    );
    let mut page_query = sqlx::query(&page_sql);
    if let Some(post_id) = post_id {
        page_query = page_query.bind(post_id);
    }
    if let Some(pattern) = pattern.as_ref() {
        page_query = page_query.bind(pattern);
    }
    let rows = page_query
        .bind(query.limit())
        .bind(query.offset())
        .fetch_all(pool)
        .await?;
    let mut comments = Vec::with_capacity(rows.len());
    for row in &rows {
        comments.push(map_comment(row)?);
    }
    Ok((comments, total))
}

pub async fn count_thread_comments(pool: &PgPool, post_id: Id) -> Result<i64, CommentsRepoError> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS count
        FROM comments
        WHERE post_id = $1
        "#,
    )
    .bind(post_id)
    .fetch_one(pool)
    .await?;
    Ok(row.try_get("count")?)
}

fn map_comment(row: &sqlx::postgres::PgRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        parent_id: row.try_get("parent_id")?,
        post_id: row.try_get("post_id")?,
        content: row.try_get("content")?,
        author: row.try_get("author")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        children: Vec::new(),
    })
}
