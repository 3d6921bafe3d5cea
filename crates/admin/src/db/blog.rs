//! Blog administration: posts, blog categories and tags.
//!
//! A post's tags are replaced in the same transaction as the post itself.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use fuelstack_core::models::{BlogCategory, BlogPost, BlogTag};
use fuelstack_core::{BlogCategoryId, BlogPostId, BlogTagId, PostStatus, Slug, UserId};

use super::{Page, RepositoryError, conflict_on_unique, search_pattern, write_conflict};

const POST_COLUMNS: &str = "id, slug, title, excerpt, content, cover_image_url, status, \
    category_id, author_id, view_count, published_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: BlogPostId,
    slug: Slug,
    title: String,
    excerpt: Option<String>,
    content: String,
    cover_image_url: Option<String>,
    status: PostStatus,
    category_id: Option<BlogCategoryId>,
    author_id: Option<UserId>,
    view_count: i64,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self, tags: Vec<BlogTag>) -> BlogPost {
        BlogPost {
            id: self.id,
            slug: self.slug,
            title: self.title,
            excerpt: self.excerpt,
            content: self.content,
            cover_image_url: self.cover_image_url,
            status: self.status,
            category_id: self.category_id,
            author_id: self.author_id,
            view_count: self.view_count,
            tags,
            published_at: self.published_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: BlogCategoryId,
    slug: Slug,
    name: String,
    description: Option<String>,
    posts_count: Option<i64>,
}

impl From<CategoryRow> for BlogCategory {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            posts_count: row.posts_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TagRow {
    id: BlogTagId,
    slug: Slug,
    name: String,
}

impl From<TagRow> for BlogTag {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostTagRow {
    post_id: BlogPostId,
    #[sqlx(flatten)]
    tag: TagRow,
}

/// A validated post, ready to insert or overwrite.
#[derive(Debug, Clone)]
pub struct PostWrite {
    pub slug: Slug,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image_url: Option<String>,
    pub status: PostStatus,
    pub category_id: Option<BlogCategoryId>,
    pub tag_ids: Vec<BlogTagId>,
}

/// Fields of a blog category to insert or overwrite.
#[derive(Debug, Clone)]
pub struct BlogCategoryWrite {
    pub slug: Slug,
    pub name: String,
    pub description: Option<String>,
}

/// Fields of a tag to insert or overwrite.
#[derive(Debug, Clone)]
pub struct TagWrite {
    pub slug: Slug,
    pub name: String,
}

/// Repository for blog administration.
pub struct BlogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogRepository<'a> {
    /// Create a new blog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// List posts in any status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_posts(
        &self,
        status: Option<PostStatus>,
        q: Option<&str>,
        page: Page,
    ) -> Result<(Vec<BlogPost>, i64), RepositoryError> {
        let conditions = r"
            ($1::shop.post_status IS NULL OR status = $1)
            AND ($2::text IS NULL OR title ILIKE $2 OR slug ILIKE $2)
        ";
        let q = search_pattern(q);

        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM shop.blog_post WHERE {conditions} \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(status)
        .bind(q.as_deref())
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM shop.blog_post WHERE {conditions}"))
                .bind(status)
                .bind(q.as_deref())
                .fetch_one(self.pool)
                .await?;

        Ok((self.attach_tags(rows).await?, total))
    }

    /// Get a post by ID, in any status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_post(&self, id: BlogPostId) -> Result<Option<BlogPost>, RepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM shop.blog_post WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(self.attach_tags(row.into_iter().collect()).await?.pop())
    }

    /// Insert a post and its tags. A post created as published gets
    /// `published_at` now.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken or the
    /// category/a tag doesn't exist.
    pub async fn create_post(
        &self,
        post: &PostWrite,
        author_id: UserId,
    ) -> Result<BlogPost, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: BlogPostId = sqlx::query_scalar(
            r"
            INSERT INTO shop.blog_post
                (slug, title, excerpt, content, cover_image_url, status, category_id, author_id,
                 published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                    CASE WHEN $6 = 'published'::shop.post_status THEN NOW() END)
            RETURNING id
            ",
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(post.excerpt.as_deref())
        .bind(&post.content)
        .bind(post.cover_image_url.as_deref())
        .bind(post.status)
        .bind(post.category_id)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(post_conflict)?;

        replace_tags(&mut tx, id, &post.tag_ids).await?;
        tx.commit().await?;

        self.get_post(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Overwrite a post and replace its tags.
    ///
    /// `published_at` is set the first time the post becomes published and
    /// kept afterwards, even if it is later unpublished.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken or the
    /// category/a tag doesn't exist.
    pub async fn update_post(
        &self,
        id: BlogPostId,
        post: &PostWrite,
    ) -> Result<BlogPost, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE shop.blog_post SET
                slug = $2, title = $3, excerpt = $4, content = $5, cover_image_url = $6,
                status = $7, category_id = $8,
                published_at = CASE
                    WHEN published_at IS NULL AND $7 = 'published'::shop.post_status THEN NOW()
                    ELSE published_at
                END,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&post.slug)
        .bind(&post.title)
        .bind(post.excerpt.as_deref())
        .bind(&post.content)
        .bind(post.cover_image_url.as_deref())
        .bind(post.status)
        .bind(post.category_id)
        .execute(&mut *tx)
        .await
        .map_err(post_conflict)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        replace_tags(&mut tx, id, &post.tag_ids).await?;
        tx.commit().await?;

        self.get_post(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a post. Its tag links go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post doesn't exist.
    pub async fn delete_post(&self, id: BlogPostId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.blog_post WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn attach_tags(&self, rows: Vec<PostRow>) -> Result<Vec<BlogPost>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|row| row.id.as_i32()).collect();

        let tag_rows = sqlx::query_as::<_, PostTagRow>(
            r"
            SELECT pt.post_id, t.id, t.slug, t.name
            FROM shop.blog_post_tag pt
            JOIN shop.blog_tag t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.name
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_post: HashMap<BlogPostId, Vec<BlogTag>> = HashMap::new();
        for row in tag_rows {
            by_post.entry(row.post_id).or_default().push(row.tag.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let tags = by_post.remove(&row.id).unwrap_or_default();
                row.into_post(tags)
            })
            .collect())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All blog categories with the number of posts in each.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<BlogCategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT c.id, c.slug, c.name, c.description, COUNT(p.id) AS posts_count
            FROM shop.blog_category c
            LEFT JOIN shop.blog_post p ON p.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a blog category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create_category(
        &self,
        category: &BlogCategoryWrite,
    ) -> Result<BlogCategory, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.blog_category (slug, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, slug, name, description, 0::bigint AS posts_count
            ",
        )
        .bind(&category.slug)
        .bind(&category.name)
        .bind(category.description.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a blog category with this slug already exists"))?;

        Ok(row.into())
    }

    /// Overwrite a blog category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update_category(
        &self,
        id: BlogCategoryId,
        category: &BlogCategoryWrite,
    ) -> Result<BlogCategory, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE shop.blog_category c SET slug = $2, name = $3, description = $4
            WHERE c.id = $1
            RETURNING c.id, c.slug, c.name, c.description,
                (SELECT COUNT(*) FROM shop.blog_post p WHERE p.category_id = c.id) AS posts_count
            ",
        )
        .bind(id)
        .bind(&category.slug)
        .bind(&category.name)
        .bind(category.description.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a blog category with this slug already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a blog category that has no posts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InUse` with the post count if any post is
    /// filed under it. Returns `RepositoryError::NotFound` if it doesn't exist.
    pub async fn delete_category(&self, id: BlogCategoryId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shop.blog_post WHERE category_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if count > 0 {
            return Err(RepositoryError::InUse {
                entity: "blog category",
                count_key: "posts_count",
                count,
            });
        }

        let result = sqlx::query("DELETE FROM shop.blog_category WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// All tags by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_tags(&self) -> Result<Vec<BlogTag>, RepositoryError> {
        let rows = sqlx::query_as::<_, TagRow>("SELECT id, slug, name FROM shop.blog_tag ORDER BY name")
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create_tag(&self, tag: &TagWrite) -> Result<BlogTag, RepositoryError> {
        let row = sqlx::query_as::<_, TagRow>(
            "INSERT INTO shop.blog_tag (slug, name) VALUES ($1, $2) RETURNING id, slug, name",
        )
        .bind(&tag.slug)
        .bind(&tag.name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a tag with this slug already exists"))?;

        Ok(row.into())
    }

    /// Overwrite a tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the tag doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn update_tag(&self, id: BlogTagId, tag: &TagWrite) -> Result<BlogTag, RepositoryError> {
        let row = sqlx::query_as::<_, TagRow>(
            "UPDATE shop.blog_tag SET slug = $2, name = $3 WHERE id = $1 RETURNING id, slug, name",
        )
        .bind(id)
        .bind(&tag.slug)
        .bind(&tag.name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "a tag with this slug already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a tag. It is removed from every post that had it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the tag doesn't exist.
    pub async fn delete_tag(&self, id: BlogTagId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.blog_tag WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn post_conflict(e: sqlx::Error) -> RepositoryError {
    write_conflict(
        e,
        "a post with this slug already exists",
        "blog category or tag does not exist",
    )
}

async fn replace_tags(
    tx: &mut Transaction<'_, Postgres>,
    post_id: BlogPostId,
    tag_ids: &[BlogTagId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM shop.blog_post_tag WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    if tag_ids.is_empty() {
        return Ok(());
    }
    let ids: Vec<i32> = tag_ids.iter().map(BlogTagId::as_i32).collect();

    sqlx::query(
        r"
        INSERT INTO shop.blog_post_tag (post_id, tag_id)
        SELECT $1, tag_id FROM UNNEST($2::int[]) AS tag_id
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(post_id)
    .bind(&ids)
    .execute(&mut **tx)
    .await
    .map_err(post_conflict)?;

    Ok(())
}
