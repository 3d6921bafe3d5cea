//! Blog reads for the storefront. Only published posts are visible.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use fuelstack_core::models::{BlogCategory, BlogPost, BlogTag};
use fuelstack_core::{BlogCategoryId, BlogPostId, BlogTagId, PostStatus, Slug, UserId};

use super::{Page, RepositoryError};

const POST_COLUMNS: &str = "p.id, p.slug, p.title, p.excerpt, p.content, p.cover_image_url, \
    p.status, p.category_id, p.author_id, p.view_count, p.published_at, p.created_at, p.updated_at";

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

#[derive(sqlx::FromRow)]
struct PostTagRow {
    post_id: BlogPostId,
    #[sqlx(flatten)]
    tag: TagRow,
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

/// Repository for public blog content.
pub struct BlogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogRepository<'a> {
    /// Create a new blog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Published posts, newest first, optionally filtered by category or tag slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_published(
        &self,
        category: Option<&str>,
        tag: Option<&str>,
        page: Page,
    ) -> Result<(Vec<BlogPost>, i64), RepositoryError> {
        let conditions = r"
            p.status = 'published'
              AND ($1::text IS NULL OR c.slug = $1)
              AND ($2::text IS NULL OR EXISTS (
                    SELECT 1 FROM shop.blog_post_tag pt
                    JOIN shop.blog_tag t ON t.id = pt.tag_id
                    WHERE pt.post_id = p.id AND t.slug = $2))
        ";
        let from = "FROM shop.blog_post p LEFT JOIN shop.blog_category c ON c.id = p.category_id";

        let rows = sqlx::query_as::<_, PostRow>(&format!(
            r"
            SELECT {POST_COLUMNS} {from} WHERE {conditions}
            ORDER BY p.published_at DESC NULLS LAST, p.id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(category)
        .bind(tag)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) {from} WHERE {conditions}"))
                .bind(category)
                .bind(tag)
                .fetch_one(self.pool)
                .await?;

        Ok((self.attach_tags(rows).await?, total))
    }

    /// A published post by slug. Counts as a view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn view_published(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            r"
            UPDATE shop.blog_post p SET view_count = view_count + 1
            WHERE p.slug = $1 AND p.status = 'published'
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(self.attach_tags(row.into_iter().collect()).await?.pop())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category(
        &self,
        id: BlogCategoryId,
    ) -> Result<Option<BlogCategory>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, slug, name, description, NULL::bigint AS posts_count
            FROM shop.blog_category WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(BlogCategory::from))
    }

    /// Categories with their published post counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<BlogCategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT c.id, c.slug, c.name, c.description,
                   COUNT(p.id) FILTER (WHERE p.status = 'published') AS posts_count
            FROM shop.blog_category c
            LEFT JOIN shop.blog_post p ON p.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(BlogCategory::from).collect())
    }

    /// All tags by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_tags(&self) -> Result<Vec<BlogTag>, RepositoryError> {
        let rows = sqlx::query_as::<_, TagRow>("SELECT id, slug, name FROM shop.blog_tag ORDER BY name")
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(BlogTag::from).collect())
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
}
