//! Books and category memberships repository

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookChanges, CategoryMembership, CreateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("book not found".to_string()))
    }

    /// Check that a book exists
    pub async fn exists(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Check if an ISBN is already in the collection
    pub async fn isbn_exists(&self, isbn: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// All books, by title
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY title")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Books with the given IDs, in no particular order
    pub async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Text search over title, author and ISBN. Any word may match;
    /// results are ranked by relevance.
    pub async fn search(&self, text: &str) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT b.*
            FROM books b,
                 replace(plainto_tsquery('simple', $1)::text, '&', '|')::tsquery q
            WHERE to_tsvector('simple', b.title || ' ' || b.author || ' ' || b.isbn) @@ q
            ORDER BY ts_rank(to_tsvector('simple', b.title || ' ' || b.author || ' ' || b.isbn), q) DESC,
                     b.title
            "#,
        )
        .bind(text)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Create a new book
    pub async fn create(&self, book: &CreateBook) -> AppResult<Uuid> {
        let now = Utc::now();

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO books (id, title, author, isbn, details, image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(&book.details)
        .bind(&book.image)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from(e).on_conflict("book already in collection"))?;

        Ok(id)
    }

    /// Write merged book data. The ISBN is never touched.
    pub async fn update(&self, id: Uuid, changes: &BookChanges) -> AppResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE books
            SET title = $1, author = $2, details = $3, image = $4, updated_at = $5
            WHERE id = $6
            RETURNING id
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.author)
        .bind(&changes.details)
        .bind(&changes.image)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("book not found".to_string()))
    }

    /// Category names of a book
    pub async fn categories_of(&self, book_id: Uuid) -> AppResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT category_name FROM categories WHERE book_id = $1 ORDER BY category_name",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    /// Find the membership row of a book in a category
    pub async fn find_membership(
        &self,
        category_name: &str,
        book_id: Uuid,
    ) -> AppResult<Option<CategoryMembership>> {
        let row = sqlx::query_as::<_, CategoryMembership>(
            "SELECT * FROM categories WHERE category_name = $1 AND book_id = $2",
        )
        .bind(category_name)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Add a book to a category
    pub async fn add_membership(
        &self,
        category_name: &str,
        book_id: Uuid,
    ) -> AppResult<CategoryMembership> {
        let now = Utc::now();

        sqlx::query_as::<_, CategoryMembership>(
            r#"
            INSERT INTO categories (id, category_name, book_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category_name)
        .bind(book_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from(e).on_conflict("book already exists in this category"))
    }

    /// Remove a membership row
    pub async fn remove_membership(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Distinct category names
    pub async fn category_names(&self) -> AppResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category_name FROM categories ORDER BY category_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    /// Distinct IDs of the books in a category
    pub async fn book_ids_in_category(&self, category_name: &str) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT DISTINCT book_id FROM categories WHERE category_name = $1",
        )
        .bind(category_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }
}
