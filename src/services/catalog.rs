//! Catalog management service: books, categories and search

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookChanges, BookMetadata, BookProfile, CategoryMembership, CreateBook, UpdateBook},
    repository::Repository,
    services::metadata::MetadataLookup,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    metadata: Option<Arc<dyn MetadataLookup>>,
}

impl CatalogService {
    pub fn new(repository: Repository, metadata: Option<Arc<dyn MetadataLookup>>) -> Self {
        Self {
            repository,
            metadata,
        }
    }

    /// Book with its categories and rating average
    pub async fn profile(&self, book: Book) -> AppResult<BookProfile> {
        let categories = self.repository.books.categories_of(book.id).await?;
        let summary = self.repository.ratings.summary(book.id).await?;

        Ok(BookProfile {
            book,
            categories,
            rating: summary.average,
            ratings_count: summary.count,
        })
    }

    pub async fn profiles(&self, books: Vec<Book>) -> AppResult<Vec<BookProfile>> {
        let mut profiles = Vec::with_capacity(books.len());
        for book in books {
            profiles.push(self.profile(book).await?);
        }
        Ok(profiles)
    }

    /// Profiles of `ids`, in the order given. Unknown ids are skipped.
    pub async fn profiles_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<BookProfile>> {
        let mut books = self.repository.books.get_many(ids).await?;
        books.sort_by_key(|b| ids.iter().position(|id| *id == b.id));
        self.profiles(books).await
    }

    pub async fn list(&self) -> AppResult<Vec<BookProfile>> {
        let books = self.repository.books.list().await?;
        self.profiles(books).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<BookProfile> {
        let book = self.repository.books.get_by_id(id).await?;
        self.profile(book).await
    }

    /// Fail with 404 unless the book exists
    pub async fn ensure_exists(&self, id: Uuid) -> AppResult<()> {
        if self.repository.books.exists(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("book does not exist".to_string()))
        }
    }

    /// Add a book to the collection, completing missing details from the
    /// metadata lookup
    pub async fn create(&self, mut book: CreateBook) -> AppResult<Uuid> {
        if self.repository.books.isbn_exists(&book.isbn).await? {
            return Err(AppError::Conflict("book already in collection".to_string()));
        }

        if book.details.is_none() || book.image.is_none() {
            if let Some(found) = self.lookup_metadata(&book.isbn).await {
                apply_metadata(&mut book.details, found.details, false);
                apply_metadata(&mut book.image, found.image, false);
            }
        }

        let id = self.repository.books.create(&book).await?;
        tracing::info!(book_id = %id, isbn = %book.isbn, "book added");
        Ok(id)
    }

    /// Update a book. Fields supplied in `update` win over refreshed metadata.
    pub async fn update(&self, id: Uuid, update: UpdateBook) -> AppResult<Uuid> {
        let current = self.repository.books.get_by_id(id).await?;
        let mut changes = BookChanges::merge(&current, &update);

        if update.refresh_metadata {
            if let Some(found) = self.lookup_metadata(&current.isbn).await {
                apply_metadata(&mut changes.details, found.details, update.details.is_none());
                apply_metadata(&mut changes.image, found.image, update.image.is_none());
            }
        }

        self.repository.books.update(id, &changes).await
    }

    /// Full-text search; blank text matches nothing
    pub async fn search(&self, text: &str) -> AppResult<Vec<BookProfile>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let books = self.repository.books.search(text).await?;
        self.profiles(books).await
    }

    pub async fn category_names(&self) -> AppResult<Vec<String>> {
        self.repository.books.category_names().await
    }

    /// Profiles of the books in a category, by title
    pub async fn in_category(&self, category_name: &str) -> AppResult<Vec<BookProfile>> {
        let ids = self.repository.books.book_ids_in_category(category_name).await?;
        let mut books = self.repository.books.get_many(&ids).await?;
        books.sort_by(|a, b| a.title.cmp(&b.title));
        self.profiles(books).await
    }

    pub async fn add_category(&self, book_id: Uuid, category_name: &str) -> AppResult<CategoryMembership> {
        self.ensure_exists(book_id).await?;
        self.repository.books.add_membership(category_name, book_id).await
    }

    pub async fn remove_category(&self, book_id: Uuid, category_name: &str) -> AppResult<()> {
        self.ensure_exists(book_id).await?;

        let membership = self
            .repository
            .books
            .find_membership(category_name, book_id)
            .await?
            .ok_or_else(|| AppError::NotFound("book does not belong to this category".to_string()))?;

        self.repository.books.remove_membership(membership.id).await
    }

    /// Metadata for an ISBN; lookup failures are logged and ignored
    async fn lookup_metadata(&self, isbn: &str) -> Option<BookMetadata> {
        let lookup = self.metadata.as_ref()?;
        match lookup.lookup(isbn).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(%isbn, "metadata lookup failed: {}", e);
                None
            }
        }
    }
}

/// Store `found` into `target` when present, replacing an existing value
/// only if `overwrite` is set
fn apply_metadata(target: &mut Option<String>, found: Option<String>, overwrite: bool) {
    if found.is_some() && (overwrite || target.is_none()) {
        *target = found;
    }
}
