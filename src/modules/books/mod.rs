pub mod models;
pub mod service;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};
use serde_json::json;
use shelf_db::Book;
use shelf_http::{ApiResponse, AppError, CurrentSubject};
use shelf_kernel::{InitCtx, Module};

use crate::context::AppState;
use models::{BookDetails, BookSummary, CreateBook, UpdateBook};

/// Book catalog
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            empty_list = ?ctx.settings.catalog.empty_list,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_books).post(create_book))
            .route(
                "/{id}",
                get(get_book).put(update_book).delete(delete_book),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        });
        let id_param = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string", "format": "uuid" }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List live books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Book summaries in creation order",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/BookSummary" }
                                        }
                                    }
                                }
                            },
                            "404": { "description": "No books (when configured)", "content": error }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBook" }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "Book created" },
                            "400": { "description": "Missing fields, bad ids, or title/ISBN taken", "content": error },
                            "401": { "description": "No valid token", "content": error },
                            "404": { "description": "Owner not found", "content": error }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book with its live reviews",
                        "tags": ["Books"],
                        "parameters": [id_param],
                        "responses": {
                            "200": { "description": "Book and reviewsData" },
                            "400": { "description": "Malformed id", "content": error },
                            "404": { "description": "Book not found", "content": error }
                        }
                    },
                    "put": {
                        "summary": "Update a book",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": [id_param],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateBook" }
                                }
                            }
                        },
                        "responses": {
                            "200": { "description": "Book updated" },
                            "400": { "description": "Invalid field or title/ISBN taken", "content": error },
                            "401": { "description": "No valid token", "content": error },
                            "404": { "description": "Book not found", "content": error }
                        }
                    },
                    "delete": {
                        "summary": "Soft-delete a book",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": [id_param],
                        "responses": {
                            "200": { "description": "Book deleted" },
                            "400": { "description": "Malformed id", "content": error },
                            "401": { "description": "No valid token", "content": error },
                            "404": { "description": "Book not found or already deleted", "content": error }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookSummary": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "title": { "type": "string" },
                            "excerpt": { "type": "string" },
                            "userId": { "type": "string", "format": "uuid" },
                            "category": { "type": "string" },
                            "releasedAt": { "type": "string", "format": "date" },
                            "reviews": { "type": "integer", "minimum": 0 }
                        }
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "excerpt": { "type": "string" },
                            "userId": { "type": "string", "format": "uuid", "description": "Defaults to the caller" },
                            "ISBN": { "type": "string" },
                            "category": { "type": "string" },
                            "subcategory": { "type": "array", "items": { "type": "string" } },
                            "releasedAt": { "type": "string", "format": "date" }
                        },
                        "required": ["title", "excerpt", "ISBN", "category", "subcategory", "releasedAt"]
                    },
                    "UpdateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "excerpt": { "type": "string" },
                            "ISBN": { "type": "string" },
                            "category": { "type": "string" },
                            "subcategory": { "type": "array", "items": { "type": "string" } },
                            "releasedAt": { "type": "string", "format": "date" }
                        }
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

async fn create_book(
    State(state): State<AppState>,
    CurrentSubject(subject): CurrentSubject,
    payload: Result<Json<CreateBook>, JsonRejection>,
) -> Result<ApiResponse<Book>, AppError> {
    let Json(payload) = payload?;
    let book = state.catalog.create(subject.id, payload).await?;
    Ok(ApiResponse::created("Book created successfully", book))
}

async fn list_books(State(state): State<AppState>) -> Result<ApiResponse<Vec<BookSummary>>, AppError> {
    let books = state.catalog.list().await?;
    Ok(ApiResponse::ok("Books list", books))
}

async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<BookDetails>, AppError> {
    let details = state.catalog.get(&id).await?;
    Ok(ApiResponse::ok("Book details", details))
}

async fn update_book(
    State(state): State<AppState>,
    CurrentSubject(_subject): CurrentSubject,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBook>, JsonRejection>,
) -> Result<ApiResponse<Book>, AppError> {
    let Json(payload) = payload?;
    let book = state.catalog.update(&id, payload).await?;
    Ok(ApiResponse::ok("Book updated successfully", book))
}

async fn delete_book(
    State(state): State<AppState>,
    CurrentSubject(_subject): CurrentSubject,
    Path(id): Path<String>,
) -> Result<ApiResponse<Book>, AppError> {
    let book = state.catalog.soft_delete(&id).await?;
    Ok(ApiResponse::ok("Book deleted successfully", book))
}

/// Create a new instance of the books module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(state))
}
