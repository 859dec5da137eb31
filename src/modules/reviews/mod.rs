pub mod models;
pub mod service;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shelf_db::{Review, Reviewer};
use shelf_http::{ApiResponse, AppError, CurrentSubject, OptionalSubject};
use shelf_kernel::{InitCtx, Module};

use crate::context::AppState;
use models::{CreateReview, UpdateReview};

/// Book reviews
pub struct ReviewsModule {
    state: AppState,
}

impl ReviewsModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for ReviewsModule {
    fn name(&self) -> &'static str {
        "reviews"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            allow_guest = ctx.settings.reviews.allow_guest,
            "reviews module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        // `{id}` is a book id for GET and a review id for PUT and DELETE.
        Router::new()
            .route("/", post(create_review))
            .route(
                "/{id}",
                get(list_reviews).put(update_review).delete(delete_review),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        });
        let id_param = |description: &str| {
            json!({
                "name": "id",
                "in": "path",
                "required": true,
                "description": description,
                "schema": { "type": "string", "format": "uuid" }
            })
        };

        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Review a book",
                        "tags": ["Reviews"],
                        "security": [{ "bearerAuth": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateReview" }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "Review created, book counter incremented" },
                            "400": { "description": "Missing bookId or rating, or rating out of range", "content": error },
                            "401": { "description": "No valid token", "content": error },
                            "404": { "description": "Book not found or deleted", "content": error }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "List live reviews of a book",
                        "tags": ["Reviews"],
                        "parameters": [id_param("Book id")],
                        "responses": {
                            "200": { "description": "Reviews in creation order" },
                            "400": { "description": "Malformed id", "content": error },
                            "404": { "description": "No reviews (when configured)", "content": error }
                        }
                    },
                    "put": {
                        "summary": "Update your review",
                        "tags": ["Reviews"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": [id_param("Review id")],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateReview" }
                                }
                            }
                        },
                        "responses": {
                            "200": { "description": "Review updated" },
                            "400": { "description": "Malformed id or rating out of range", "content": error },
                            "401": { "description": "No valid token", "content": error },
                            "403": { "description": "Not the author", "content": error },
                            "404": { "description": "Review not found or deleted", "content": error }
                        }
                    },
                    "delete": {
                        "summary": "Soft-delete your review",
                        "tags": ["Reviews"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": [id_param("Review id")],
                        "responses": {
                            "200": { "description": "Review deleted, book counter decremented" },
                            "400": { "description": "Malformed id", "content": error },
                            "401": { "description": "No valid token", "content": error },
                            "403": { "description": "Not the author", "content": error },
                            "404": { "description": "Review not found or already deleted", "content": error }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "CreateReview": {
                        "type": "object",
                        "properties": {
                            "bookId": { "type": "string", "format": "uuid" },
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "review": { "type": "string" }
                        },
                        "required": ["bookId", "rating"]
                    },
                    "UpdateReview": {
                        "type": "object",
                        "properties": {
                            "rating": { "type": "integer", "minimum": 1, "maximum": 5 },
                            "review": { "type": "string" }
                        }
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            skipped_syncs = self.state.coordinator.skipped_syncs(),
            "reviews module stopped"
        );
        Ok(())
    }
}

async fn create_review(
    State(state): State<AppState>,
    OptionalSubject(subject): OptionalSubject,
    payload: Result<Json<CreateReview>, JsonRejection>,
) -> Result<ApiResponse<Review>, AppError> {
    let author = match subject {
        Some(subject) => Reviewer::User(subject.id),
        None if state.settings.reviews.allow_guest => Reviewer::Guest,
        None => return Err(AppError::unauthorized("access denied, no token provided")),
    };

    let Json(payload) = payload?;
    let review = state.reviews.create(author, payload).await?;
    Ok(ApiResponse::created("Review created successfully", review))
}

async fn list_reviews(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> Result<ApiResponse<Vec<Review>>, AppError> {
    let reviews = state.reviews.list_for_book(&book_id).await?;
    Ok(ApiResponse::ok("Reviews list", reviews))
}

async fn update_review(
    State(state): State<AppState>,
    CurrentSubject(subject): CurrentSubject,
    Path(id): Path<String>,
    payload: Result<Json<UpdateReview>, JsonRejection>,
) -> Result<ApiResponse<Review>, AppError> {
    let Json(payload) = payload?;
    let review = state.reviews.update(&subject, &id, payload).await?;
    Ok(ApiResponse::ok("Review updated successfully", review))
}

async fn delete_review(
    State(state): State<AppState>,
    CurrentSubject(subject): CurrentSubject,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    state.reviews.soft_delete(&subject, &id).await?;
    Ok(ApiResponse::message("Review deleted successfully."))
}

/// Create a new instance of the reviews module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(ReviewsModule::new(state))
}
