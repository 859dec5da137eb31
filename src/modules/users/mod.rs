pub mod models;
pub mod service;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde_json::json;
use shelf_db::User;
use shelf_http::{ApiResponse, AppError};
use shelf_kernel::{InitCtx, Module};

use crate::context::AppState;
use models::{LoginRequest, LoginResponse, RegisterUser};

/// Registration and login
pub struct UsersModule {
    state: AppState,
}

impl UsersModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            token_ttl_secs = ctx.settings.auth.token_ttl_secs,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/register", post(register_user))
            .route("/login", post(login_user))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/register": {
                    "post": {
                        "summary": "Register a user",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/RegisterUser" }
                                }
                            }
                        },
                        "responses": {
                            "201": { "description": "User created" },
                            "400": {
                                "description": "Missing or invalid fields, or email/phone already registered",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/login": {
                    "post": {
                        "summary": "Exchange email and password for a session token",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/LoginRequest" }
                                }
                            }
                        },
                        "responses": {
                            "200": { "description": "Token issued" },
                            "400": { "description": "Email or password missing" },
                            "401": {
                                "description": "Invalid credentials",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "RegisterUser": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "enum": ["Mr", "Mrs", "Miss"] },
                            "name": { "type": "string" },
                            "phone": { "type": "string", "description": "10 digits, optional +91 prefix" },
                            "email": { "type": "string", "format": "email" },
                            "password": { "type": "string", "minLength": 8, "maxLength": 15 },
                            "address": {
                                "type": "object",
                                "properties": {
                                    "street": { "type": "string" },
                                    "city": { "type": "string" },
                                    "pincode": { "type": "string" }
                                }
                            }
                        },
                        "required": ["title", "name", "phone", "email", "password"]
                    },
                    "LoginRequest": {
                        "type": "object",
                        "properties": {
                            "email": { "type": "string", "format": "email" },
                            "password": { "type": "string" }
                        },
                        "required": ["email", "password"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUser>, JsonRejection>,
) -> Result<ApiResponse<User>, AppError> {
    let Json(payload) = payload?;
    let user = state.identity.register(payload).await?;
    Ok(ApiResponse::created("User created successfully", user))
}

async fn login_user(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<LoginResponse>, AppError> {
    let Json(payload) = payload?;
    let session = state.identity.login(payload).await?;
    Ok(ApiResponse::ok("Login successful", session))
}

/// Create a new instance of the users module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(UsersModule::new(state))
}
