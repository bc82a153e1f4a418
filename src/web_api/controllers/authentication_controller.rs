use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::{create_token, hash_password, verify_password},
    error::{poisoned, ApiError},
    shared::dto::{
        auth_response::UserResponse, login_request::LoginRequest,
        register_request::RegisterRequest,
    },
    state::SharedState,
    web_api::extract::ApiJson,
    world::User,
};

pub struct AuthenticationController {}

impl AuthenticationController {
    pub async fn register(
        State(state): State<SharedState>,
        ApiJson(body): ApiJson<RegisterRequest>,
    ) -> Result<(StatusCode, Json<Value>), ApiError> {
        let username = body.username.trim();
        let email = body.email.trim();
        if username.is_empty() || email.is_empty() || body.password.is_empty() {
            return Err(ApiError::BadRequest("All fields are required".into()));
        }

        let password_hash =
            hash_password(&body.password).map_err(|e| ApiError::Internal(e.to_string()))?;

        let (user, created) = {
            let mut world = state.world.write().map_err(poisoned)?;
            let existing = world
                .get_user_by_username(username)
                .or_else(|| world.get_user_by_email(email));
            match existing {
                // Dev mode: registering twice just logs you in.
                Some(user) if state.settings.dev_mode => (UserResponse::from(user), false),
                Some(_) => {
                    return Err(ApiError::Conflict(
                        "User with that email or username already exists".into(),
                    ))
                }
                None => {
                    let user = User {
                        id: Uuid::new_v4(),
                        username: username.to_string(),
                        email: email.to_string(),
                        password_hash,
                        created_at: Utc::now(),
                    };
                    if let Some(save_file) = &state.save_file {
                        save_file
                            .save_user(&user)
                            .map_err(|e| ApiError::Internal(e.to_string()))?;
                    }
                    let response = UserResponse::from(&user);
                    world.users.insert(user.id, user);
                    tracing::info!(username = %response.username, "user registered");
                    (response, true)
                }
            }
        };

        let token = create_token(user.id, &user.username, &state.settings)
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        let (status, message) = if created {
            (StatusCode::CREATED, "Account created")
        } else {
            (StatusCode::OK, "Logged in successfully")
        };
        Ok((
            status,
            Json(json!({
                "success": true,
                "message": message,
                "token": token,
                "user": user,
            })),
        ))
    }

    pub async fn login(
        State(state): State<SharedState>,
        ApiJson(body): ApiJson<LoginRequest>,
    ) -> Result<Json<Value>, ApiError> {
        let identifier = body.identifier.trim();
        if identifier.is_empty() {
            return Err(ApiError::BadRequest("Username or email is required".into()));
        }

        let found = {
            let world = state.read()?;
            let user = if identifier.contains('@') {
                world.get_user_by_email(identifier)
            } else {
                world.get_user_by_username(identifier)
            };
            user.map(|u| (UserResponse::from(u), u.password_hash.clone()))
        };

        let user = match found {
            Some((user, _)) if state.settings.dev_mode => user,
            Some((user, hash)) if verify_password(&body.password, &hash) => user,
            None if state.settings.dev_mode => dev_user(&state, identifier, &body.password)?,
            _ => {
                tracing::info!(identifier, "failed login");
                return Err(ApiError::Unauthorized("Invalid credentials"));
            }
        };

        let token = create_token(user.id, &user.username, &state.settings)
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        tracing::info!(username = %user.username, "logged in");
        Ok(Json(json!({
            "success": true,
            "message": "Logged in successfully",
            "token": token,
            "user": user,
        })))
    }

    /// Tokens are stateless; the client drops its copy.
    pub async fn logout() -> Json<Value> {
        Json(json!({ "success": true, "message": "Logged out successfully" }))
    }
}

/// Dev mode accepts any identifier: make up a user for it on the spot.
fn dev_user(state: &SharedState, identifier: &str, password: &str) -> Result<UserResponse, ApiError> {
    let (username, email) = match identifier.split_once('@') {
        Some((name, _)) => (name.to_string(), identifier.to_string()),
        None => (identifier.to_string(), format!("{identifier}@local")),
    };
    let password_hash = hash_password(password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let mut world = state.world.write().map_err(poisoned)?;
    if let Some(user) = world.get_user_by_username(&username) {
        return Ok(UserResponse::from(user));
    }
    let user = User {
        id: Uuid::new_v4(),
        username,
        email,
        password_hash,
        created_at: Utc::now(),
    };
    let response = UserResponse::from(&user);
    world.users.insert(user.id, user);
    Ok(response)
}
