//! Account route handlers: signup, OTP verification, login, password
//! reset, and administrative user management.
//!
//! Signup is the one place where a notification failure is surfaced to
//! the caller: the account exists but unverified, so the client is told
//! to re-request the code.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use voltshop_core::{Email, UserId, UserRole};

use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::user::User;
use crate::routes::{ApiResponse, message, ok};
use crate::services::auth::{
    generate_otp, generate_reset_token, hash_password, hash_reset_token, otp_expiry,
    reset_token_expiry, sign_token, validate_password, verify_password,
};
use crate::services::templates::{password_reset_email, resend_otp_email, verify_otp_email};
use crate::state::AppState;

/// Maximum number of admin accounts.
const ADMIN_SEAT_LIMIT: i64 = 2;

#[derive(Debug, Deserialize)]
pub struct SignupBody {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpBody {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailBody {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordBody {
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserBody {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub landmark: Option<String>,
}

/// Login response payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub id: UserId,
    pub name: String,
    pub token: String,
    pub is_login: bool,
}

/// Create the user routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/verify-otp", post(verify_otp))
        .route("/resend-otp", post(resend_otp))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/{token}", post(reset_password))
        .route("/", get(list_users))
        .route(
            "/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// Create an unverified account and email its verification code.
#[instrument(skip(state, body))]
async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupBody>,
) -> Result<impl IntoResponse> {
    let email = Email::parse(&body.email).map_err(crate::services::auth::AuthError::from)?;
    validate_password(&body.password)?;

    let role: UserRole = body
        .role
        .as_deref()
        .unwrap_or("user")
        .parse()
        .map_err(|_| AppError::Validation("Invalid role".to_string()))?;

    let users = UserRepository::new(state.pool());

    if role.is_admin() && users.count_admins().await? >= ADMIN_SEAT_LIMIT {
        return Err(AppError::Forbidden("Only two admins are allowed.".to_string()));
    }

    let password_hash = hash_password(&body.password)?;
    let otp = generate_otp();

    let user = users
        .create(
            &body.name,
            &email,
            &password_hash,
            &body.phone,
            role,
            &otp,
            otp_expiry(),
        )
        .await?;

    // Surfaced on purpose: the account exists but cannot be verified
    // until the caller re-requests a code
    state
        .mailer()
        .send(
            email.as_str(),
            "Verify Your Account - OTP Code",
            &verify_otp_email(&otp),
        )
        .await?;

    Ok((StatusCode::CREATED, ok("Verify your account", user)))
}

/// Verify an account with its one-time code.
#[instrument(skip(state, body))]
async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<Json<ApiResponse<()>>> {
    if body.email.is_empty() || body.otp.is_empty() {
        return Err(AppError::Validation("Email and OTP are required.".to_string()));
    }
    let email = Email::parse(&body.email).map_err(crate::services::auth::AuthError::from)?;

    let users = UserRepository::new(state.pool());
    let otp_state = users
        .get_otp_state(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    if otp_state.user.is_verified {
        return Err(AppError::Validation("User already verified.".to_string()));
    }

    let valid = otp_state.otp_code.as_deref() == Some(body.otp.as_str())
        && otp_state
            .otp_expires_at
            .is_some_and(|expiry| expiry > chrono::Utc::now());

    if !valid {
        return Err(AppError::Validation("Invalid or expired OTP.".to_string()));
    }

    users.mark_verified(otp_state.user.id).await?;

    Ok(message("User verified successfully, you can now log in."))
}

/// Re-issue a verification code for an unverified account.
#[instrument(skip(state, body))]
async fn resend_otp(
    State(state): State<AppState>,
    Json(body): Json<EmailBody>,
) -> Result<Json<ApiResponse<()>>> {
    if body.email.is_empty() {
        return Err(AppError::Validation("Email is required.".to_string()));
    }
    let email = Email::parse(&body.email).map_err(crate::services::auth::AuthError::from)?;

    let users = UserRepository::new(state.pool());
    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    if user.is_verified {
        return Err(AppError::Validation("User is already verified.".to_string()));
    }

    let otp = generate_otp();
    users.set_otp(user.id, &otp, otp_expiry()).await?;

    state
        .mailer()
        .send(email.as_str(), "Resend OTP - Voltshop", &resend_otp_email(&otp))
        .await?;

    Ok(message("OTP resent successfully. Please check your email."))
}

/// Verify credentials and issue a bearer token.
#[instrument(skip(state, body))]
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<ApiResponse<LoginData>>> {
    let email = Email::parse(&body.email).map_err(crate::services::auth::AuthError::from)?;

    let users = UserRepository::new(state.pool());
    let (user, password_hash) = users
        .get_password_hash(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("No account found with this email".to_string()))?;

    if !user.is_verified {
        return Err(AppError::Forbidden(
            "Please verify your email before logging in".to_string(),
        ));
    }

    if !verify_password(&body.password, &password_hash) {
        return Err(AppError::Forbidden("Invalid credentials".to_string()));
    }

    let token = sign_token(user.id, user.role, &state.config().jwt_secret)?;
    users.set_login(user.id, true).await?;

    Ok(ok(
        "User login successful",
        LoginData {
            id: user.id,
            name: user.name,
            token,
            is_login: true,
        },
    ))
}

/// Clear the login flag.
#[instrument(skip(state, body))]
async fn logout(
    State(state): State<AppState>,
    Json(body): Json<EmailBody>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    if body.email.is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }
    let email = Email::parse(&body.email).map_err(crate::services::auth::AuthError::from)?;

    let users = UserRepository::new(state.pool());
    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    users.set_login(user.id, false).await?;

    Ok(ok(
        "User logged out successfully",
        serde_json::json!({ "isLogin": false }),
    ))
}

/// Email a password-reset link.
#[instrument(skip(state, body))]
async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<EmailBody>,
) -> Result<Json<ApiResponse<()>>> {
    let email = Email::parse(&body.email).map_err(crate::services::auth::AuthError::from)?;

    let users = UserRepository::new(state.pool());
    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("No account found with this email".to_string()))?;

    // The raw token is mailed; only its digest is stored
    let (raw_token, token_hash) = generate_reset_token();
    users
        .set_reset_token(user.id, &token_hash, reset_token_expiry())
        .await?;

    let reset_link = format!("{}/reset-password/{raw_token}", state.config().client_url);
    state
        .mailer()
        .send(
            email.as_str(),
            "Reset Your Password - Voltshop",
            &password_reset_email(&reset_link),
        )
        .await?;

    Ok(message("Password reset email sent."))
}

/// Set a new password using an emailed reset token.
#[instrument(skip(state, body, token))]
async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordBody>,
) -> Result<Json<ApiResponse<()>>> {
    if token.is_empty() || body.new_password.is_empty() {
        return Err(AppError::Validation(
            "Token and new password are required.".to_string(),
        ));
    }

    let users = UserRepository::new(state.pool());
    let (user, current_hash) = users
        .get_by_reset_token(&hash_reset_token(&token))
        .await?
        .ok_or_else(|| AppError::Validation("Invalid or expired token.".to_string()))?;

    if verify_password(&body.new_password, &current_hash) {
        return Err(AppError::Validation(
            "You cannot use your previous password.".to_string(),
        ));
    }

    validate_password(&body.new_password)?;
    let new_hash = hash_password(&body.new_password)?;
    users.reset_password(user.id, &new_hash).await?;

    Ok(message("Password has been reset successfully."))
}

/// List all users.
#[instrument(skip(state, _admin))]
async fn list_users(
    State(state): State<AppState>,
    crate::middleware::RequireAdmin(_admin): crate::middleware::RequireAdmin,
) -> Result<Json<ApiResponse<Vec<User>>>> {
    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(ok("Users retrieved successfully", users))
}

/// Get one user. Admins can read anyone; others only themselves.
#[instrument(skip(state, caller))]
async fn get_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<UserId>,
) -> Result<Json<ApiResponse<User>>> {
    if !caller.role.is_admin() && caller.id != id {
        return Err(AppError::Forbidden(
            "You are not authorized to view this user.".to_string(),
        ));
    }

    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ok("User found successfully", user))
}

/// Update profile fields. Admins can target anyone; others update
/// themselves regardless of the path ID.
#[instrument(skip(state, caller, body))]
async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<UserId>,
    Json(body): Json<UpdateUserBody>,
) -> Result<Json<ApiResponse<User>>> {
    let target = if caller.role.is_admin() { id } else { caller.id };

    let users = UserRepository::new(state.pool());
    let current = users
        .get_by_id(target)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !current.is_login {
        return Err(AppError::Validation(
            "User must be logged in to update information".to_string(),
        ));
    }

    let user = users
        .update_profile(
            target,
            body.name.as_deref(),
            body.phone.as_deref(),
            body.street.as_deref(),
            body.landmark.as_deref(),
        )
        .await?;

    Ok(ok("User updated successfully", user))
}

/// Delete a user and return the remaining accounts. Associated reviews,
/// cart rows and wishlist rows are removed with the account.
#[instrument(skip(state, _admin))]
async fn delete_user(
    State(state): State<AppState>,
    crate::middleware::RequireAdmin(_admin): crate::middleware::RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<ApiResponse<Vec<User>>>> {
    let users = UserRepository::new(state.pool());

    if !users.delete(id).await? {
        return Err(AppError::NotFound(
            "This user does not exist and cannot be deleted".to_string(),
        ));
    }

    let remaining = users.list_all().await?;
    Ok(ok("User deleted successfully", remaining))
}
