use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};

use crate::{
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    models::{Role, User},
    response::ApiResponse,
    state::AppState,
};

pub async fn register(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        username,
        email,
        password,
        role,
    } = payload;

    if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation("Missing required fields".into()));
    }

    let role: Role = role
        .as_deref()
        .unwrap_or(Role::Customer.as_str())
        .parse()
        .map_err(AppError::Validation)?;

    let exists = Users::find()
        .filter(
            Condition::any()
                .add(UserCol::Username.eq(username.as_str()))
                .add(UserCol::Email.eq(email.as_str())),
        )
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict(
            "Username or email is already taken".into(),
        ));
    }

    let password_hash = hash_password(&password)?;

    let user = UserActive {
        id: NotSet,
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(role.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(user_id = user.id, "user registered");
    Ok(ApiResponse::success(
        "User registered",
        user_from_entity(user)?,
        None,
    ))
}

pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { username, password } = payload;

    let user = Users::find()
        .filter(UserCol::Username.eq(username.as_str()))
        .one(&state.orm)
        .await?;

    // Unknown username and wrong password must be indistinguishable.
    let user = match user {
        Some(u) => u,
        None => return Err(invalid_credentials()),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("invalid stored password hash")))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid_credentials());
    }

    let role: Role = user
        .role
        .parse()
        .map_err(|err: String| AppError::Internal(anyhow::anyhow!(err)))?;

    let token = state.tokens.issue(user.id, &user.username, role)?;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            role,
            username: user.username,
        },
        None,
    ))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".into())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn user_from_entity(model: UserModel) -> AppResult<User> {
    let role: Role = model
        .role
        .parse()
        .map_err(|err: String| AppError::Internal(anyhow::anyhow!(err)))?;
    Ok(User {
        id: model.id,
        username: model.username,
        email: model.email,
        role,
        created_at: model.created_at.with_timezone(&chrono::Utc),
    })
}
