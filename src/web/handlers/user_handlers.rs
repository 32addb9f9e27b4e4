// src/web/handlers/user_handlers.rs
use crate::auth::{AuthKeys, AuthenticatedUser, TOKEN_NAME};
use crate::database::{DatabaseConfig, User, UserRepository};
use crate::web::types::{
    ActionResponse, AuthResponse, ErrorResponse, LoginRequest, RegisterRequest, UpdateUserRequest,
};

use rocket::http::{Cookie, CookieJar, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

fn database_error() -> Custom<Json<ErrorResponse>> {
    Custom(
        Status::InternalServerError,
        Json(ErrorResponse::new(
            "Database error occurred".to_string(),
            "DATABASE_ERROR".to_string(),
            vec!["Try again in a few moments".to_string()],
        )),
    )
}

fn user_not_found(id: i64) -> Custom<Json<ErrorResponse>> {
    Custom(
        Status::NotFound,
        Json(ErrorResponse::new(
            format!("No user with id {}", id),
            "USER_NOT_FOUND".to_string(),
            vec!["List users to see valid ids".to_string()],
        )),
    )
}

pub async fn register_handler(
    request: Json<RegisterRequest>,
    db_config: &State<DatabaseConfig>,
    keys: &State<AuthKeys>,
) -> Result<Custom<Json<AuthResponse>>, Custom<Json<ErrorResponse>>> {
    let pool = match db_config.pool() {
        Ok(pool) => pool,
        Err(e) => {
            error!("Database connection failed: {}", e);
            return Err(database_error());
        }
    };
    let repo = UserRepository::new(pool);

    match repo.find_by_email(&request.email).await {
        Ok(Some(_)) => {
            return Err(Custom(
                Status::BadRequest,
                Json(ErrorResponse::new(
                    format!("A user with email '{}' already exists", request.email),
                    "EMAIL_TAKEN".to_string(),
                    vec![
                        "Login with the existing account".to_string(),
                        "Use a different email address".to_string(),
                    ],
                )),
            ));
        }
        Ok(None) => {}
        Err(e) => {
            error!("error occurred in register: {}", e);
            return Err(database_error());
        }
    }

    let user = match repo
        .create(&request.name, &request.email, &request.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            error!("error occurred in register: {}", e);
            return Err(Custom(
                Status::BadRequest,
                Json(ErrorResponse::new(
                    "Failed to create user".to_string(),
                    "USER_CREATE_ERROR".to_string(),
                    vec!["Provide values for name, email and password".to_string()],
                )),
            ));
        }
    };

    let token = match keys.issue(&user) {
        Ok(token) => token,
        Err(e) => {
            error!("error occurred processing token: {}", e);
            return Err(Custom(
                Status::Forbidden,
                Json(ErrorResponse::new(
                    "Failed to issue access token".to_string(),
                    "TOKEN_ERROR".to_string(),
                    vec!["Try logging in".to_string()],
                )),
            ));
        }
    };

    info!("Registered user {} <{}>", user.name, user.email);

    Ok(Custom(
        Status::Created,
        Json(AuthResponse {
            status: true,
            access_token: token,
            user,
        }),
    ))
}

pub async fn login_handler(
    request: Json<LoginRequest>,
    cookies: &CookieJar<'_>,
    db_config: &State<DatabaseConfig>,
    keys: &State<AuthKeys>,
) -> Result<Json<AuthResponse>, Custom<Json<ErrorResponse>>> {
    let pool = match db_config.pool() {
        Ok(pool) => pool,
        Err(e) => {
            error!("Database connection failed: {}", e);
            return Err(database_error());
        }
    };
    let repo = UserRepository::new(pool);

    let user = match repo
        .verify_credentials(&request.email, &request.password)
        .await
    {
        Ok(Some(user)) => user,
        // Do not reveal whether the email or the password was wrong
        Ok(None) => {
            info!("Failed login for {}", request.email);
            return Err(Custom(
                Status::NotFound,
                Json(ErrorResponse::new(
                    "Invalid login credentials".to_string(),
                    "INVALID_CREDENTIALS".to_string(),
                    vec!["Check the email and password".to_string()],
                )),
            ));
        }
        Err(e) => {
            error!("error occurred in login: {}", e);
            return Err(database_error());
        }
    };

    let token = match keys.issue(&user) {
        Ok(token) => token,
        Err(e) => {
            error!("error occurred processing token: {}", e);
            return Err(Custom(
                Status::Forbidden,
                Json(ErrorResponse::new(
                    "Failed to issue access token".to_string(),
                    "TOKEN_ERROR".to_string(),
                    vec!["Try again in a few moments".to_string()],
                )),
            ));
        }
    };

    cookies.add(Cookie::build((TOKEN_NAME, token.clone())).path("/"));

    info!("User {} logged in", user.email);

    Ok(Json(AuthResponse {
        status: true,
        access_token: token,
        user,
    }))
}

pub async fn fetch_users_handler(
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<Vec<User>>, Custom<Json<ErrorResponse>>> {
    let pool = match db_config.pool() {
        Ok(pool) => pool,
        Err(e) => {
            error!("Database connection failed: {}", e);
            return Err(database_error());
        }
    };
    let repo = UserRepository::new(pool);

    match repo.list().await {
        Ok(users) => {
            info!("User {} listed {} users", auth.email, users.len());
            Ok(Json(users))
        }
        Err(e) => {
            error!("error occurred in fetch_users: {}", e);
            Err(database_error())
        }
    }
}

pub async fn get_user_handler(
    id: i64,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<User>, Custom<Json<ErrorResponse>>> {
    let pool = match db_config.pool() {
        Ok(pool) => pool,
        Err(e) => {
            error!("Database connection failed: {}", e);
            return Err(database_error());
        }
    };
    let repo = UserRepository::new(pool);

    match repo.get(id).await {
        Ok(Some(user)) => {
            info!("User {} fetched user id {}", auth.email, id);
            Ok(Json(user))
        }
        Ok(None) => Err(user_not_found(id)),
        Err(e) => {
            error!("error occurred in get_user: {}", e);
            Err(database_error())
        }
    }
}

pub async fn update_user_handler(
    id: i64,
    request: Json<UpdateUserRequest>,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<User>, Custom<Json<ErrorResponse>>> {
    let pool = match db_config.pool() {
        Ok(pool) => pool,
        Err(e) => {
            error!("Database connection failed: {}", e);
            return Err(database_error());
        }
    };
    let repo = UserRepository::new(pool);

    match repo
        .update(id, &request.name, &request.email, &request.password)
        .await
    {
        Ok(true) => {}
        Ok(false) => return Err(user_not_found(id)),
        Err(e) => {
            error!("error occurred in update_user: {}", e);
            return Err(database_error());
        }
    }

    info!("User {} updated user id {}", auth.email, id);

    match repo.get(id).await {
        Ok(Some(user)) => Ok(Json(user)),
        Ok(None) => Err(user_not_found(id)),
        Err(e) => {
            error!("error occurred in update_user: {}", e);
            Err(database_error())
        }
    }
}

pub async fn delete_user_handler(
    id: i64,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<ActionResponse>, Custom<Json<ErrorResponse>>> {
    let pool = match db_config.pool() {
        Ok(pool) => pool,
        Err(e) => {
            error!("Database connection failed: {}", e);
            return Err(database_error());
        }
    };
    let repo = UserRepository::new(pool);

    match repo.delete(id).await {
        Ok(true) => {
            info!("User {} deleted user id {}", auth.email, id);
            Ok(Json(ActionResponse {
                success: true,
                message: "User deleted".to_string(),
            }))
        }
        Ok(false) => Err(user_not_found(id)),
        Err(e) => {
            error!("error occurred in delete_user: {}", e);
            Err(database_error())
        }
    }
}
