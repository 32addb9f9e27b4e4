// src/web/mod.rs
pub mod handlers;
pub mod types;

pub use types::*;

use crate::auth::{AuthKeys, AuthenticatedUser};
use crate::database::DatabaseConfig;
use crate::settings::Settings;
use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::figment::Figment;
use rocket::http::{Header, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{catchers, delete, get, options, post, put, routes, Build, Request, Response, Rocket, State};
use tracing::info;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS, PUT, DELETE",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Accept, Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, Authorization, \
             Access-Control-Request-Headers, Access-Control-Request-Method, Connection, Host, \
             Origin, User-Agent, Referer, Cache-Control, X-header",
        ));
    }
}

// Preflights carry no body; the fairing adds the actual CORS headers
#[options("/<_..>")]
pub async fn preflight() -> Status {
    Status::Ok
}

#[post("/register", data = "<request>")]
pub async fn register(
    request: Json<RegisterRequest>,
    db_config: &State<DatabaseConfig>,
    keys: &State<AuthKeys>,
) -> Result<Custom<Json<AuthResponse>>, Custom<Json<ErrorResponse>>> {
    handlers::register_handler(request, db_config, keys).await
}

#[post("/login", data = "<request>")]
pub async fn login(
    request: Json<LoginRequest>,
    cookies: &rocket::http::CookieJar<'_>,
    db_config: &State<DatabaseConfig>,
    keys: &State<AuthKeys>,
) -> Result<Json<AuthResponse>, Custom<Json<ErrorResponse>>> {
    handlers::login_handler(request, cookies, db_config, keys).await
}

#[get("/user")]
pub async fn fetch_users(
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<Vec<crate::database::User>>, Custom<Json<ErrorResponse>>> {
    handlers::fetch_users_handler(auth, db_config).await
}

#[get("/user/<id>")]
pub async fn get_user(
    id: i64,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<crate::database::User>, Custom<Json<ErrorResponse>>> {
    handlers::get_user_handler(id, auth, db_config).await
}

#[put("/user/<id>", data = "<request>")]
pub async fn update_user(
    id: i64,
    request: Json<UpdateUserRequest>,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<crate::database::User>, Custom<Json<ErrorResponse>>> {
    handlers::update_user_handler(id, request, auth, db_config).await
}

#[delete("/user/<id>")]
pub async fn delete_user(
    id: i64,
    auth: AuthenticatedUser,
    db_config: &State<DatabaseConfig>,
) -> Result<Json<ActionResponse>, Custom<Json<ErrorResponse>>> {
    handlers::delete_user_handler(id, auth, db_config).await
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<ErrorResponse> {
    Json(ErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(403)]
pub fn forbidden() -> Json<ErrorResponse> {
    Json(ErrorResponse::new(
        "Access token missing or invalid".to_string(),
        "FORBIDDEN".to_string(),
        vec![
            "Login to obtain an access token".to_string(),
            "Send the token in the x-access-token header".to_string(),
        ],
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<ErrorResponse> {
    Json(ErrorResponse::new(
        "Resource not found".to_string(),
        "NOT_FOUND".to_string(),
        vec!["Check the request path".to_string()],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ErrorResponse> {
    Json(ErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
    ))
}

pub fn build_rocket(
    figment: Figment,
    db_config: DatabaseConfig,
    auth_keys: AuthKeys,
) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(Cors)
        .manage(db_config)
        .manage(auth_keys)
        .register(
            "/",
            catchers![bad_request, forbidden, not_found, internal_error],
        )
        .mount("/", routes![register, login, preflight])
        .mount(
            "/auth",
            routes![fetch_users, get_user, update_user, delete_user],
        )
}

// Main server start function
pub async fn start_web_server(settings: Settings) -> Result<()> {
    let mut db_config = DatabaseConfig::new(settings.database_path.clone());
    db_config.init_pool().await?;
    db_config.migrate().await?;

    let auth_keys = AuthKeys::load(&settings.private_key_path(), &settings.public_key_path())?;

    info!("Starting user API server");
    info!("Database: {}", settings.database_path.display());
    info!("Server: http://0.0.0.0:{}", settings.port);

    let figment = rocket::Config::figment()
        .merge(("address", "0.0.0.0"))
        .merge(("port", settings.port));

    build_rocket(figment, db_config, auth_keys).launch().await?;

    Ok(())
}
