use crate::{
    auth::{AuthResponse, Claims, Hasher, LoginRequest, RegisterRequest},
    error::AppError,
    models::{normalize_email, Account, AccountView, NewAccount, Role},
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new account
///
/// Creates the account and returns a token bound to its id and role.
/// Responds 409 when the (case-normalized) email is already registered.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let request = register_data.into_inner();
    let email = normalize_email(&request.email);

    if state.accounts.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let mut role = Role::from_requested(request.role.as_deref());
    if role == Role::Admin && !state.allow_admin_registration {
        log::warn!("admin registration is disabled; registering {} as USER", email);
        role = Role::User;
    }

    let password_digest = digest_password(state.hasher, request.password).await?;
    let account = state
        .accounts
        .create(NewAccount {
            email,
            name: request.name,
            password_digest,
            role,
        })
        .await?;
    log::info!("registered account {} with role {}", account.id, account.role);

    Ok(HttpResponse::Created().json(auth_response(
        &state,
        &account,
        "User registered successfully",
    )?))
}

/// Login
///
/// Exchanges email and password for a token. Unknown emails and wrong
/// passwords get the same 401.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let request = login_data.into_inner();
    let email = normalize_email(&request.email);

    let Some(account) = state.accounts.find_by_email(&email).await? else {
        return Err(invalid_credentials());
    };
    if !check_password(state.hasher, request.password, account.password_digest.clone()).await? {
        return Err(invalid_credentials());
    }

    Ok(HttpResponse::Ok().json(auth_response(&state, &account, "Login successful")?))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password".into())
}

fn auth_response(state: &AppState, account: &Account, message: &str) -> Result<AuthResponse, AppError> {
    let token = state.tokens.issue(&Claims::new(&account.id, account.role))?;
    Ok(AuthResponse {
        message: message.to_string(),
        token,
        user: AccountView::from(account),
    })
}

// Hashing runs on the blocking pool; a bcrypt round can take hundreds of milliseconds.
async fn digest_password(hasher: Hasher, password: String) -> Result<String, AppError> {
    let digest = web::block(move || hasher.digest(&password))
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))??;
    Ok(digest)
}

async fn check_password(hasher: Hasher, password: String, digest: String) -> Result<bool, AppError> {
    let matches = web::block(move || hasher.verify(&password, &digest))
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))??;
    Ok(matches)
}
