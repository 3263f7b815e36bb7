use axum::Json;
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::models::user::{ROLE_LAB_INCHARGE, ROLE_LAB_PROGRAMMER};
use crate::services::ScheduleService;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register/lab-incharge", post(register_lab_incharge))
        .route("/register/lab-programmer", post(register_lab_programmer))
        .route("/login", post(login))
        .route("/forgotPassword", post(forgot_password))
        .route("/resetPassword", post(reset_password))
        .route("/labs", post(create_lab))
        .route("/labs/data", post(labs_by_incharge))
        .route("/labs/schedule", post(create_schedule))
        .route("/labs/get-schedule", post(get_day_schedule))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn register_lab_incharge(
    State(state): State<AppState>,
    Json(req): Json<RegisterInchargeRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    if repository::find_user_by_email(&state.db, &req.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already exists.".to_string()));
    }

    let salt = auth::generate_salt();
    let password_hash = auth::hash_password(&req.password, &salt);
    repository::insert_user(
        &state.db,
        repository::NewUser {
            username: req.username,
            email: req.email,
            password_hash,
            salt,
            role: ROLE_LAB_INCHARGE.to_string(),
            lab_managed: None,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        MessageResponse::new("Lab in-charge registered successfully!"),
    ))
}

async fn register_lab_programmer(
    State(state): State<AppState>,
    Json(req): Json<RegisterProgrammerRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let lab = repository::find_lab_by_name(&state.db, &req.lab_name)
        .await?
        .ok_or_else(|| AppError::NotFound("Lab not found.".to_string()))?;

    if repository::find_user_by_email(&state.db, &req.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email is already in use.".to_string()));
    }

    // One programmer per lab.
    if repository::find_programmer_for_lab(&state.db, &lab.id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "This lab is already assigned to a programmer.".to_string(),
        ));
    }

    let salt = auth::generate_salt();
    let password_hash = auth::hash_password(&req.password, &salt);
    repository::insert_user(
        &state.db,
        repository::NewUser {
            username: req.username,
            email: req.email,
            password_hash,
            salt,
            role: ROLE_LAB_PROGRAMMER.to_string(),
            lab_managed: Some(lab.id),
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        MessageResponse::new("Lab programmer account created successfully!"),
    ))
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    user: UserInfo,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid credentials.".to_string());

    let user = repository::find_user_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;
    if !auth::verify_password(&req.password, &user.salt, &user.password_hash) {
        return Err(invalid());
    }

    let token = auth::generate_session_token();
    repository::set_session_token(&state.db, &user.id, &token).await?;

    let labs_managed = repository::labs_managed_ids(&state.db, &user.id).await?;
    Ok(Json(LoginResponse {
        token,
        user: UserInfo {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            labs_managed,
        },
    }))
}

async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = repository::find_user_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let code = auth::generate_reset_code();
    repository::set_secret_code(&state.db, &user.id, &code).await?;
    state.mailer.send_reset_code(&user.email, &code).await?;

    Ok(MessageResponse::new("Email sent successfully"))
}

async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = repository::find_user_by_email_and_code(&state.db, &req.email, &req.secret_code)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid secret code".to_string()))?;

    let salt = auth::generate_salt();
    let password_hash = auth::hash_password(&req.new_password, &salt);
    repository::update_password(&state.db, &user.id, &password_hash, &salt).await?;

    Ok(MessageResponse::new("Password reset successful"))
}

#[derive(Debug, Serialize)]
struct LabCreatedResponse {
    message: String,
    lab: Lab,
}

async fn create_lab(
    State(state): State<AppState>,
    Json(req): Json<NewLabRequest>,
) -> Result<(StatusCode, Json<LabCreatedResponse>), AppError> {
    if repository::find_lab_by_name(&state.db, &req.name)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Lab already exists.".to_string()));
    }

    let lab = repository::insert_lab(&state.db, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(LabCreatedResponse {
            message: "Lab created successfully!".to_string(),
            lab,
        }),
    ))
}

#[derive(Debug, Deserialize)]
struct LabsDataRequest {
    lab_incharge: String,
}

#[derive(Debug, Serialize)]
struct LabsResponse {
    labs: Vec<Lab>,
}

async fn labs_by_incharge(
    State(state): State<AppState>,
    Json(req): Json<LabsDataRequest>,
) -> Result<Json<LabsResponse>, AppError> {
    let labs = repository::fetch_labs_by_incharge(&state.db, &req.lab_incharge).await?;
    if labs.is_empty() {
        return Err(AppError::NotFound(
            "No labs found for this lab in-charge.".to_string(),
        ));
    }
    Ok(Json(LabsResponse { labs }))
}

#[derive(Debug, Serialize)]
struct ScheduleCreatedResponse {
    message: String,
    schedule: LabSchedule,
}

async fn create_schedule(
    State(state): State<AppState>,
    Json(req): Json<NewScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleCreatedResponse>), AppError> {
    let service = ScheduleService::new(state.schedules.clone());
    let schedule = service.propose_schedule(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ScheduleCreatedResponse {
            message: "Lab schedule created successfully!".to_string(),
            schedule,
        }),
    ))
}

#[derive(Debug, Deserialize)]
struct DayQueryRequest {
    lab_name: String,
    date: NaiveDate,
    day: String,
}

#[derive(Debug, Serialize)]
struct DayScheduleResponse {
    schedule: DaySchedule,
}

async fn get_day_schedule(
    State(state): State<AppState>,
    Json(req): Json<DayQueryRequest>,
) -> Result<Json<DayScheduleResponse>, AppError> {
    let service = ScheduleService::new(state.schedules.clone());
    let schedule = service
        .resolve_day(&req.lab_name, req.date, &req.day)
        .await?;
    Ok(Json(DayScheduleResponse { schedule }))
}
