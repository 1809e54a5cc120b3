use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    identity::CurrentUser,
    models::domain::Attempt,
    models::dto::request::{ManualGradeRequest, SubmitAttemptRequest},
    models::dto::response::{AttemptSummaryDto, PagedResponse},
};

fn ensure_owner(attempt: &Attempt, user: &CurrentUser) -> Result<(), AppError> {
    if attempt.user_id != user.id {
        return Err(AppError::Unauthorized(
            "Attempt belongs to a different user".to_string(),
        ));
    }
    Ok(())
}

#[get("/api/quizzes/{id}/eligibility")]
async fn check_eligibility(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let eligibility = state
        .attempt_service
        .check_eligibility(*id, &user.id)
        .await?;
    Ok(HttpResponse::Ok().json(eligibility))
}

#[post("/api/quizzes/{id}/attempts")]
async fn start_attempt(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state.attempt_service.start_attempt(*id, &user).await?;
    Ok(HttpResponse::Created().json(attempt))
}

#[post("/api/attempts/{id}/submit")]
async fn submit_attempt(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    request: web::Json<SubmitAttemptRequest>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state.attempt_service.get_attempt(*id).await?;
    ensure_owner(&attempt, &user)?;

    let attempt = state
        .attempt_service
        .submit_attempt(*id, request.into_inner().answers)
        .await?;
    Ok(HttpResponse::Ok().json(attempt))
}

#[post("/api/attempts/{id}/abandon")]
async fn abandon_attempt(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state.attempt_service.get_attempt(*id).await?;
    ensure_owner(&attempt, &user)?;

    let attempt = state.attempt_service.abandon_attempt(*id).await?;
    Ok(HttpResponse::Ok().json(attempt))
}

#[post("/api/attempts/{id}/expire")]
async fn expire_attempt(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state.attempt_service.get_attempt(*id).await?;
    ensure_owner(&attempt, &user)?;

    let attempt = state.attempt_service.expire_attempt(*id).await?;
    Ok(HttpResponse::Ok().json(attempt))
}

// Reviewer routes are restricted upstream by the gateway; the engine
// records who graded.
#[post("/api/attempts/{id}/manual-grade")]
async fn manual_grade(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    request: web::Json<ManualGradeRequest>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let request = request.into_inner();

    let attempt = state
        .attempt_service
        .record_manual_grade(
            *id,
            request.question_id,
            request.grade,
            request.feedback,
            &user.id,
        )
        .await?;
    Ok(HttpResponse::Ok().json(attempt))
}

#[get("/api/attempts/{id}")]
async fn get_attempt(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state.attempt_service.get_attempt(*id).await?;
    ensure_owner(&attempt, &user)?;
    Ok(HttpResponse::Ok().json(attempt))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListAttemptsQuery {
    pub quiz_id: Option<i64>,

    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

#[get("/api/attempts")]
async fn list_my_attempts(
    state: web::Data<AppState>,
    query: web::Query<ListAttemptsQuery>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    query.validate()?;
    let (attempts, total) = state
        .attempt_service
        .list_user_attempts(
            &user.id,
            query.quiz_id,
            query.offset.unwrap_or(0),
            query.limit.unwrap_or(20).min(100),
        )
        .await?;

    let items: Vec<AttemptSummaryDto> = attempts.iter().map(AttemptSummaryDto::from).collect();
    Ok(HttpResponse::Ok().json(PagedResponse { items, total }))
}

#[get("/api/attempts/{id}/certificate")]
async fn get_certificate(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state.attempt_service.get_attempt(*id).await?;
    ensure_owner(&attempt, &user)?;

    let certificate = state.certificate_service.find_for_attempt(*id).await?;
    Ok(HttpResponse::Ok().json(certificate))
}
