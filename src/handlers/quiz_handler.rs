use actix_web::{delete, get, post, put, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    identity::CurrentUser,
    models::dto::request::{
        CreateQuestionRequest, CreateQuizRequest, CsvImportRequest, PaginationParams,
    },
    models::dto::response::{MessageResponse, PagedResponse},
    services::import_export_service::{ImportOptions, QuizSnapshot},
};

#[get("/api/health")]
async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    state.db.health_check().await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("ok")))
}

#[post("/api/quizzes")]
async fn create_quiz(
    state: web::Data<AppState>,
    request: web::Json<CreateQuizRequest>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .quiz_service
        .create_quiz(request.into_inner(), &user.id)
        .await?;
    Ok(HttpResponse::Created().json(quiz))
}

#[get("/api/quizzes")]
async fn list_quizzes(
    state: web::Data<AppState>,
    query: web::Query<PaginationParams>,
    _user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    query.validate()?;
    let (items, total) = state
        .quiz_service
        .list_quizzes(query.offset(), query.limit())
        .await?;
    Ok(HttpResponse::Ok().json(PagedResponse { items, total }))
}

#[get("/api/quizzes/{id}")]
async fn get_quiz(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    _user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state.quiz_service.get_quiz(*id).await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[post("/api/quizzes/{id}/publish")]
async fn publish_quiz(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    _user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state.quiz_service.publish_quiz(*id).await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[post("/api/quizzes/{id}/archive")]
async fn archive_quiz(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    _user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state.quiz_service.archive_quiz(*id).await?;
    Ok(HttpResponse::Ok().json(quiz))
}

#[post("/api/quizzes/{id}/questions")]
async fn add_question(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    request: web::Json<CreateQuestionRequest>,
    _user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let question = state
        .quiz_service
        .add_question(*id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(question))
}

#[get("/api/quizzes/{id}/questions")]
async fn list_questions(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    _user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let questions = state.quiz_service.list_questions(*id).await?;
    Ok(HttpResponse::Ok().json(questions))
}

#[put("/api/quizzes/{quiz_id}/questions/{question_id}")]
async fn update_question(
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
    request: web::Json<CreateQuestionRequest>,
    _user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let (quiz_id, question_id) = path.into_inner();
    let question = state
        .quiz_service
        .update_question(quiz_id, question_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(question))
}

#[delete("/api/quizzes/{quiz_id}/questions/{question_id}")]
async fn remove_question(
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
    _user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let (quiz_id, question_id) = path.into_inner();
    state
        .quiz_service
        .remove_question(quiz_id, question_id)
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Question removed")))
}

#[get("/api/quizzes/{id}/export")]
async fn export_quiz(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    _user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let snapshot = state.import_export_service.export_quiz(*id).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

#[post("/api/quizzes/import")]
async fn import_quiz(
    state: web::Data<AppState>,
    snapshot: web::Json<QuizSnapshot>,
    options: web::Query<ImportOptions>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .import_export_service
        .import_quiz(snapshot.into_inner(), options.into_inner(), &user.id)
        .await?;
    Ok(HttpResponse::Created().json(quiz))
}

#[post("/api/quizzes/{id}/questions/csv")]
async fn import_questions_csv(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    request: web::Json<CsvImportRequest>,
    _user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let report = state
        .csv_import_service
        .import_questions(*id, &request.csv)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}
