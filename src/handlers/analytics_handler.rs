use actix_web::{get, web, HttpResponse};

use crate::{app_state::AppState, errors::AppError, identity::CurrentUser};

#[get("/api/quizzes/{id}/analytics")]
async fn quiz_analytics(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    _user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let analytics = state.analytics_service.quiz_analytics(*id).await?;
    Ok(HttpResponse::Ok().json(analytics))
}
