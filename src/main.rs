use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use certa_server::{app_state::AppState, config::Config, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    let host = config.web_server_host.clone();
    let port = config.web_server_port;

    let state = AppState::new(config)
        .await
        .expect("failed to initialize application state");

    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .service(handlers::health_check)
            .service(handlers::create_quiz)
            .service(handlers::list_quizzes)
            .service(handlers::import_quiz)
            .service(handlers::get_quiz)
            .service(handlers::publish_quiz)
            .service(handlers::archive_quiz)
            .service(handlers::add_question)
            .service(handlers::list_questions)
            .service(handlers::update_question)
            .service(handlers::remove_question)
            .service(handlers::export_quiz)
            .service(handlers::import_questions_csv)
            .service(handlers::check_eligibility)
            .service(handlers::start_attempt)
            .service(handlers::submit_attempt)
            .service(handlers::abandon_attempt)
            .service(handlers::expire_attempt)
            .service(handlers::manual_grade)
            .service(handlers::list_my_attempts)
            .service(handlers::get_attempt)
            .service(handlers::get_certificate)
            .service(handlers::quiz_analytics)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
