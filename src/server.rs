use crate::data::{SolveRequest, SolveResponse};
use crate::error::SolveError;
use crate::schedule;
use crate::solver::HighsBackend;
use axum::{routing::post, Json, Router};

async fn solve_handler(
    Json(request): Json<SolveRequest>,
) -> Result<Json<SolveResponse>, (axum::http::StatusCode, String)> {
    match schedule::solve_timetable(&request, &HighsBackend) {
        Ok(response) => Ok(Json(response)),
        Err(e @ SolveError::Configuration(_)) => {
            Err((axum::http::StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => Err((axum::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

pub async fn run_server() {
    let app = Router::new().route("/v1/timetable/solve", post(solve_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
