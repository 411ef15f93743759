use axum::Router;

use crate::AppState;

pub mod coach;
pub mod health;
pub mod quiz;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(health::router())
                .merge(quiz::router())
                .merge(coach::router()),
        )
        .with_state(state)
}
