use axum::Router;

pub mod assets;
pub mod locations;
pub mod parts;
pub mod reports;
pub mod stock;
pub mod system;

/// Router for all actor-authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/stock", stock::router())
        .nest("/assets", assets::router())
        .nest("/parts", parts::router())
        .nest("/locations", locations::router())
        .nest("/reports", reports::router())
}
