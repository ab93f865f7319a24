// Route exports
pub mod warehouses;

use actix_web::web;

pub use warehouses::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(warehouses::configure),
    );
}
