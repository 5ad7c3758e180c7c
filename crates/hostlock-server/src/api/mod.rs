//! HTTP API routes

pub mod save;

use actix_web::{Scope, web};

/// All API routes under `/api`
pub fn routes() -> Scope {
    web::scope("/api/save")
        .service(save::save_status)
        .service(save::fetch_save)
        .service(save::submit_save)
}
