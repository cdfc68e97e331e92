use super::controller::{get_activity, get_user, get_user_posts, get_users, update_user};
use actix_web::web;

pub fn user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::put().to(update_user))
            .route("", web::get().to(get_users))
            .route("/{id}", web::get().to(get_user))
            .route("/{id}/threads", web::get().to(get_user_posts))
            .route("/{id}/activity", web::get().to(get_activity)),
    );
}
