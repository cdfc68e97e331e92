use super::thread_controller::{add_comment, create_thread, delete_thread, get_posts, get_thread};
use actix_web::web;

pub fn thread_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/threads")
            .route("", web::post().to(create_thread))
            .route("", web::get().to(get_posts))
            .route("/{id}", web::get().to(get_thread))
            .route("/{id}", web::delete().to(delete_thread))
            .route("/{id}/comments", web::post().to(add_comment)),
    );
}
