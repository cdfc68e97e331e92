use crate::community::index::community_routes;
use crate::thread::thread_index::thread_routes;
use crate::uploader::index::upload_routes;
use crate::user::index::user_routes;
use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(thread_routes);
    cfg.configure(user_routes);
    cfg.configure(community_routes);
    cfg.configure(upload_routes);
}
