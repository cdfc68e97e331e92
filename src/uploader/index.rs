use super::controller::upload_profile_photo;
use actix_web::web;

pub fn upload_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/upload").route("/profile-photo", web::post().to(upload_profile_photo)),
    );
}
