use super::controller::{
    add_member, create_community, delete_community, get_communities, get_community,
    get_community_posts, remove_member, update_community,
};
use actix_web::web;

pub fn community_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/communities")
            .route("", web::post().to(create_community))
            .route("", web::get().to(get_communities))
            .route("/{id}", web::get().to(get_community))
            .route("/{id}", web::put().to(update_community))
            .route("/{id}", web::delete().to(delete_community))
            .route("/{id}/threads", web::get().to(get_community_posts))
            .route("/{id}/members", web::post().to(add_member))
            .route("/{id}/members/{user_id}", web::delete().to(remove_member)),
    );
}
