use actix_web::{HttpResponse, web};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use crate::community::model::{
    AddMemberRequest, CommunitySearchQuery, CreateCommunityRequest, UpdateCommunityRequest,
};
use crate::community::service::CommunityService;
use crate::utils::error::CustomError;
use crate::utils::helpers::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};

/// Create a community
/// POST /communities
pub async fn create_community(
    community_service: web::Data<CommunityService>,
    body: web::Json<CreateCommunityRequest>,
) -> Result<HttpResponse, CustomError> {
    let body = body.into_inner();

    let created_by = ObjectId::parse_str(&body.created_by)
        .map_err(|_| CustomError::BadRequestError("Invalid user ID".to_string()))?;

    let community = community_service
        .create_community(body.name, body.username, body.image, body.bio, created_by)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Community created successfully",
        "httpStatusCode": 201,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "community_id": community.id.to_hex(),
    })))
}

/// Paginated community search
/// GET /communities?search_string=...&page_number=1&page_size=20
pub async fn get_communities(
    community_service: web::Data<CommunityService>,
    query: web::Query<CommunitySearchQuery>,
) -> Result<HttpResponse, CustomError> {
    let query = query.into_inner();

    let page = community_service
        .fetch_communities(
            query.search_string.as_deref().unwrap_or(""),
            query.page_number.map(u64::from).unwrap_or(DEFAULT_PAGE_NUMBER),
            query.page_size.map(i64::from).unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Communities fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "communities": page.communities,
        "is_next": page.is_next,
    })))
}

/// Fetch a community with its members
/// GET /communities/{id}
pub async fn get_community(
    community_service: web::Data<CommunityService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let community = community_service
        .fetch_community_details(&path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Community fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "community": community,
    })))
}

/// The community's threads
/// GET /communities/{id}/threads
pub async fn get_community_posts(
    community_service: web::Data<CommunityService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let posts = community_service
        .fetch_community_posts(&path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Community posts fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "posts": posts,
    })))
}

/// Update a community's profile fields
/// PUT /communities/{id}
pub async fn update_community(
    community_service: web::Data<CommunityService>,
    path: web::Path<String>,
    body: web::Json<UpdateCommunityRequest>,
) -> Result<HttpResponse, CustomError> {
    let body = body.into_inner();

    community_service
        .update_community_info(&path.into_inner(), body.name, body.username, body.image)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Community updated successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
    })))
}

/// Add a member
/// POST /communities/{id}/members
pub async fn add_member(
    community_service: web::Data<CommunityService>,
    path: web::Path<String>,
    body: web::Json<AddMemberRequest>,
) -> Result<HttpResponse, CustomError> {
    community_service
        .add_member_to_community(&path.into_inner(), &body.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Member added successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
    })))
}

/// Remove a member
/// DELETE /communities/{id}/members/{user_id}
pub async fn remove_member(
    community_service: web::Data<CommunityService>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, CustomError> {
    let (community_id, user_id) = path.into_inner();

    community_service
        .remove_user_from_community(&user_id, &community_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Member removed successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
    })))
}

/// Delete a community and its threads
/// DELETE /communities/{id}
pub async fn delete_community(
    community_service: web::Data<CommunityService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    community_service.delete_community(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Community deleted successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
    })))
}
