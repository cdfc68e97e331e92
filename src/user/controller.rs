use actix_web::{HttpResponse, web};
use log::debug;
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use crate::user::model::{UpdateUserRequest, UserSearchQuery};
use crate::user::service::UserService;
use crate::utils::error::CustomError;
use crate::utils::helpers::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};

/// Create or update a user profile
/// PUT /users
pub async fn update_user(
    user_service: web::Data<UserService>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, CustomError> {
    let body = body.into_inner();

    let user_id = ObjectId::parse_str(&body.user_id)
        .map_err(|_| CustomError::BadRequestError("Invalid user ID".to_string()))?;

    user_service
        .upsert_user(user_id, body.name, body.username, body.bio, body.image)
        .await?;

    debug!("user {} updated, caller revalidates {}", body.user_id, body.path);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User updated successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
    })))
}

/// Fetch a single user with their communities
/// GET /users/{id}
pub async fn get_user(
    user_service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let user_id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| CustomError::BadRequestError("Invalid user ID".to_string()))?;

    let user = user_service.fetch_user(user_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "user": user,
    })))
}

/// The user's own top-level threads
/// GET /users/{id}/threads
pub async fn get_user_posts(
    user_service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let user_id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| CustomError::BadRequestError("Invalid user ID".to_string()))?;

    let posts = user_service.fetch_user_posts(user_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User posts fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "posts": posts,
    })))
}

/// Replies received on the user's threads
/// GET /users/{id}/activity
pub async fn get_activity(
    user_service: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let user_id = ObjectId::parse_str(path.into_inner())
        .map_err(|_| CustomError::BadRequestError("Invalid user ID".to_string()))?;

    let activity = user_service.get_activity(user_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Activity fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "activity": activity,
    })))
}

/// Paginated user search
/// GET /users?user_id=...&search_string=...&page_number=1&page_size=20
pub async fn get_users(
    user_service: web::Data<UserService>,
    query: web::Query<UserSearchQuery>,
) -> Result<HttpResponse, CustomError> {
    let query = query.into_inner();

    let user_id = ObjectId::parse_str(&query.user_id)
        .map_err(|_| CustomError::BadRequestError("Invalid user ID".to_string()))?;

    let page = user_service
        .fetch_users(
            user_id,
            query.search_string.as_deref().unwrap_or(""),
            query.page_number.map(u64::from).unwrap_or(DEFAULT_PAGE_NUMBER),
            query.page_size.map(i64::from).unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Users fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "users": page.users,
        "is_next": page.is_next,
    })))
}
