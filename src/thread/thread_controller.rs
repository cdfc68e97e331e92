use actix_web::{HttpResponse, web};
use log::debug;
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use crate::thread::thread_model::{
    AddCommentRequest, CreateThreadRequest, DeleteThreadQuery, FetchPostsQuery,
};
use crate::thread::thread_service::ThreadService;
use crate::utils::error::CustomError;
use crate::utils::helpers::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};

/// Create a new top-level thread
/// POST /threads
pub async fn create_thread(
    thread_service: web::Data<ThreadService>,
    body: web::Json<CreateThreadRequest>,
) -> Result<HttpResponse, CustomError> {
    let body = body.into_inner();

    if body.text.trim().is_empty() {
        return Err(CustomError::BadRequestError(
            "Thread text cannot be empty".to_string(),
        ));
    }

    let author = ObjectId::parse_str(&body.author)
        .map_err(|_| CustomError::BadRequestError("Invalid author ID".to_string()))?;

    let thread = thread_service
        .create_thread(body.text, author, body.community_id.as_deref())
        .await?;

    // Cache revalidation of `path` is the caller's concern
    debug!("thread {} created, caller revalidates {}", thread.id.to_hex(), body.path);

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Thread created successfully",
        "httpStatusCode": 201,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "thread_id": thread.id.to_hex(),
    })))
}

/// Paginated top-level posts, newest first
/// GET /threads?page_number=1&page_size=20
pub async fn get_posts(
    thread_service: web::Data<ThreadService>,
    query: web::Query<FetchPostsQuery>,
) -> Result<HttpResponse, CustomError> {
    let query = query.into_inner();

    let page = thread_service
        .fetch_posts(
            query.page_number.map(u64::from).unwrap_or(DEFAULT_PAGE_NUMBER),
            query.page_size.map(i64::from).unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Posts fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "posts": page.posts,
        "is_next": page.is_next,
    })))
}

/// Single thread with two levels of comments
/// GET /threads/{id}
pub async fn get_thread(
    thread_service: web::Data<ThreadService>,
    path: web::Path<String>,
) -> Result<HttpResponse, CustomError> {
    let thread = thread_service.fetch_thread_by_id(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Thread fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "thread": thread,
    })))
}

/// Comment on a thread
/// POST /threads/{id}/comments
pub async fn add_comment(
    thread_service: web::Data<ThreadService>,
    path: web::Path<String>,
    body: web::Json<AddCommentRequest>,
) -> Result<HttpResponse, CustomError> {
    let body = body.into_inner();

    if body.comment_text.trim().is_empty() {
        return Err(CustomError::BadRequestError(
            "Comment text cannot be empty".to_string(),
        ));
    }

    let user_id = ObjectId::parse_str(&body.user_id)
        .map_err(|_| CustomError::BadRequestError("Invalid user ID".to_string()))?;

    let comment = thread_service
        .add_comment_to_thread(&path.into_inner(), body.comment_text, user_id)
        .await?;

    debug!("comment {} created, caller revalidates {}", comment.id.to_hex(), body.path);

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Comment added successfully",
        "httpStatusCode": 201,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "comment_id": comment.id.to_hex(),
    })))
}

/// Delete a thread and all its descendants
/// DELETE /threads/{id}
pub async fn delete_thread(
    thread_service: web::Data<ThreadService>,
    path: web::Path<String>,
    query: web::Query<DeleteThreadQuery>,
) -> Result<HttpResponse, CustomError> {
    let id = path.into_inner();
    thread_service.delete_thread(&id).await?;

    if let Some(revalidate) = &query.path {
        debug!("thread {} deleted, caller revalidates {}", id, revalidate);
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Thread deleted successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
    })))
}
