use actix_multipart::Multipart;
use actix_web::HttpResponse;
use futures_util::StreamExt;
use serde_json::json;

use crate::utils::error::CustomError;
use crate::utils::uploads::{FileUpload, FileValidator, UploadService};

/// Pull the first file field out of a multipart form
async fn extract_file(mut payload: Multipart) -> Result<FileUpload, CustomError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            CustomError::BadRequestError(format!("Error reading multipart field: {}", e))
        })?;

        let content_disposition = match field.content_disposition() {
            Some(cd) => cd,
            None => continue,
        };

        let file_name = content_disposition
            .get_filename()
            .unwrap_or("upload")
            .to_string();
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                CustomError::BadRequestError(format!("Error reading file data: {}", e))
            })?;
            data.extend_from_slice(&chunk);
        }

        return Ok(FileUpload {
            file_name,
            content_type,
            data,
        });
    }

    Err(CustomError::BadRequestError(
        "No file found in request".to_string(),
    ))
}

/// Upload a profile photo
/// POST /upload/profile-photo
pub async fn upload_profile_photo(payload: Multipart) -> Result<HttpResponse, CustomError> {
    let file = extract_file(payload).await?;

    FileValidator::profile_photo().validate(&file)?;

    let upload_service = UploadService::new().map_err(CustomError::InternalServerError)?;

    let uploaded = upload_service
        .upload_image(file.data, &file.file_name, Some("profile_photos"))
        .await
        .map_err(|e| {
            CustomError::InternalServerError(format!("Failed to upload profile photo: {}", e))
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Profile photo uploaded successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "data": {
            "public_id": uploaded.public_id,
            "url": uploaded.url,
            "secure_url": uploaded.secure_url,
            "format": uploaded.format,
            "width": uploaded.width,
            "height": uploaded.height,
            "bytes": uploaded.bytes,
        },
    })))
}
