use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::env;

use crate::utils::error::CustomError;

/// Cloudinary configuration loaded from environment variables
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub upload_preset: Option<String>,
}

impl CloudinaryConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .map_err(|_| "CLOUDINARY_CLOUD_NAME is required")?,
            api_key: env::var("CLOUDINARY_API_KEY")
                .map_err(|_| "CLOUDINARY_API_KEY is required")?,
            api_secret: env::var("CLOUDINARY_API_SECRET")
                .map_err(|_| "CLOUDINARY_API_SECRET is required")?,
            upload_preset: env::var("CLOUDINARY_UPLOAD_PRESET").ok(),
        })
    }

    pub fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        )
    }

    /// Generate a signature for authenticated uploads
    pub fn generate_signature(&self, params: &str, timestamp: i64) -> String {
        let to_sign = format!("{}&timestamp={}{}", params, timestamp, self.api_secret);
        let mut hasher = Sha1::new();
        hasher.update(to_sign.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Response from the Cloudinary upload API
#[derive(Debug, Deserialize, Serialize)]
pub struct CloudinaryUploadResponse {
    pub public_id: String,
    pub format: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bytes: u64,
    pub url: String,
    pub secure_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudinaryError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudinaryErrorResponse {
    pub error: CloudinaryError,
}

/// A file extracted from a multipart request
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Size/content-type checks applied before any upload leaves the process
pub struct FileValidator {
    max_bytes: usize,
    allowed_types: &'static [&'static str],
}

impl FileValidator {
    pub fn profile_photo() -> Self {
        Self {
            max_bytes: 4 * 1024 * 1024,
            allowed_types: &["image/jpeg", "image/png", "image/webp", "image/gif"],
        }
    }

    pub fn validate(&self, file: &FileUpload) -> Result<(), CustomError> {
        if file.data.is_empty() {
            return Err(CustomError::ValidationError(
                "Uploaded file is empty".to_string(),
            ));
        }

        if file.data.len() > self.max_bytes {
            return Err(CustomError::ValidationError(format!(
                "File exceeds the {} byte limit",
                self.max_bytes
            )));
        }

        if !self.allowed_types.contains(&file.content_type.as_str()) {
            return Err(CustomError::ValidationError(format!(
                "Unsupported content type: {}",
                file.content_type
            )));
        }

        Ok(())
    }
}

/// Upload service for Cloudinary
pub struct UploadService {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

impl UploadService {
    pub fn new() -> Result<Self, String> {
        let config = CloudinaryConfig::from_env()?;
        let client = reqwest::Client::new();
        Ok(Self { config, client })
    }

    /// Upload an image to Cloudinary
    pub async fn upload_image(
        &self,
        file_data: Vec<u8>,
        file_name: &str,
        folder: Option<&str>,
    ) -> Result<CloudinaryUploadResponse, String> {
        let timestamp = chrono::Utc::now().timestamp();
        let upload_url = self.config.upload_url();

        // Build signature params
        let mut params = String::new();
        if let Some(f) = folder {
            params.push_str(&format!("folder={}", f));
        }
        if let Some(ref preset) = self.config.upload_preset {
            if !params.is_empty() {
                params.push('&');
            }
            params.push_str(&format!("upload_preset={}", preset));
        }

        let signature = self.config.generate_signature(&params, timestamp);

        let file_part = Part::bytes(file_data)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| format!("Failed to create file part: {}", e))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature);

        if let Some(f) = folder {
            form = form.text("folder", f.to_string());
        }

        if let Some(ref preset) = self.config.upload_preset {
            form = form.text("upload_preset", preset.clone());
        }

        let response = self
            .client
            .post(&upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Failed to send upload request: {}", e))?;

        if response.status().is_success() {
            response
                .json::<CloudinaryUploadResponse>()
                .await
                .map_err(|e| format!("Failed to parse upload response: {}", e))
        } else {
            let error_response = response
                .json::<CloudinaryErrorResponse>()
                .await
                .map_err(|e| format!("Failed to parse error response: {}", e))?;
            Err(format!(
                "Cloudinary upload failed: {}",
                error_response.error.message
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(bytes: usize) -> FileUpload {
        FileUpload {
            file_name: "photo.png".into(),
            content_type: "image/png".into(),
            data: vec![0u8; bytes],
        }
    }

    #[test]
    fn profile_photo_validator_accepts_small_images() {
        assert!(FileValidator::profile_photo().validate(&png(1024)).is_ok());
    }

    #[test]
    fn profile_photo_validator_rejects_bad_input() {
        let validator = FileValidator::profile_photo();

        assert!(validator.validate(&png(0)).is_err());
        assert!(validator.validate(&png(5 * 1024 * 1024)).is_err());

        let mut pdf = png(1024);
        pdf.content_type = "application/pdf".into();
        assert!(validator.validate(&pdf).is_err());
    }

    #[test]
    fn signature_is_stable_for_identical_input() {
        let config = CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            upload_preset: None,
        };
        let a = config.generate_signature("folder=profile_photos", 1700000000);
        let b = config.generate_signature("folder=profile_photos", 1700000000);
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
    }
}
