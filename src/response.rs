use axum::extract::FromRequest;
use serde::Serialize;

use crate::error::AppError;

/// `Json` extractor whose rejections render as the JSON error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Success envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: &'static str, data: T) -> axum::Json<Self> {
        axum::Json(Self {
            success: true,
            message,
            data,
        })
    }
}
