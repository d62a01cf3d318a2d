use axum::{http::StatusCode, Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::request_id::RequestId;

#[derive(Debug, Serialize)]
pub struct DeviceRegistration {
    pub device_id: String,
}

/// Issues a new device id. Nothing is stored until the device first asks
/// for a recommendation.
pub async fn register(
    Extension(request_id): Extension<RequestId>,
) -> (StatusCode, Json<DeviceRegistration>) {
    let device_id = Uuid::new_v4().to_string();

    tracing::info!(request_id = %request_id, device_id = %device_id, "Registered device");

    (StatusCode::CREATED, Json(DeviceRegistration { device_id }))
}
