//! Request/response bodies for the backend HTTP surface.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One record as returned by `GET /db/{key}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecordResponse {
    pub key: String,
    pub value: String,
}

/// Body of `POST /db/{key}`; echoed back verbatim on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PutRequest {
    pub value: String,
}
