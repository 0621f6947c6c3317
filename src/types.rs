//! Request and response bodies of the REST API.
//!
//! Responses are built explicitly from repository rows; nothing is serialized
//! by walking relationships.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validator::ValueType;

// Users

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: i64,
    pub created_at: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

// Datas

#[derive(Debug, Clone, Deserialize)]
pub struct DataCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub data_type: String,
}

/// Full replacement of the mutable fields of a data series.
#[derive(Debug, Clone, Deserialize)]
pub struct DataUpdate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreatedByUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub data_type: ValueType,
    pub created_at: String,
    pub created_by_user: CreatedByUser,
}

// Data points

#[derive(Debug, Clone, Deserialize)]
pub struct DataPointCreate {
    /// Optional; must equal the data id in the URL when given.
    #[serde(default)]
    pub data_id: Option<i64>,
    /// Observation time; defaults to now.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataPointResponse {
    pub id: i64,
    pub data_id: i64,
    pub created_at: String,
    pub value: Value,
}

// Metas

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetaCreate {
    pub name: String,
    pub meta_type: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetaUpdate {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetaResponse {
    pub id: i64,
    pub name: String,
    pub meta_type: ValueType,
}

// Data metas

/// Body of both create and update; ids must equal the ones in the URL.
#[derive(Debug, Clone, Deserialize)]
pub struct DataMetaWrite {
    pub data_id: i64,
    pub meta_id: i64,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataMetaResponse {
    pub id: i64,
    pub data_id: i64,
    pub meta_id: i64,
    pub value: Value,
}
