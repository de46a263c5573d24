//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category.

pub mod diagnostics;
pub mod filespace;
pub mod social;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::rpc::RpcError;

type Result = std::result::Result<Value, RpcError>;

/// Decode a params object into `T`.
fn parse_params<T: DeserializeOwned>(params: &Value) -> std::result::Result<T, RpcError> {
    serde_json::from_value(params.clone()).map_err(|e| RpcError::invalid_params(&e.to_string()))
}

/// Serialize a handler result.
fn to_value<T: serde::Serialize>(value: &T) -> Result {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&format!("encode: {e}")))
}

fn required_u64(params: &Value, field: &str) -> std::result::Result<u64, RpcError> {
    params
        .get(field)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RpcError::invalid_params(&format!("{field} required")))
}

fn required_str<'a>(params: &'a Value, field: &str) -> std::result::Result<&'a str, RpcError> {
    params
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{field} required")))
}
