use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let mut de = serde_json::Deserializer::from_str(src);
    let value = serde_path_to_error::deserialize::<_, T>(&mut de).map_err(into_json_error)?;
    de.end().map_err(trailing_input)?;
    Ok(value)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize::<_, T>(&mut de).map_err(into_json_error)?;
    de.end().map_err(trailing_input)?;
    Ok(value)
}

pub fn from_value_with_path<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(into_json_error)
}

fn into_json_error(err: serde_path_to_error::Error<serde_json::Error>) -> Error {
    Error::Json {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    }
}

fn trailing_input(err: serde_json::Error) -> Error {
    Error::Json {
        path: ".".to_string(),
        message: err.to_string(),
    }
}
