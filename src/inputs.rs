use std::{fs, io, path::Path};

use serde_json::Value;

use crate::document::OverrideMap;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Inputs file {0} not found")]
    FileNotFound(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Inputs file {0} must contain a mapping at the top level")]
    NotAMapping(String),

    #[error("Unknown error occurred: {0}")]
    Unknown(String),
}

/// Reads the YAML inputs file into an [`OverrideMap`].
pub fn load(path: &Path) -> Result<OverrideMap, Error> {
    let contents = match fs::read_to_string(path) {
        Ok(raw_contents) => Ok(raw_contents),
        Err(error) => match error.kind() {
            io::ErrorKind::NotFound => Err(Error::FileNotFound(path.display().to_string())),
            _ => Err(Error::Unknown(error.to_string())),
        },
    }?;

    return from_yaml(&contents).map_err(|error| match error {
        Error::NotAMapping(_) => Error::NotAMapping(path.display().to_string()),
        other => other,
    });
}

pub fn from_yaml(contents: &str) -> Result<OverrideMap, Error> {
    // Straight into the JSON tree so integers wider than 64 bits survive.
    let document: Value = match serde_yaml::from_str(contents) {
        Ok(data) => Ok(data),
        Err(error) => Err(Error::ParsingError(error.to_string())),
    }?;

    return match document {
        // An empty file parses as null; treat it as "no overrides".
        Value::Null => Ok(OverrideMap::default()),
        Value::Object(map) => Ok(OverrideMap::from(map)),
        _ => Err(Error::NotAMapping(String::from("<inline>"))),
    };
}
