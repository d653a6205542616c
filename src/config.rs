use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path, path::PathBuf};
use validator::{Validate, ValidationError};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("File {0} not found")]
    FileNotFound(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Validation errors: {0}")]
    ValidationError(String),

    #[error("Unknown error occurred: {0}")]
    Unknown(String),
}

pub const DEFAULT_TARGET_FILE_NAME: &str = "terraform.tfvars.json";
pub const DEFAULT_MODULE_FOLDER_KEY: &str = "module_folder_path";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(custom = "validate_inputs_file")]
    pub inputs: PathBuf,

    #[validate(length(min = 1, message = "At least one target root is required"))]
    pub roots: Vec<PathBuf>,

    #[serde(default = "default_target_file_name")]
    #[validate(custom = "validate_target_file_name")]
    pub target_file_name: String,

    #[serde(default)]
    #[validate]
    pub module_folder: Option<ModuleFolder>,

    #[serde(default)]
    pub assets: Assets,
}

/// A directory located at run time whose absolute path is written into every
/// property named `key`.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ModuleFolder {
    pub search_root: PathBuf,

    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default = "default_module_folder_key")]
    #[validate(length(min = 1))]
    pub key: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Assets {
    #[serde(default)]
    pub files: Vec<FileAsset>,

    #[serde(default)]
    pub directories: Vec<DirectoryAsset>,
}

/// Text file copied verbatim over every file named `target_name` below the roots.
#[derive(Debug, Serialize, Deserialize)]
pub struct FileAsset {
    pub source: PathBuf,
    pub target_name: String,
}

/// Directory copied into the located module folder, replacing `destination`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DirectoryAsset {
    pub source: PathBuf,
    pub destination: PathBuf,
}

fn default_target_file_name() -> String {
    return String::from(DEFAULT_TARGET_FILE_NAME);
}

fn default_module_folder_key() -> String {
    return String::from(DEFAULT_MODULE_FOLDER_KEY);
}

pub fn parse(path: &Path) -> Result<Config, Error> {
    let contents = match fs::read_to_string(path) {
        Ok(raw_contents) => Ok(raw_contents),
        Err(error) => match error.kind() {
            io::ErrorKind::NotFound => Err(Error::FileNotFound(path.display().to_string())),
            _ => Err(Error::Unknown(error.to_string())),
        },
    }?;

    let config: Config = match serde_yaml::from_str(&contents) {
        Ok(data) => Ok(data),
        Err(error) => Err(Error::ParsingError(error.to_string())),
    }?;

    validate(&config)?;

    return Ok(config);
}

/// Re-checks a config, e.g. after command line overrides were applied.
pub fn validate(config: &Config) -> Result<(), Error> {
    match config.validate() {
        Ok(_) => Ok(()),
        Err(error) => Err(Error::ValidationError(error.to_string())),
    }?;

    for asset in &config.assets.files {
        if asset.target_name.is_empty() {
            return Err(Error::ValidationError(format!(
                "File asset {} has an empty target name",
                asset.source.display()
            )));
        }
    }

    if !config.assets.directories.is_empty() && config.module_folder.is_none() {
        return Err(Error::ValidationError(String::from(
            "Directory assets require `module_folder` to be configured",
        )));
    }

    return Ok(());
}

fn validate_inputs_file(inputs: &PathBuf) -> Result<(), ValidationError> {
    let file_extension = match inputs.extension() {
        Some(extension) => extension,
        None => {
            return Err(ValidationError::new(
                "Unable to parse the extension of the inputs file location",
            ))
        }
    };
    if file_extension != "yaml" && file_extension != "yml" {
        return Err(ValidationError::new(
            "The inputs file location has to end with `.yaml` or `.yml`",
        ));
    }

    return Ok(());
}

fn validate_target_file_name(name: &str) -> Result<(), ValidationError> {
    if name.contains('/') || name.contains('\\') {
        return Err(ValidationError::new(
            "The target file name must not contain a path separator",
        ));
    }
    if !name.ends_with(".json") {
        return Err(ValidationError::new(
            "The target file name has to end with `.json`",
        ));
    }

    return Ok(());
}
