use crate::utils::error::{LabelError, Result};
use std::collections::HashSet;
use std::path::Path;

pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods", "csv"];
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LabelError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LabelError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_existing_file(field_name: &str, path: &str) -> Result<()> {
    validate_path(field_name, path)?;
    if !Path::new(path).is_file() {
        return Err(LabelError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
    {
        Some(extension) if allowed_set.contains(extension.as_str()) => Ok(()),
        Some(extension) => Err(LabelError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(LabelError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_distinct_paths(field_name: &str, input: &str, output: &str) -> Result<()> {
    if Path::new(input) == Path::new(output) {
        return Err(LabelError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: output.to_string(),
            reason: "Output would overwrite the input file".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LabelError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}
