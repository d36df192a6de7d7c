use crate::utils::error::{Result, SplitError};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SplitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SplitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension.to_ascii_lowercase().as_str()) => Ok(()),
        Some(extension) => Err(SplitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(SplitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SplitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Accepts `#RRGGBB` only.
pub fn validate_hex_color(field_name: &str, value: &str) -> Result<()> {
    let digits = value.strip_prefix('#').unwrap_or("");
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SplitError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Expected a color in #RRGGBB form".to_string(),
        });
    }
    Ok(())
}
