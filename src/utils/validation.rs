use crate::utils::error::{AnnotateError, Result};
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> AnnotateError {
    AnnotateError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Only http(s) URLs are accepted; the annotation UI is served over HTTP.
pub fn validate_url(field: &str, url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|e| invalid(field, url, format!("Invalid URL: {}", e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(field, url, format!("Unsupported URL scheme: {}", scheme))),
    }
}

pub fn validate_path(field: &str, path: &Path) -> Result<()> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(invalid(field, text, "Path cannot be empty"));
    }
    if text.contains('\0') {
        return Err(invalid(field, text, "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_positive_number(field: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(field, value, format!("Value must be at least {}", min_value)));
    }
    Ok(())
}

pub fn validate_file_extension(field: &str, file: &Path, allowed: &[&str]) -> Result<()> {
    match file.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if allowed.contains(&ext) => Ok(()),
        Some(ext) => Err(invalid(
            field,
            file.display(),
            format!("Unsupported extension .{} (expected one of: {})", ext, allowed.join(", ")),
        )),
        None => Err(invalid(field, file.display(), "File has no extension")),
    }
}

pub fn validate_non_empty_string(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, value, "Value cannot be empty or whitespace-only"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(field, value, format!("Value must be between {} and {}", min, max)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("access_url", "http://localhost:8000").is_ok());
        assert!(validate_url("access_url", "https://annotate.internal").is_ok());
        assert!(validate_url("access_url", "").is_err());
        assert!(validate_url("access_url", "localhost-8000").is_err());
        assert!(validate_url("access_url", "ftp://localhost:8000").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output", Path::new("data/keyword_annotation.jsonl")).is_ok());
        assert!(validate_path("output", Path::new("")).is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("sample_size", 5, 1).is_ok());
        assert!(validate_positive_number("sample_size", 0, 1).is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        let allowed = ["jsonl", "json", "csv"];
        assert!(validate_file_extension("bio_file", Path::new("bios.csv"), &allowed).is_ok());
        assert!(validate_file_extension("bio_file", Path::new("bios.jsonl"), &allowed).is_ok());
        assert!(validate_file_extension("bio_file", Path::new("bios.txt"), &allowed).is_err());
        assert!(validate_file_extension("bio_file", Path::new("bios"), &allowed).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("port", 8000u16, 1, u16::MAX).is_ok());
        assert!(validate_range("port", 0u16, 1, u16::MAX).is_err());
    }
}
