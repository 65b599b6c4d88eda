use crate::api::error::AppError;

/// Reduces a submitted filename to the name it is stored under.
///
/// Only the final path component is kept, so `../../etc/passwd` lands as
/// `passwd` inside the uploads directory. Anything else passes through
/// verbatim, including spaces and unicode.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or("");

    if name != filename {
        tracing::warn!("Path components stripped from filename: {}", filename);
    }

    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::InvalidFilename(format!(
            "'{}' does not name a file",
            filename
        )));
    }

    if name.contains('\0') {
        return Err(AppError::InvalidFilename(
            "filename contains a NUL byte".to_string(),
        ));
    }

    Ok(name.to_string())
}
