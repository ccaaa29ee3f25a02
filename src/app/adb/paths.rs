pub fn validate_device_path(path: &str) -> Result<(), String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err("device path is required".to_string());
    }
    if !trimmed.starts_with('/') {
        return Err("device path must be absolute and start with '/'".to_string());
    }
    if trimmed.contains('\0') {
        return Err("device path contains invalid characters".to_string());
    }
    if trimmed == "/" {
        return Err("device path must not be root".to_string());
    }
    if trimmed.split('/').any(|segment| segment == "..") {
        return Err("device path must not contain '..' segments".to_string());
    }
    Ok(())
}

/// A destination ending in `/` is a directory: the local file name is appended.
pub fn push_destination(dest: &str, file_name: &str) -> String {
    let dest = dest.trim();
    if dest.ends_with('/') {
        format!("{dest}{file_name}")
    } else {
        dest.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_device_path_requires_absolute() {
        assert!(validate_device_path("").is_err());
        assert!(validate_device_path("sdcard/file.txt").is_err());
        assert!(validate_device_path("/").is_err());
        assert!(validate_device_path("/sdcard/Download/").is_ok());
    }

    #[test]
    fn validate_device_path_blocks_dotdot() {
        assert!(validate_device_path("/sdcard/../etc/passwd").is_err());
        assert!(validate_device_path("/sdcard/..").is_err());
    }

    #[test]
    fn push_destination_appends_name_to_directories() {
        assert_eq!(
            push_destination("/sdcard/Download/", "photo.jpg"),
            "/sdcard/Download/photo.jpg"
        );
        assert_eq!(
            push_destination("/sdcard/renamed.jpg", "photo.jpg"),
            "/sdcard/renamed.jpg"
        );
    }
}
