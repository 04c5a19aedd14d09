pub mod fingerprint;
pub mod thumbnail;
pub mod token;

/// File extension from an uploaded name, lowercased, with a generic binary
/// fallback when the name has no usable suffix.
pub fn get_extension(filename: &str) -> String {
    std::path::Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::get_extension;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(get_extension("IMG_0042.JPG"), "jpg");
    }

    #[test]
    fn missing_extension_defaults_to_bin() {
        assert_eq!(get_extension("holiday-video"), "bin");
        assert_eq!(get_extension(""), "bin");
    }
}
