/// Get environment variable with STALLBOARD_ prefix, falling back to the
/// unprefixed version
///
/// Checks `STALLBOARD_{key}` first, then `{key}` for compatibility with
/// standard environment variable naming.
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("STALLBOARD_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}
