//! Local key/value settings store.
//!
//! Holds the selected Gemini model and a saved API key, the browser-local
//! equivalents of the web client. File-based on native platforms,
//! in-memory on WASM.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;

#[cfg(not(target_arch = "wasm32"))]
use std::{fs, path::PathBuf};

pub const SELECTED_MODEL_KEY: &str = "selected_model";
pub const GEMINI_API_KEY_KEY: &str = "gemini_api_key";

/// In-memory storage for WASM, file-based for native
#[allow(dead_code)]
static SETTINGS: Lazy<Mutex<HashMap<String, String>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Get the settings directory
#[cfg(not(target_arch = "wasm32"))]
fn settings_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("gemchat").join("settings");
    }
    PathBuf::from("cache").join("settings")
}

/// Sanitize storage key for filesystem use
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn storage_get(key: &str) -> Option<String> {
    let file_path = settings_dir().join(format!("{}.json", sanitize_key(key)));
    fs::read_to_string(file_path).ok()
}

#[cfg(target_arch = "wasm32")]
pub fn storage_get(key: &str) -> Option<String> {
    let settings = SETTINGS.lock().ok()?;
    settings.get(key).cloned()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn storage_set(key: &str, value: &str) -> Result<(), String> {
    let dir = settings_dir();
    fs::create_dir_all(&dir).map_err(|e| format!("Failed to create settings directory: {}", e))?;
    let file_path = dir.join(format!("{}.json", sanitize_key(key)));
    fs::write(file_path, value).map_err(|e| format!("Failed to write setting: {}", e))
}

#[cfg(target_arch = "wasm32")]
pub fn storage_set(key: &str, value: &str) -> Result<(), String> {
    let mut settings = SETTINGS.lock().map_err(|e| e.to_string())?;
    settings.insert(key.to_string(), value.to_string());
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn storage_delete(key: &str) -> Result<(), String> {
    let file_path = settings_dir().join(format!("{}.json", sanitize_key(key)));
    if file_path.exists() {
        fs::remove_file(file_path).map_err(|e| format!("Failed to delete setting: {}", e))?;
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
pub fn storage_delete(key: &str) -> Result<(), String> {
    let mut settings = SETTINGS.lock().map_err(|e| e.to_string())?;
    settings.remove(key);
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn storage_keys() -> Vec<String> {
    let dir = settings_dir();
    if !dir.exists() {
        return Vec::new();
    }
    fs::read_dir(dir)
        .ok()
        .map(|entries| {
            entries
                .flatten()
                .filter_map(|entry| {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) == Some("json") {
                        path.file_stem()
                            .and_then(|s| s.to_str())
                            .map(|s| s.to_string())
                    } else {
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(target_arch = "wasm32")]
pub fn storage_keys() -> Vec<String> {
    SETTINGS
        .lock()
        .ok()
        .map(|settings| settings.keys().cloned().collect())
        .unwrap_or_default()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn storage_clear() -> Result<(), String> {
    let dir = settings_dir();
    if dir.exists() {
        fs::remove_dir_all(&dir).map_err(|e| format!("Failed to clear settings: {}", e))?;
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
pub fn storage_clear() -> Result<(), String> {
    let mut settings = SETTINGS.lock().map_err(|e| e.to_string())?;
    settings.clear();
    Ok(())
}

// ---------------
// Typed helpers
// ---------------

pub fn selected_model() -> Option<String> {
    storage_get(SELECTED_MODEL_KEY).filter(|model| !model.is_empty())
}

pub fn set_selected_model(model: &str) {
    if let Err(err) = storage_set(SELECTED_MODEL_KEY, model) {
        tracing::warn!("failed to persist selected model: {err}");
    }
}

pub fn gemini_api_key() -> Option<String> {
    storage_get(GEMINI_API_KEY_KEY).filter(|key| !key.is_empty())
}

pub fn set_gemini_api_key(key: &str) {
    if let Err(err) = storage_set(GEMINI_API_KEY_KEY, key) {
        tracing::warn!("failed to persist API key: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("selected_model"), "selected_model");
        assert_eq!(sanitize_key("user:preferences"), "user_preferences");
    }
}
