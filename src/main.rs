/// Defaults bundled into packaged builds that ship without a .env file.
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

#[cfg(not(target_arch = "wasm32"))]
fn load_dotenv() {
    // A .env next to the binary wins (desktop dev)
    if dotenvy::dotenv().is_ok() {
        return;
    }
    load_bundled_config();
}

#[cfg(target_arch = "wasm32")]
fn load_dotenv() {
    load_bundled_config();
}

fn load_bundled_config() {
    for line in BUNDLED_CONFIG.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim();
            // Real environment variables take precedence over bundled ones
            if std::env::var(key).is_err() {
                // SAFETY: set at startup, before any threads are spawned
                unsafe {
                    std::env::set_var(key, value);
                }
            }
        }
    }
}

fn main() {
    load_dotenv();
    tracing_subscriber::fmt::init();
    dioxus::launch(gemchat::ui::App);
}
