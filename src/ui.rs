use crate::api::ApiClient;
use crate::theme::theme_definition;
use crate::types::{ChatSummary, FirstChatData, ThemeMode};
use crate::views::{ChatView, DashboardView, SettingsView, SidebarView};
use dioxus::prelude::*;
use tracing::error;

const APP_CSS: Asset = asset!("/assets/gemchat.css");

/// Reload the sidebar listing. Errors flip the error flag instead of
/// clearing the list, so a transient failure keeps the last known chats
/// visible.
pub async fn refresh_chats(
    api: ApiClient,
    mut chats: Signal<Vec<ChatSummary>>,
    mut error_flag: Signal<bool>,
) {
    match api.list_chats().await {
        Ok(list) => {
            chats.set(list);
            error_flag.set(false);
        }
        Err(err) => {
            error!("failed to list chats: {err}");
            error_flag.set(true);
        }
    }
}

#[component]
pub fn App() -> Element {
    let chats = use_signal(Vec::<ChatSummary>::new);
    let chats_loading = use_signal(|| true);
    let chats_error = use_signal(|| false);
    let active_chat = use_signal(|| Option::<String>::None);
    let first_chat = use_signal(|| Option::<FirstChatData>::None);
    let theme = use_signal(|| ThemeMode::Dark);
    let base_font_px = use_signal(|| 14i32);
    let show_settings = use_signal(|| false);

    use_future(move || async move {
        let mut chats_loading = chats_loading;
        refresh_chats(ApiClient::from_env(), chats, chats_error).await;
        chats_loading.set(false);
    });

    rsx! {
        ThemeStyles { base_font_px, theme }
        div { class: "app-shell",
            SidebarView {
                chats,
                chats_loading,
                chats_error,
                active_chat,
                show_settings,
            }
            main { class: "main-panel",
                if show_settings() {
                    SettingsView { theme, show_settings }
                } else if let Some(id) = active_chat() {
                    ChatView {
                        key: "{id}",
                        chat_id: id,
                        chats,
                        chats_error,
                        active_chat,
                        first_chat,
                        base_font_px,
                    }
                } else {
                    DashboardView { chats, chats_error, active_chat, first_chat, base_font_px }
                }
            }
        }
    }
}

#[component]
fn ThemeStyles(base_font_px: Signal<i32>, theme: Signal<ThemeMode>) -> Element {
    let root_style = format!(":root {{ font-size: {}px; }}", base_font_px());
    let definition = theme_definition(theme());
    rsx! {
        document::Link { rel: "stylesheet", href: APP_CSS }
        style { dangerous_inner_html: "{root_style}" }
        style { dangerous_inner_html: "{definition.css}" }
    }
}
