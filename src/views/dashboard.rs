use crate::api::ApiClient;
use crate::types::{ChatSummary, FirstChatData};
use crate::ui::refresh_chats;
use crate::views::shared::Composer;
use dioxus::prelude::*;
use tracing::error;

/// Landing view: a composer that creates a chat from the first message and
/// hands the message off to the chat view without re-sending it.
#[component]
pub fn DashboardView(
    chats: Signal<Vec<ChatSummary>>,
    chats_error: Signal<bool>,
    active_chat: Signal<Option<String>>,
    first_chat: Signal<Option<FirstChatData>>,
    base_font_px: Signal<i32>,
) -> Element {
    let input = use_signal(String::new);
    let attached_files = use_signal(Vec::new);
    let creating = use_signal(|| false);
    let api = use_signal(ApiClient::from_env);

    let create_chat = move |_| {
        let text = input().trim().to_string();
        let files_now = attached_files();
        if (text.is_empty() && files_now.is_empty()) || creating() {
            return;
        }
        let files = if files_now.is_empty() {
            None
        } else {
            Some(files_now)
        };

        let mut input = input;
        let mut attached_files = attached_files;
        let mut creating = creating;
        let mut first_chat = first_chat;
        let mut active_chat = active_chat;
        creating.set(true);

        let client = api();
        spawn(async move {
            match client.create_chat(&text, files.as_deref()).await {
                Ok(created) => {
                    input.set(String::new());
                    attached_files.set(Vec::new());
                    first_chat.set(Some(FirstChatData {
                        text,
                        files,
                        message_id: created.message_id,
                    }));
                    refresh_chats(client, chats, chats_error).await;
                    active_chat.set(Some(created.id));
                }
                Err(err) => {
                    error!("failed to create chat: {err}");
                }
            }
            creating.set(false);
        });
    };

    rsx! {
        div { class: "dashboard",
            div { class: "welcome-center",
                h1 { "Gemini Chat" }
                p { class: "subtitle", "Start a conversation or attach files to analyze." }
            }
            div { class: "input-wrapper",
                Composer {
                    input,
                    attached_files,
                    base_font_px,
                    disabled: creating(),
                    on_send: create_chat,
                }
            }
        }
    }
}
