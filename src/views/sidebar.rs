use crate::api::{ApiClient, ApiError};
use crate::types::ChatSummary;
use crate::ui::refresh_chats;
use dioxus::prelude::*;
use tracing::{error, warn};

/// Chat list, newest first. Selecting an entry switches the main panel;
/// deleting the active chat falls back to the dashboard.
#[component]
pub fn SidebarView(
    chats: Signal<Vec<ChatSummary>>,
    chats_loading: Signal<bool>,
    chats_error: Signal<bool>,
    mut active_chat: Signal<Option<String>>,
    mut show_settings: Signal<bool>,
) -> Element {
    let api = use_signal(ApiClient::from_env);

    let mut delete_chat = move |chat_id: String| {
        let client = api();
        let mut active_chat = active_chat;
        spawn(async move {
            match client.delete_chat(&chat_id).await {
                Ok(()) => {
                    if active_chat().as_deref() == Some(chat_id.as_str()) {
                        active_chat.set(None);
                    }
                }
                Err(ApiError::RouteMissing) => {
                    warn!("backend has no delete route; leaving chat {chat_id} in place");
                }
                Err(ApiError::NotFound) => {
                    // Already gone on the server; just drop it from the list.
                    if active_chat().as_deref() == Some(chat_id.as_str()) {
                        active_chat.set(None);
                    }
                }
                Err(err) => {
                    error!("failed to delete chat {chat_id}: {err}");
                }
            }
            refresh_chats(client, chats, chats_error).await;
        });
    };

    let chats_snapshot = chats();
    let active = active_chat();

    rsx! {
        aside { class: "sidebar",
            div { class: "sidebar-header",
                button {
                    class: "btn btn-primary new-chat-btn", r#type: "button",
                    onclick: move |_| active_chat.set(None),
                    "New chat"
                }
            }
            nav { class: "chat-list",
                if chats_loading() {
                    div { class: "sidebar-note", "Loading chats…" }
                } else if chats_error() {
                    div { class: "sidebar-note error", "Couldn't load chats." }
                } else if chats_snapshot.is_empty() {
                    div { class: "sidebar-note", "No chats yet." }
                }
                for chat in chats_snapshot.iter() {
                    {
                        let id = chat.id.clone();
                        let delete_id = chat.id.clone();
                        let selected = if active.as_deref() == Some(chat.id.as_str()) {
                            " selected"
                        } else {
                            ""
                        };
                        let title = if chat.title.is_empty() {
                            "Untitled chat".to_string()
                        } else {
                            chat.title.clone()
                        };
                        rsx! {
                            div { class: "chat-item{selected}",
                                span {
                                    class: "chat-title",
                                    onclick: move |_| active_chat.set(Some(id.clone())),
                                    "{title}"
                                }
                                button {
                                    class: "chat-delete", r#type: "button", title: "Delete chat",
                                    onclick: move |_| delete_chat(delete_id.clone()),
                                    "×"
                                }
                            }
                        }
                    }
                }
            }
            div { class: "sidebar-footer",
                button {
                    class: "btn settings-btn", r#type: "button",
                    onclick: move |_| show_settings.toggle(),
                    "Settings"
                }
            }
        }
    }
}
