use crate::files;
use crate::types::FileAttachment;
use comrak::plugins::syntect::SyntectAdapter;
use comrak::{ComrakOptions, ComrakPlugins, markdown_to_html_with_plugins};
use dioxus::events::Key;
use dioxus::prelude::*;
use once_cell::sync::Lazy;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing::warn;

static MARKDOWN_OPTIONS: Lazy<ComrakOptions> = Lazy::new(|| {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.footnotes = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.render.unsafe_ = true;
    options
});

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

pub fn markdown_to_html(md: &str) -> String {
    let adapter = SyntectAdapter::new(Some("base16-ocean.dark"));
    let mut plugins = ComrakPlugins::default();
    plugins.render.codefence_syntax_highlighter = Some(&adapter);
    markdown_to_html_with_plugins(md, &MARKDOWN_OPTIONS, &plugins)
}

/// Local wall-clock time for a millisecond timestamp; None for the zero
/// timestamps of legacy history records.
pub fn format_message_timestamp(timestamp_ms: u64) -> Option<String> {
    if timestamp_ms == 0 {
        return None;
    }
    let nanos = (timestamp_ms as i128) * 1_000_000;
    let mut datetime = OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(MESSAGE_TIME_FORMAT).ok()
}

/// Keyboard font stepping, clamped to the readable range.
pub fn adjust_base_font(px: i32, delta: i32) -> i32 {
    (px + delta).clamp(12, 22)
}

pub fn format_file_size(size: u64) -> String {
    if size >= 1024 * 1024 {
        format!("{:.1} MB", size as f64 / (1024.0 * 1024.0))
    } else if size >= 1024 {
        format!("{:.1} KB", size as f64 / 1024.0)
    } else {
        format!("{size} B")
    }
}

/// Message composer shared by the dashboard and the chat view: text input,
/// attachment picking with the encoder limits, and a send control.
#[component]
pub fn Composer(
    mut input: Signal<String>,
    mut attached_files: Signal<Vec<FileAttachment>>,
    mut base_font_px: Signal<i32>,
    disabled: bool,
    on_send: EventHandler<()>,
) -> Element {
    let files_snapshot = attached_files();

    rsx! {
        form { class: "composer",
            if !files_snapshot.is_empty() {
                div { class: "attachment-row",
                    for (i, file) in files_snapshot.iter().enumerate() {
                        span { class: "attachment-chip",
                            "{file.name} ({format_file_size(file.size)})"
                            button {
                                class: "chip-remove", r#type: "button",
                                onclick: move |_| {
                                    attached_files.with_mut(|files| {
                                        if i < files.len() {
                                            files.remove(i);
                                        }
                                    });
                                },
                                "×"
                            }
                        }
                    }
                }
            }
            div { class: "composer-inner",
                textarea {
                    rows: "1", placeholder: "Ask me anything…",
                    value: "{input}", oninput: move |ev| input.set(ev.value()),
                    onkeydown: move |ev| {
                        if ev.modifiers().meta() || ev.modifiers().ctrl() {
                            if ev.key() == Key::Character("+".into()) || ev.key() == Key::Character("=".into()) {
                                ev.prevent_default();
                                base_font_px.set(adjust_base_font(base_font_px(), 1));
                                return;
                            }
                            if ev.key() == Key::Character("-".into()) {
                                ev.prevent_default();
                                base_font_px.set(adjust_base_font(base_font_px(), -1));
                                return;
                            }
                        }
                        if ev.key() == Key::Enter && !ev.modifiers().shift() {
                            ev.prevent_default();
                            on_send.call(());
                        }
                    },
                    disabled: disabled, autofocus: true,
                }
                label { class: "attach-btn",
                    input {
                        r#type: "file", multiple: true, style: "display: none;",
                        onchange: move |ev| {
                            if let Some(file_engine) = ev.files() {
                                spawn(async move {
                                    let slots = files::remaining_slots(
                                        attached_files.with(|files| files.len()),
                                    );
                                    if slots == 0 {
                                        warn!("attachment limit reached");
                                        return;
                                    }
                                    for name in file_engine.files().into_iter().take(slots) {
                                        let Some(bytes) = file_engine.read_file(&name).await
                                        else {
                                            continue;
                                        };
                                        match files::encode_attachment(&name, &bytes, None) {
                                            Ok(file) => {
                                                attached_files.with_mut(|files| files.push(file));
                                            }
                                            Err(err) => {
                                                warn!("skipping attachment {name}: {err}");
                                            }
                                        }
                                    }
                                });
                            }
                        },
                    }
                    "Attach"
                }
                button {
                    class: "btn btn-primary", r#type: "button",
                    disabled: disabled
                        || (input().trim().is_empty() && attached_files().is_empty()),
                    onclick: move |_| on_send.call(()),
                    "Send"
                }
            }
        }
    }
}

/// What clicking a sent attachment's chip can show.
#[derive(Clone, Debug, PartialEq)]
pub enum AttachmentPreview {
    /// Data URL renderable by an `img` tag.
    Image(String),
    /// Plain UTF-8 content.
    Text(String),
    Unavailable,
}

pub fn preview_for(file: &FileAttachment) -> AttachmentPreview {
    match &file.content {
        Some(content) if file.mime_type.starts_with("image/") => {
            AttachmentPreview::Image(content.clone())
        }
        Some(content)
            if file.mime_type.starts_with("text/") || file.mime_type == "application/json" =>
        {
            AttachmentPreview::Text(content.clone())
        }
        _ => AttachmentPreview::Unavailable,
    }
}

/// Chips for files already attached to a sent message; clicking one opens
/// an inline preview for text and image payloads.
#[component]
pub fn FileChips(files: Vec<FileAttachment>) -> Element {
    let mut preview = use_signal(|| Option::<FileAttachment>::None);

    rsx! {
        div { class: "attachment-row sent",
            for file in files.iter() {
                {
                    let label = format!("{} ({})", file.name, format_file_size(file.size));
                    let file = file.clone();
                    rsx! {
                        button {
                            class: "attachment-chip", r#type: "button",
                            onclick: move |_| preview.set(Some(file.clone())),
                            "{label}"
                        }
                    }
                }
            }
        }
        if let Some(file) = preview() {
            div { class: "preview-overlay",
                div { class: "preview-modal",
                    div { class: "preview-header",
                        span { class: "preview-name", "{file.name}" }
                        button {
                            class: "btn", r#type: "button",
                            onclick: move |_| preview.set(None),
                            "Close"
                        }
                    }
                    {
                        match preview_for(&file) {
                            AttachmentPreview::Image(src) => rsx! {
                                img { class: "preview-image", src: "{src}", alt: "{file.name}" }
                            },
                            AttachmentPreview::Text(text) => rsx! {
                                pre { class: "preview-text", "{text}" }
                            },
                            AttachmentPreview::Unavailable => rsx! {
                                p { class: "preview-note", "No preview available for this file type." }
                            },
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sizes_are_humanized() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn zero_timestamp_has_no_display() {
        assert_eq!(format_message_timestamp(0), None);
    }

    #[test]
    fn font_stepping_stays_in_range() {
        assert_eq!(adjust_base_font(14, 1), 15);
        assert_eq!(adjust_base_font(14, -1), 13);
        assert_eq!(adjust_base_font(22, 1), 22);
        assert_eq!(adjust_base_font(12, -1), 12);
    }

    #[test]
    fn markdown_renders_basic_formatting() {
        let html = markdown_to_html("**bold**");
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn preview_follows_payload_kind() {
        let file = |mime: &str, content: Option<&str>| FileAttachment {
            name: "f".into(),
            size: 1,
            mime_type: mime.into(),
            content: content.map(str::to_string),
            last_modified: None,
        };

        assert_eq!(
            preview_for(&file("image/png", Some("data:image/png;base64,AA=="))),
            AttachmentPreview::Image("data:image/png;base64,AA==".into())
        );
        assert_eq!(
            preview_for(&file("text/plain", Some("hello"))),
            AttachmentPreview::Text("hello".into())
        );
        assert_eq!(
            preview_for(&file("application/json", Some("{}"))),
            AttachmentPreview::Text("{}".into())
        );
        assert_eq!(
            preview_for(&file("application/pdf", Some("data:application/pdf;base64,AA=="))),
            AttachmentPreview::Unavailable
        );
        assert_eq!(preview_for(&file("image/png", None)), AttachmentPreview::Unavailable);
    }
}
