use crate::storage;
use crate::types::ThemeMode;
use dioxus::prelude::*;

const MODEL_CHOICES: &[&str] = &[
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-2.0-flash",
];

/// Settings panel: theme, Gemini model, and a locally stored API key.
/// Model and key changes take effect on the next exchange.
#[component]
pub fn SettingsView(mut theme: Signal<ThemeMode>, mut show_settings: Signal<bool>) -> Element {
    let mut model = use_signal(|| {
        storage::selected_model().unwrap_or_else(|| MODEL_CHOICES[0].to_string())
    });
    let mut api_key = use_signal(|| storage::gemini_api_key().unwrap_or_default());

    rsx! {
        div { class: "settings-panel",
            div { class: "settings-header",
                h2 { "Settings" }
                button {
                    class: "btn", r#type: "button",
                    onclick: move |_| show_settings.set(false),
                    "Close"
                }
            }

            section { class: "settings-section",
                h3 { "Appearance" }
                div { class: "settings-row",
                    label { "Theme" }
                    {
                        let label = match theme() {
                            ThemeMode::Dark => "Switch to light",
                            ThemeMode::Light => "Switch to dark",
                        };
                        rsx! {
                            button {
                                class: "btn", r#type: "button",
                                onclick: move |_| {
                                    let next = match theme() {
                                        ThemeMode::Dark => ThemeMode::Light,
                                        ThemeMode::Light => ThemeMode::Dark,
                                    };
                                    theme.set(next);
                                },
                                "{label}"
                            }
                        }
                    }
                }
            }

            section { class: "settings-section",
                h3 { "Gemini" }
                div { class: "settings-row",
                    label { "Model" }
                    select {
                        value: "{model}",
                        onchange: move |ev| {
                            let value = ev.value();
                            storage::set_selected_model(&value);
                            model.set(value);
                        },
                        for choice in MODEL_CHOICES.iter() {
                            option { value: "{choice}", selected: model() == *choice, "{choice}" }
                        }
                    }
                }
                div { class: "settings-row",
                    label { "API key" }
                    input {
                        r#type: "password",
                        placeholder: "Stored locally",
                        value: "{api_key}",
                        oninput: move |ev| {
                            let value = ev.value();
                            storage::set_gemini_api_key(&value);
                            api_key.set(value);
                        },
                    }
                }
                p { class: "settings-hint",
                    "The GEMINI_API_KEY environment variable takes precedence over the saved key."
                }
            }
        }
    }
}
