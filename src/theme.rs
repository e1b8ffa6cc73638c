use crate::types::ThemeMode;

pub struct ThemeDefinition {
    pub css: &'static str,
}

pub fn theme_definition(mode: ThemeMode) -> ThemeDefinition {
    match mode {
        ThemeMode::Dark => ThemeDefinition { css: DARK_THEME },
        ThemeMode::Light => ThemeDefinition { css: LIGHT_THEME },
    }
}

const DARK_THEME: &str = r#"
:root {
    --color-bg-primary: #0b0d10;
    --color-bg-secondary: #12151a;
    --color-text-primary: #f4f4f4;
    --color-text-muted: #9aa1ab;
    --color-border: #2a2f38;
    --color-surface-muted: #181c22;
    --color-input-border: #2a2f38;
    --color-input-bg: #0b0d10;
    --color-chat-user-bg: #2b6cb0;
    --color-chat-user-text: #ffffff;
    --color-chat-ai-bg: #181c22;
    --color-chat-ai-text: #f4f4f4;
    --color-timestamp: #6e7681;
    --color-error: #f87171;
}
body { background: var(--color-bg-primary); color: var(--color-text-primary); }
.sidebar { background: var(--color-bg-secondary); border-right: 1px solid var(--color-border); }
.composer textarea { background: var(--color-input-bg); color: var(--color-text-primary); border-color: var(--color-input-border); }
.composer textarea:focus { border-color: var(--color-text-muted); }
"#;

const LIGHT_THEME: &str = r#"
:root {
    --color-bg-primary: #ffffff;
    --color-bg-secondary: #f5f6f8;
    --color-text-primary: #111111;
    --color-text-muted: #5a6068;
    --color-border: #d8dce2;
    --color-surface-muted: #eceef2;
    --color-input-border: #c6cbd3;
    --color-input-bg: #ffffff;
    --color-chat-user-bg: #2b6cb0;
    --color-chat-user-text: #ffffff;
    --color-chat-ai-bg: #f5f6f8;
    --color-chat-ai-text: #111111;
    --color-timestamp: #7a818a;
    --color-error: #b91c1c;
}
body { background: var(--color-bg-primary); color: var(--color-text-primary); }
.sidebar { background: var(--color-bg-secondary); border-right: 1px solid var(--color-border); }
.composer textarea { background: var(--color-input-bg); color: var(--color-text-primary); border-color: var(--color-input-border); }
.composer textarea:focus { border-color: var(--color-text-muted); }
"#;
