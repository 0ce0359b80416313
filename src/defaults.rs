//! Central place for all default values.
//! Update these and the whole app picks them up.

pub struct Defaults;

impl Defaults {

    /* Directories */
    pub const APP_DIR: &'static str = "gpt4overleaf";
    pub const STORAGE_FILE: &'static str = "storage.json";
    pub const CONFIG_FILE: &'static str = "config.toml";
    pub const LOG_DIR: &'static str = "logs";
    pub const LOG_FILE_PREFIX: &'static str = "gpt4overleaf";
    pub const LOG_FILE_SUFFIX: &'static str = "log";
    pub const LOG_FILES_KEPT: usize = 14;
    pub const LOG_LEVEL: &'static str = "info";

    /* Remote API */
    pub const API_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const COMPLETION_MODEL: &'static str = "text-curie-001";
    pub const EDIT_MODEL: &'static str = "code-davinci-edit-001";
    pub const MAX_TOKENS: u32 = 512;
    pub const SAMPLE_COUNT: u32 = 1;
    pub const TEMPERATURE: f32 = 0.5;
    pub const COMPLETION_PROMPT: &'static str =
        "Complete the following text, only outputting the completion and not repeating the original text:";
    pub const EDIT_INSTRUCTION: &'static str =
        "Correct any spelling mistakes, grammar mistakes, and improve the overall style of the (latex) text.";

    /* Shortcuts */
    pub const IMPROVE_CHORD: &'static str = "ctrl+space";
    pub const COMPLETE_CHORD: &'static str = "ctrl+enter";
    pub const REQUIRE_FLAGS: bool = true;
    pub const PLACEHOLDER: &'static str = "…";

    /* Settings sync */
    pub const SYNC_INTERVAL_MS: u64 = 1000;

    /* Editor */
    pub const NOTICE_SECS: u64 = 4;
    pub const TAB: &'static str = "    ";
}
