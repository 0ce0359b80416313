pub mod confirm_quit;
pub mod editor;
pub mod settings;

pub use confirm_quit::ConfirmQuitScreen;
pub use editor::EditorScreen;
pub use settings::SettingsScreen;
