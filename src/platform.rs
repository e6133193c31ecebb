//! Platform-specific key bindings

use crossterm::event::KeyModifiers;

/// Modifier for clipboard paste
/// - macOS: SUPER (Cmd key)
/// - Linux/Windows: CONTROL (Ctrl key)
#[cfg(target_os = "macos")]
pub const PASTE_MODIFIER: KeyModifiers = KeyModifiers::SUPER;

#[cfg(not(target_os = "macos"))]
pub const PASTE_MODIFIER: KeyModifiers = KeyModifiers::CONTROL;

/// Paste shortcut display
#[cfg(target_os = "macos")]
pub const PASTE_SHORTCUT: &str = "Cmd+V";

#[cfg(not(target_os = "macos"))]
pub const PASTE_SHORTCUT: &str = "^V";

/// Navigation shortcut displays (Ctrl on every platform)
pub const NEXT_SHORTCUT: &str = "^N";
pub const PREV_SHORTCUT: &str = "^P";
pub const RESUME_SHORTCUT: &str = "^F";
pub const SUBMIT_SHORTCUT: &str = "^S";
