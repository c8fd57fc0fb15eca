use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use arboard::Clipboard;
use enigo::{Direction, Enigo, Key, Keyboard, Settings};

/// How long the foreign application gets to service a synthetic copy/paste
/// before the clipboard is read back.
const KEY_SETTLE: Duration = Duration::from_millis(120);

/// Capability interface for reading and replacing the active selection of
/// whatever application currently has focus.
pub trait SelectionSource {
    /// Returns the selected text, or None when nothing is selected.
    fn capture(&mut self) -> Result<Option<String>>;

    /// Overwrites the current selection with `text`.
    fn replace(&mut self, text: &str) -> Result<()>;
}

/// Clipboard-based implementation: preserve the clipboard, send a synthetic
/// copy chord, and compare. Must run off the GUI thread since it sleeps
/// around the keystrokes.
pub struct ClipboardSelection {
    clipboard: Clipboard,
    enigo: Enigo,
}

impl ClipboardSelection {
    pub fn new() -> Result<Self> {
        let clipboard = Clipboard::new().map_err(|e| anyhow!("clipboard unavailable: {}", e))?;
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow!("input synthesis unavailable: {}", e))?;
        Ok(ClipboardSelection { clipboard, enigo })
    }

    fn chord(&mut self, key: char) -> Result<()> {
        #[cfg(target_os = "macos")]
        let modifier = Key::Meta;
        #[cfg(not(target_os = "macos"))]
        let modifier = Key::Control;

        self.enigo
            .key(modifier, Direction::Press)
            .map_err(|e| anyhow!("key press failed: {}", e))?;
        let result = self
            .enigo
            .key(Key::Unicode(key), Direction::Click)
            .map_err(|e| anyhow!("key click failed: {}", e));
        self.enigo
            .key(modifier, Direction::Release)
            .map_err(|e| anyhow!("key release failed: {}", e))?;
        result
    }
}

impl SelectionSource for ClipboardSelection {
    fn capture(&mut self) -> Result<Option<String>> {
        let previous = self.clipboard.get_text().unwrap_or_default();

        self.chord('c')?;
        thread::sleep(KEY_SETTLE);

        let selected = self.clipboard.get_text().unwrap_or_default();

        // An unchanged clipboard means the copy found nothing selected.
        if selected.is_empty() || selected == previous {
            return Ok(None);
        }
        Ok(Some(selected))
    }

    fn replace(&mut self, text: &str) -> Result<()> {
        self.clipboard
            .set_text(text.to_string())
            .map_err(|e| anyhow!("clipboard write failed: {}", e))?;
        thread::sleep(KEY_SETTLE);
        self.chord('v')
    }
}

pub fn capture_selection() -> Result<Option<String>> {
    ClipboardSelection::new()?.capture()
}

pub fn replace_selection(text: &str) -> Result<()> {
    ClipboardSelection::new()?.replace(text)
}
