//! Presentation surfaces for bot and system messages
//!
//! The conversation client renders through the [`PresentationSurface`]
//! trait. [`TerminalSurface`] prints colored output for the interactive
//! chat; [`BufferedSurface`] collects messages for one-shot commands and
//! tests.

use colored::Colorize;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Where bot messages end up
pub trait PresentationSurface: Send + Sync {
    /// Show that the bot is composing a reply
    fn show_typing(&self);

    /// Show a bot message, replacing any typing indicator
    fn show_bot_message(&self, text: &str);

    /// Whether the surface can still render
    ///
    /// Deferred deliveries check this before rendering and are dropped when
    /// it returns `false`.
    fn is_attached(&self) -> bool {
        true
    }
}

/// Colored terminal output
pub struct TerminalSurface {
    attached: AtomicBool,
    typing: AtomicBool,
}

impl TerminalSurface {
    /// Create an attached surface
    pub fn new() -> Self {
        Self {
            attached: AtomicBool::new(true),
            typing: AtomicBool::new(false),
        }
    }

    /// Stop rendering; pending deliveries are discarded
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
        self.clear_typing();
    }

    fn clear_typing(&self) {
        if self.typing.swap(false, Ordering::SeqCst) {
            print!("\r{}\r", " ".repeat(24));
            let _ = std::io::stdout().flush();
        }
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationSurface for TerminalSurface {
    fn show_typing(&self) {
        if !self.is_attached() {
            return;
        }
        self.typing.store(true, Ordering::SeqCst);
        print!("{}", "digitando...".dimmed().italic());
        let _ = std::io::stdout().flush();
    }

    fn show_bot_message(&self, text: &str) {
        if !self.is_attached() {
            return;
        }
        self.clear_typing();
        println!("{} {}\n", "bot>".green().bold(), text);
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

/// Collects bot messages in memory
///
/// # Examples
///
/// ```
/// use leadchat::presentation::{BufferedSurface, PresentationSurface};
///
/// let surface = BufferedSurface::new();
/// surface.show_typing();
/// surface.show_bot_message("Olá!");
/// assert_eq!(surface.messages(), vec!["Olá!".to_string()]);
/// assert_eq!(surface.typing_count(), 1);
/// ```
#[derive(Default)]
pub struct BufferedSurface {
    messages: Mutex<Vec<String>>,
    typing: Mutex<usize>,
    detached: AtomicBool,
}

impl BufferedSurface {
    /// Create an empty, attached surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages shown so far, in display order
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    /// Drain and return the messages shown so far
    pub fn take_messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|mut messages| std::mem::take(&mut *messages))
            .unwrap_or_default()
    }

    /// How many times a typing indicator was shown
    pub fn typing_count(&self) -> usize {
        self.typing.lock().map(|count| *count).unwrap_or_default()
    }

    /// Stop accepting messages
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }
}

impl PresentationSurface for BufferedSurface {
    fn show_typing(&self) {
        if let Ok(mut count) = self.typing.lock() {
            *count += 1;
        }
    }

    fn show_bot_message(&self, text: &str) {
        if !self.is_attached() {
            tracing::debug!("Dropping message for detached surface");
            return;
        }
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(text.to_string());
        }
    }

    fn is_attached(&self) -> bool {
        !self.detached.load(Ordering::SeqCst)
    }
}
