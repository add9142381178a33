use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cdnmap_common::warn;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use tokio::sync::watch;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Listens for `q` (or Ctrl-C, which raw mode swallows) on a background
/// thread and flips the stop signal. Raw mode lasts as long as the handle.
pub struct InputHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl InputHandle {
    /// Returns `None` when stdin is not an interactive terminal.
    pub fn start(stop: watch::Sender<bool>) -> Option<Self> {
        if !io::stdin().is_terminal() {
            return None;
        }
        if let Err(e) = enable_raw_mode() {
            warn!("Key listener disabled: {e}");
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let thread = thread::spawn(move || {
            while flag.load(Ordering::Relaxed) {
                match event::poll(POLL_INTERVAL) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(_) => break,
                }
                if let Ok(Event::Key(key)) = event::read() {
                    if is_stop_key(&key) {
                        let _ = stop.send(true);
                        break;
                    }
                }
            }
        });

        Some(Self {
            running,
            thread: Some(thread),
        })
    }
}

fn is_stop_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    let is_q = matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'));
    let is_ctrl_c =
        key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
    is_q || is_ctrl_c
}

impl Drop for InputHandle {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        let _ = disable_raw_mode();
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_stop_keys() {
        let q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);

        assert!(is_stop_key(&q));
        assert!(is_stop_key(&ctrl_c));
        assert!(!is_stop_key(&plain_c));
        assert!(!is_stop_key(&enter));
    }
}
