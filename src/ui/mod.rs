//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - The timed release confirmation

use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::error::Result;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_error, display_partial_release, display_plan, display_status, display_success,
    display_target, display_unfinished_bump, display_warning,
};

/// Default time the operator has to confirm a release
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a timed confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
    TimedOut,
}

/// Source of the operator's go/no-go before a release.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> Result<Confirmation>;
}

/// Asks on the terminal and waits at most `timeout` for an answer.
pub struct TerminalPrompt {
    timeout: Duration,
}

impl TerminalPrompt {
    pub fn new(timeout: Duration) -> Self {
        TerminalPrompt { timeout }
    }
}

impl Confirm for TerminalPrompt {
    fn confirm(&self, prompt: &str) -> Result<Confirmation> {
        print!(
            "\n{} (y/N, {}s to answer): ",
            prompt,
            self.timeout.as_secs()
        );
        io::stdout().flush()?;

        let answer = await_confirmation(io::BufReader::new(io::stdin()), self.timeout);
        if answer == Confirmation::TimedOut {
            println!();
        }
        Ok(answer)
    }
}

/// Read one line from `reader` on a helper thread and classify it.
///
/// Only "y" or "yes" (case-insensitive) confirm. Any other answer, end of
/// input, or a read error declines. If nothing arrives within `timeout` the
/// result is [Confirmation::TimedOut]; the helper thread is left blocked on
/// the reader and dies with the process.
pub fn await_confirmation<R>(reader: R, timeout: Duration) -> Confirmation
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let mut reader = reader;
        let mut line = String::new();
        let answer = match reader.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        };
        // The receiver is gone after a timeout
        let _ = tx.send(answer);
    });

    match rx.recv_timeout(timeout) {
        Ok(Some(line)) => classify(&line),
        Ok(None) => Confirmation::Declined,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            debug!(timeout_secs = timeout.as_secs(), "confirmation timed out");
            Confirmation::TimedOut
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Confirmation::Declined,
    }
}

fn classify(answer: &str) -> Confirmation {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Confirmation::Confirmed,
        _ => Confirmation::Declined,
    }
}
