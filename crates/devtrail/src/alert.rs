//! Blocking failure notices for the terminal.

use std::sync::atomic::{AtomicBool, Ordering};

use owo_colors::OwoColorize;

use devtrail_core::AlertSink;

/// Prints alerts to stderr and remembers that it did.
#[derive(Debug, Default)]
pub struct StderrAlert {
    color: bool,
    raised: AtomicBool,
}

impl StderrAlert {
    pub fn new(color: bool) -> Self {
        Self {
            color,
            raised: AtomicBool::new(false),
        }
    }

    pub fn raised(&self) -> bool {
        self.raised.load(Ordering::Relaxed)
    }
}

impl AlertSink for StderrAlert {
    fn alert(&self, message: &str) {
        self.raised.store(true, Ordering::Relaxed);
        if self.color {
            eprintln!("{} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("✗ {message}");
        }
    }
}
