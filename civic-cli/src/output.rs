//! Terminal output helpers.

use civic_core::domain::ProcessingStats;
use colored::*;

const BANNER_WIDTH: usize = 55;

#[derive(Debug, Clone, Copy)]
pub enum Tone {
    Green,
    Red,
    Yellow,
    Blue,
    Cyan,
}

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn banner(&self, title: &str) {
        let line = "=".repeat(BANNER_WIDTH);
        println!("{}", self.colorize(&line, Tone::Blue, false));
        println!("  {}", self.colorize(title, Tone::Cyan, true));
        println!("{}", self.colorize(&line, Tone::Blue, false));
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", self.colorize("\u{2713}", Tone::Green, true), message);
    }

    pub fn failure(&self, message: &str) {
        println!("{} {}", self.colorize("\u{2717}", Tone::Red, true), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", self.colorize("\u{26a0}", Tone::Yellow, true), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", self.colorize("\u{2139}", Tone::Blue, true), message);
    }

    /// An indented `label: value` line with the label padded to `width`.
    pub fn field(&self, label: &str, value: &str, width: usize) {
        let padded = format!("{:width$}", format!("{label}:"));
        println!("  {} {}", self.colorize(&padded, Tone::Yellow, false), value);
    }

    pub fn stats(&self, name: &str, stats: &ProcessingStats) {
        self.banner(&format!("Summary: {name}"));
        self.field("Discovered", &stats.discovered.to_string(), 12);
        self.field("Skipped", &stats.skipped.to_string(), 12);
        self.field("Processed", &stats.processed.to_string(), 12);
        self.field("Failed", &stats.failed.to_string(), 12);
        self.field("Quarantined", &stats.quarantined.to_string(), 12);
    }

    pub fn colorize(&self, text: &str, tone: Tone, bold: bool) -> String {
        if !self.colored {
            return text.to_string();
        }
        let colored_text = match tone {
            Tone::Green => text.green(),
            Tone::Red => text.red(),
            Tone::Yellow => text.yellow(),
            Tone::Blue => text.blue(),
            Tone::Cyan => text.cyan(),
        };
        if bold {
            colored_text.bold().to_string()
        } else {
            colored_text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_output_is_untouched() {
        let out = OutputManager::new(false);
        assert_eq!(out.colorize("PASS", Tone::Green, true), "PASS");
    }
}
