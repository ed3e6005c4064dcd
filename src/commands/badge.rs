use std::fmt::Display;

/// Prefixes every line a command prints with `[command-name]\t`, so CI logs show which
/// command wrote what.
#[derive(Debug, Clone, Copy)]
pub struct Badge(pub &'static str);

impl Badge {
    pub fn prefix(&self) -> String {
        format!("[{}]\t", self.0)
    }

    pub fn line(&self, message: impl Display) {
        println!("{}{}", self.prefix(), message);
    }

    pub fn blank(&self) {
        println!("{}", self.prefix());
    }

    /// Print each line of `text`, indented under the badge.
    pub fn block(&self, text: &str) {
        for line in format_block(self, text) {
            println!("{}", line);
        }
    }

    pub fn value(&self, label: &str, value: impl Display) {
        self.line(format!("{}: {}", label, value));
    }
}

fn format_block(badge: &Badge, text: &str) -> Vec<String> {
    text.trim_end()
        .lines()
        .map(|line| format!("{}  {}", badge.prefix(), line))
        .collect()
}
