use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Debug, Level::Info, Level::Warning, Level::Error];

    pub fn label(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub text: String,
    pub level: Level,
}

static LOG: Lazy<Mutex<VecDeque<Entry>>> = Lazy::new(|| Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)));

pub fn log<T: Into<String>>(line: T) {
    log_with(Level::Info, line);
}

pub fn log_with<T: Into<String>>(level: Level, line: T) {
    if let Ok(mut buf) = LOG.lock() {
        let s = line.into();
        if buf.len() >= MAX_LOG_LINES { buf.pop_front(); }
        buf.push_back(Entry { text: s, level });
    }
}

/// Last `n` entries at or above `min_level`, oldest first.
pub fn recent(n: usize, min_level: Level) -> Vec<Entry> {
    if let Ok(buf) = LOG.lock() {
        let filtered: Vec<Entry> = buf.iter().filter(|e| e.level >= min_level).cloned().collect();
        let len = filtered.len();
        let take = n.min(len);
        filtered.into_iter().skip(len - take).collect()
    } else {
        Vec::new()
    }
}

pub fn clear() {
    if let Ok(mut buf) = LOG.lock() {
        buf.clear();
    }
}

/// Dump the current buffer to logs/scribe-bar-<epoch>.txt and return the path.
pub fn save_to_file() -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all("logs")?;
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let path = PathBuf::from(format!("logs/scribe-bar-{}.txt", now));
    let mut contents = String::new();
    for entry in recent(MAX_LOG_LINES, Level::Debug) {
        contents.push_str(&format!("{} - {}\n", entry.level, entry.text));
    }
    std::fs::write(&path, contents)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    // other test modules log into the same global buffer, so assertions are
    // marker-based rather than exact-count
    #[test]
    fn test_level_filter_and_cap() {
        log_with(Level::Debug, "logbuf-test debug");
        log_with(Level::Warning, "logbuf-test warning");
        log_with(Level::Error, "logbuf-test error");

        let warnings = recent(MAX_LOG_LINES, Level::Warning);
        assert!(warnings.iter().any(|e| e.text == "logbuf-test warning"));
        assert!(warnings.iter().any(|e| e.text == "logbuf-test error"));
        assert!(!warnings.iter().any(|e| e.text == "logbuf-test debug"));

        let everything = recent(MAX_LOG_LINES, Level::Debug);
        assert!(everything.iter().any(|e| e.text == "logbuf-test debug"));

        for i in 0..(MAX_LOG_LINES + 10) {
            log(format!("logbuf-fill {}", i));
        }
        let all = recent(MAX_LOG_LINES * 2, Level::Debug);
        assert!(all.len() <= MAX_LOG_LINES);
        assert!(!all.iter().any(|e| e.text == "logbuf-fill 0"));
        assert!(all
            .iter()
            .any(|e| e.text == format!("logbuf-fill {}", MAX_LOG_LINES + 9)));
    }
}
