use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const MAX_SESSIONS: usize = 10;

/// Async session logger that writes timestamped lines to `<home>/logs/latest.log`.
///
/// `log()` only pushes into a channel; a background task does the writing.
/// Call `finish()` before exiting so the tail of the log reaches disk.
pub struct SessionLogger {
    tx: mpsc::UnboundedSender<String>,
    writer: JoinHandle<()>,
}

impl SessionLogger {
    /// Create a new session logger under `home`.
    ///
    /// - Creates `logs/` if it doesn't exist
    /// - Rotates `latest.log` → `session-{timestamp}.log`
    /// - Keeps at most 10 rotated sessions
    ///
    /// Returns `None` when the log can't be opened; logging is never fatal.
    pub async fn new(home: &Path) -> Option<Self> {
        let logs_dir = home.join("logs");

        if tokio::fs::create_dir_all(&logs_dir).await.is_err() {
            return None;
        }

        let latest = logs_dir.join("latest.log");

        if latest.exists() {
            let rotated = rotated_path(&logs_dir, unix_timestamp());
            let _ = tokio::fs::rename(&latest, &rotated).await;
        }

        cleanup_old_sessions(&logs_dir).await;

        let file = match tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&latest)
            .await
        {
            Ok(f) => f,
            Err(_) => return None,
        };

        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let writer = tokio::spawn(writer_task(file, rx));

        let header = format!(
            "=== NEXUS Session — {} ===\n\n",
            format_timestamp(unix_timestamp())
        );
        let _ = tx.send(header);

        Some(Self { tx, writer })
    }

    /// Send a log line. Never blocks.
    pub fn log(&self, prefix: &str, line: &str) {
        let _ = self.tx.send(format_line(unix_timestamp(), prefix, line));
    }

    /// Close the channel and wait for the writer to flush.
    pub async fn finish(self) {
        drop(self.tx);
        let _ = self.writer.await;
    }
}

/// `session-{ts}.log`, or `session-{ts}-{n}.log` when a run in the same
/// second already took that name.
fn rotated_path(logs_dir: &Path, ts: u64) -> PathBuf {
    let first = logs_dir.join(format!("session-{ts}.log"));
    if !first.exists() {
        return first;
    }
    let mut n: u32 = 1;
    loop {
        let candidate = logs_dir.join(format!("session-{ts}-{n}.log"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Chronological key for a rotated log name: (timestamp, collision suffix).
fn session_order(name: &str) -> Option<(u64, u32)> {
    let stem = name.strip_prefix("session-")?.strip_suffix(".log")?;
    match stem.split_once('-') {
        Some((ts, n)) => Some((ts.parse().ok()?, n.parse().ok()?)),
        None => Some((stem.parse().ok()?, 0)),
    }
}

fn format_line(ts: u64, prefix: &str, line: &str) -> String {
    format!("[{}] [{prefix}] {line}\n", format_timestamp(ts))
}

async fn writer_task(file: tokio::fs::File, mut rx: mpsc::UnboundedReceiver<String>) {
    use tokio::io::AsyncWriteExt;
    let mut writer = tokio::io::BufWriter::new(file);

    while let Some(line) = rx.recv().await {
        let _ = writer.write_all(line.as_bytes()).await;
    }

    let footer = format!(
        "\n=== Session ended — {} ===\n",
        format_timestamp(unix_timestamp())
    );
    let _ = writer.write_all(footer.as_bytes()).await;
    let _ = writer.flush().await;
}

fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Format a Unix timestamp as ISO 8601 UTC (e.g. "2025-06-15T10:30:00Z").
fn format_timestamp(secs: u64) -> String {
    let s = secs as i64;

    let sec = s % 60;
    let min = (s / 60) % 60;
    let hour = (s / 3600) % 24;
    let mut days = s / 86400;

    let mut year: i64 = 1970;
    loop {
        let days_in_year = if is_leap(year) { 366 } else { 365 };
        if days < days_in_year {
            break;
        }
        days -= days_in_year;
        year += 1;
    }

    let month_days: [i64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut month: i64 = 1;
    for (i, &base) in month_days.iter().enumerate() {
        let d = if i == 1 && is_leap(year) { base + 1 } else { base };
        if days < d {
            break;
        }
        days -= d;
        month += 1;
    }
    let day = days + 1;

    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{min:02}:{sec:02}Z")
}

fn is_leap(y: i64) -> bool {
    (y % 4 == 0 && y % 100 != 0) || y % 400 == 0
}

/// Keep only the most recent `session-*.log` files.
async fn cleanup_old_sessions(logs_dir: &Path) {
    let mut entries = match tokio::fs::read_dir(logs_dir).await {
        Ok(rd) => rd,
        Err(_) => return,
    };

    let mut session_files: Vec<((u64, u32), PathBuf)> = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        if let Some(order) = session_order(&name.to_string_lossy()) {
            session_files.push((order, entry.path()));
        }
    }

    session_files.sort();

    let excess = session_files.len().saturating_sub(MAX_SESSIONS);
    for (_, oldest) in session_files.iter().take(excess) {
        let _ = tokio::fs::remove_file(oldest).await;
    }
}
