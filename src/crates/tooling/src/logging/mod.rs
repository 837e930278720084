//! Logging helpers for tracing-based output

use regex::Regex;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Await `future` and log how long it took at debug level
///
/// ```rust,ignore
/// let reply = timed("chat_completion", client.chat(request)).await?;
/// ```
pub async fn timed<F, T>(name: &str, future: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = Instant::now();
    tracing::debug!(operation = name, "started");
    let result = future.await;
    tracing::debug!(operation = name, elapsed = %format_duration(start.elapsed()), "completed");
    result
}

/// ```rust
/// use tooling::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_millis(20)), "20ms");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();
    if micros < 1_000 {
        format!("{micros}μs")
    } else if micros < 1_000_000 {
        format!("{}ms", micros / 1_000)
    } else if micros < 60_000_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m{}s", secs / 60, secs % 60)
    }
}

fn secret_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"(?i)(api[\s_-]?key)\s*[:=]\s*\S+", "$1: [REDACTED]"),
            (r"(?i)(authorization)\s*:\s*bearer\s+\S+", "$1: Bearer [REDACTED]"),
            (r"(?i)(token|secret|password)\s*[:=]\s*\S+", "$1: [REDACTED]"),
            (r"sk-[A-Za-z0-9_-]{8,}", "[REDACTED]"),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
        .collect()
    })
}

/// Redact credentials before a string reaches the logs
///
/// ```rust
/// use tooling::logging::sanitize_for_logging;
///
/// let line = sanitize_for_logging("api-key: abc123 model=gpt-4o");
/// assert!(line.contains("[REDACTED]"));
/// assert!(!line.contains("abc123"));
/// ```
pub fn sanitize_for_logging(input: &str) -> String {
    secret_patterns()
        .iter()
        .fold(input.to_string(), |text, (re, replacement)| {
            re.replace_all(&text, *replacement).into_owned()
        })
}

/// Shorten long payloads for log lines, on a char boundary
pub fn truncate_for_logging(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}… ({} bytes)", &input[..idx], input.len()),
        None => input.to_string(),
    }
}
