//! Message formatting for the monitoring bot.

use chrono::{DateTime, Utc};

const USER_AGENT_LIMIT: usize = 120;

/// Escape text for MarkdownV2. Applied to every interpolated value;
/// literal formatting stays in the surrounding template.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '='
                | '|' | '{' | '}' | '.' | '!'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push('…');
    out
}

fn status_emoji(status: u16) -> &'static str {
    match status {
        200..=299 => "✅",
        300..=399 => "↪️",
        400..=499 => "⚠️",
        _ => "❌",
    }
}

/// Paths too noisy to report per-request.
pub fn is_noise_path(path: &str) -> bool {
    path.ends_with("/health") || path == "/favicon.ico" || path == "/robots.txt"
}

/// One request-log line for the monitoring chat.
pub fn format_request_line(
    method: &str,
    path: &str,
    status: u16,
    duration_ms: u128,
    client_ip: &str,
    role: &str,
    user_agent: &str,
) -> String {
    format!(
        "{} `{}` {} → {} \\({}ms\\)\n👤 {} \\| 🌐 {}\n🧭 {}",
        status_emoji(status),
        escape_markdown(method),
        escape_markdown(path),
        status,
        duration_ms,
        escape_markdown(role),
        escape_markdown(client_ip),
        escape_markdown(&truncate(user_agent, USER_AGENT_LIMIT)),
    )
}

pub fn format_uptime(started_at: DateTime<Utc>) -> String {
    let elapsed = Utc::now().signed_duration_since(started_at);
    let days = elapsed.num_days();
    let hours = elapsed.num_hours() % 24;
    let minutes = elapsed.num_minutes() % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn markdown_special_chars_escaped() {
        assert_eq!(escape_markdown("a.b-c_d"), "a\\.b\\-c\\_d");
        assert_eq!(escape_markdown("plain"), "plain");
    }

    #[test]
    fn truncate_adds_ellipsis_only_when_cut() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hello…");
    }

    #[test]
    fn noise_paths_skipped() {
        assert!(is_noise_path("/api/v1/health"));
        assert!(is_noise_path("/favicon.ico"));
        assert!(!is_noise_path("/api/v1/login"));
    }

    #[test]
    fn request_line_shape() {
        let line = format_request_line(
            "POST",
            "/api/v1/login",
            401,
            12,
            "10.0.0.1",
            "anonymous",
            "curl/8.0",
        );
        assert!(line.starts_with("⚠️"));
        assert!(line.contains("401"));
        assert!(line.contains("10\\.0\\.0\\.1"));
    }

    #[test]
    fn request_line_is_valid_markdown_v2() {
        let line = format_request_line(
            "GET",
            "/api/v1/news/getall?page=2",
            200,
            42,
            "203.0.113.7",
            "guest",
            "Mozilla/5.0 (X11; Linux x86_64)",
        );

        // Every reserved character outside a code span must be escaped,
        // otherwise Telegram rejects the whole message.
        const RESERVED: &[char] = &[
            '_', '*', '[', ']', '(', ')', '~', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
        ];
        let mut escaped = false;
        let mut in_code = false;
        for c in line.chars() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '`' => in_code = !in_code,
                _ if !in_code && RESERVED.contains(&c) => {
                    panic!("unescaped {c:?} in {line:?}")
                }
                _ => {}
            }
        }
    }

    #[test]
    fn uptime_units() {
        let now = Utc::now();
        assert_eq!(format_uptime(now - Duration::minutes(5)), "5m");
        assert_eq!(format_uptime(now - Duration::hours(3)), "3h 0m");
        assert!(format_uptime(now - Duration::days(2)).starts_with("2d"));
    }
}
