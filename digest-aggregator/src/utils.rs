/// Text normalization shared by every source
pub mod text {
    use scraper::Html;

    /// Summary budget, ellipsis included
    pub const SUMMARY_MAX_CHARS: usize = 280;
    pub const SENTENCE_TITLE_MAX_CHARS: usize = 150;
    pub const LINE_TITLE_MAX_CHARS: usize = 100;

    const ELLIPSIS: &str = "...";
    /// A word-boundary cut is only taken past this many chars
    const WORD_CUT_FLOOR: usize = 200;

    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Drop markup, decode entities and collapse whitespace
    pub fn strip_markup(html: &str) -> String {
        let fragment = Html::parse_fragment(html);
        let mut text = String::with_capacity(html.len());
        for piece in fragment.root_element().text() {
            text.push_str(piece);
            text.push(' ');
        }
        collapse_whitespace(&text)
    }

    /// Fit text into the summary budget. Counts chars, not bytes; cuts at the
    /// last space when that keeps more than `WORD_CUT_FLOOR` chars.
    pub fn tweet_truncate(text: &str) -> String {
        if text.chars().count() <= SUMMARY_MAX_CHARS {
            return text.to_string();
        }

        let budget = SUMMARY_MAX_CHARS - ELLIPSIS.len();
        let prefix: Vec<char> = text.chars().take(budget).collect();
        let last_space = prefix.iter().rposition(|c| *c == ' ');

        let kept: String = match last_space {
            Some(pos) if pos > WORD_CUT_FLOOR => prefix[..pos].iter().collect(),
            _ => prefix.iter().collect(),
        };
        format!("{}{}", kept.trim_end(), ELLIPSIS)
    }

    /// Markup-bearing text to display summary
    pub fn summarize(raw: &str) -> String {
        tweet_truncate(&strip_markup(raw))
    }

    /// Plain text to display summary
    pub fn summarize_plain(text: &str) -> String {
        tweet_truncate(&collapse_whitespace(text))
    }

    pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            return text.to_string();
        }

        let budget = max_chars.saturating_sub(ELLIPSIS.len());
        let prefix: String = text.chars().take(budget).collect();
        let kept = match prefix.rfind(char::is_whitespace) {
            Some(idx) if idx > prefix.len() / 2 => &prefix[..idx],
            _ => prefix.as_str(),
        };
        format!("{}{}", kept.trim_end(), ELLIPSIS)
    }

    /// Hard cut by chars, no ellipsis
    pub fn clip(text: &str, max_chars: usize) -> String {
        text.chars().take(max_chars).collect()
    }

    /// Title for free text with no title of its own. Takes the first sentence of
    /// the first non-empty line when there is one, otherwise the line itself.
    pub fn derive_title(text: &str) -> String {
        let first_line = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("");

        match first_sentence(first_line) {
            Some(sentence) => truncate_at_word(sentence, SENTENCE_TITLE_MAX_CHARS),
            None => truncate_at_word(first_line, LINE_TITLE_MAX_CHARS),
        }
    }

    /// Text up to the first terminator followed by whitespace or end of line
    fn first_sentence(line: &str) -> Option<&str> {
        let mut chars = line.char_indices().peekable();
        while let Some((idx, c)) = chars.next() {
            if matches!(c, '.' | '!' | '?') {
                let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
                if at_boundary {
                    return Some(line[..idx + c.len_utf8()].trim());
                }
            }
        }
        None
    }
}

/// URL utilities
pub mod url {
    use url::Url;

    /// Host with any leading `www.` removed
    pub fn extract_domain(url_str: &str) -> Option<String> {
        let url = Url::parse(url_str).ok()?;
        let host = url.host_str()?;
        Some(host.strip_prefix("www.").unwrap_or(host).to_string())
    }

    /// Resolve `href` against the page it was found on
    pub fn make_absolute(base: &Url, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        base.join(href).ok().map(|url| url.to_string())
    }
}

pub mod count {
    /// Parse counters such as `1.2K`, `3M` or `845`
    pub fn parse_shorthand(raw: &str) -> Option<u64> {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if cleaned.is_empty() {
            return None;
        }

        let (number, multiplier) = if let Some(n) = cleaned.strip_suffix('k') {
            (n, 1_000.0)
        } else if let Some(n) = cleaned.strip_suffix('m') {
            (n, 1_000_000.0)
        } else {
            return cleaned.parse::<u64>().ok();
        };

        let value: f64 = number.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some((value * multiplier).round() as u64)
    }
}

/// Time utilities
pub mod time {
    use chrono::{DateTime, Duration, Utc};

    pub const RECENCY_WINDOW_HOURS: i64 = 24;
    /// Upstream clocks may run slightly ahead of ours
    pub const CLOCK_SKEW_MINUTES: i64 = 5;

    pub fn recency_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(RECENCY_WINDOW_HOURS)
    }

    /// True when `posted_at` falls in the trailing window ending at `now`.
    /// Future timestamps beyond the skew allowance are rejected.
    pub fn within_window(posted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        posted_at >= recency_cutoff(now) && posted_at <= now + Duration::minutes(CLOCK_SKEW_MINUTES)
    }

    pub fn from_unix(seconds: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(seconds, 0)
    }
}
