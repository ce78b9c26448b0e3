//! Heuristic classification of hits that must not be counted.
//!
//! Browsers announce speculative loads through `Purpose`/`Sec-Purpose` and
//! `Sec-Fetch-Mode`; automated clients are recognised by user-agent tokens.
//! This is a best-effort filter, not an access control.

use std::fmt;

/// Lower-case user-agent fragments that mark automated traffic.
pub const BOT_USER_AGENT_TOKENS: [&str; 12] = [
    "bot",
    "spider",
    "crawl",
    "headless",
    "node-fetch",
    "curl",
    "wget",
    "monitor",
    "uptime",
    "lighthouse",
    "vercel",
    "render",
];

/// Header values relevant to classification. Absent headers are `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestSignals<'a> {
    pub user_agent: Option<&'a str>,
    pub purpose: Option<&'a str>,
    pub sec_purpose: Option<&'a str>,
    pub fetch_mode: Option<&'a str>,
}

/// Why a hit was excluded from counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    Prefetch,
    Prerender,
    BotUserAgent(&'static str),
}

impl Exclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exclusion::Prefetch => "prefetch",
            Exclusion::Prerender => "prerender",
            Exclusion::BotUserAgent(_) => "bot",
        }
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::BotUserAgent(token) => write!(f, "bot user-agent ({token})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Decide whether a hit should be excluded. `None` means "count it".
pub fn classify(signals: &RequestSignals<'_>) -> Option<Exclusion> {
    // `Purpose` wins when present and non-empty, otherwise `Sec-Purpose`.
    let purpose = signals
        .purpose
        .filter(|value| !value.is_empty())
        .or(signals.sec_purpose)
        .unwrap_or_default()
        .to_ascii_lowercase();

    if purpose.contains("prefetch") {
        return Some(Exclusion::Prefetch);
    }
    if purpose.contains("prerender") {
        return Some(Exclusion::Prerender);
    }

    let fetch_mode = signals.fetch_mode.unwrap_or_default().to_ascii_lowercase();
    if fetch_mode.contains("prefetch") {
        return Some(Exclusion::Prefetch);
    }

    let user_agent = signals.user_agent.unwrap_or_default().to_lowercase();
    BOT_USER_AGENT_TOKENS
        .iter()
        .copied()
        .find(|token| user_agent.contains(token))
        .map(Exclusion::BotUserAgent)
}
