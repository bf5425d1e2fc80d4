use tracing::debug;

use crate::dom::document::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPick {
    /// Only the last match (the item directly being replied to).
    Last,
    /// Every match, separated by blank lines (e.g. a mail thread).
    All,
}

/// How to scrape reply context on one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteStrategy {
    /// Domain the strategy applies to, including its subdomains.
    pub domain: String,
    pub context_selector: String,
    pub pick: ContextPick,
    pub character_limit: Option<usize>,
}

impl SiteStrategy {
    pub fn new(domain: &str, context_selector: &str, pick: ContextPick) -> Self {
        Self {
            domain: domain.to_ascii_lowercase(),
            context_selector: context_selector.to_string(),
            pick,
            character_limit: None,
        }
    }

    pub fn with_character_limit(mut self, limit: usize) -> Self {
        self.character_limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteContext {
    pub text: String,
    pub character_limit: Option<usize>,
}

impl SiteContext {
    pub fn context_text(&self) -> Option<&str> {
        let text = self.text.trim();
        if text.is_empty() { None } else { Some(text) }
    }
}

/// Host-specific context scraping, first matching strategy wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteContextExtractor {
    strategies: Vec<SiteStrategy>,
}

impl SiteContextExtractor {
    pub fn new(strategies: Vec<SiteStrategy>) -> Self {
        Self { strategies }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            SiteStrategy::new("twitter.com", "[data-testid=\"tweet\"]", ContextPick::Last)
                .with_character_limit(280),
            SiteStrategy::new("x.com", "[data-testid=\"tweet\"]", ContextPick::Last)
                .with_character_limit(280),
            SiteStrategy::new(
                "reddit.com",
                ".sitetable.nestedlisting .entry .md",
                ContextPick::Last,
            ),
            SiteStrategy::new("mail.google.com", ".h7", ContextPick::All),
        ])
    }

    pub fn strategy_for(&self, current_url: &str) -> Option<&SiteStrategy> {
        let host = hostname(current_url)?;
        self.strategies
            .iter()
            .find(|s| host_matches(&host, &s.domain))
    }

    /// Context for the page at `current_url`; empty when no strategy applies
    /// or nothing matched on the page.
    pub fn extract_context(&self, doc: &Document, current_url: &str) -> SiteContext {
        let Some(strategy) = self.strategy_for(current_url) else {
            return SiteContext::default();
        };

        let matches = doc.query_selector_all(&strategy.context_selector);
        let text = match strategy.pick {
            ContextPick::Last => matches
                .last()
                .map(|n| doc.inner_text(*n).trim().to_string())
                .unwrap_or_default(),
            ContextPick::All => matches
                .iter()
                .map(|n| doc.inner_text(*n).trim().to_string())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
        };

        debug!(domain = %strategy.domain, chars = text.chars().count(), "extracted site context");
        SiteContext {
            text,
            character_limit: strategy.character_limit,
        }
    }
}

impl Default for SiteContextExtractor {
    fn default() -> Self {
        Self::builtin()
    }
}

/// `host` is `domain` or one of its subdomains. Plain substring checks would
/// let `mail.google.com.evil.example` match `mail.google.com`.
pub fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain
        || host
            .strip_suffix(&domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Lowercased host of a URL. A bare hostname is accepted as-is.
pub fn hostname(url: &str) -> Option<String> {
    match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.host_str().map(str::to_ascii_lowercase),
        Err(_) => {
            let bare = url.trim();
            if bare.is_empty() || bare.contains('/') {
                None
            } else {
                Some(bare.to_ascii_lowercase())
            }
        }
    }
}
