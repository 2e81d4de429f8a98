//! The ordered conditions an auto-redirect has to clear.

use url::Url;

use super::VisitorSignals;
use crate::client::LocaleRules;

const DEFAULT_DOCUMENT: &str = "/index.html";
const HOME_PATH: &str = "/";

/// One precedence-ordered condition of the auto-redirect heuristic.
/// The first gate that fails suppresses the redirect.
#[derive(uniffi::Enum, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Gate {
    /// The user agent is not a known crawler.
    NotCrawler,
    /// The visitor has never picked a locale explicitly.
    NoStoredPreference,
    /// The visitor did not arrive from a search engine result.
    NotSearchReferral,
    /// The visitor landed on the home page.
    HomePath,
    /// The browser language is the target locale.
    LocaleMatch,
}

impl Gate {
    /// Evaluation order.
    pub const ORDER: [Gate; 5] = [
        Gate::NotCrawler,
        Gate::NoStoredPreference,
        Gate::NotSearchReferral,
        Gate::HomePath,
        Gate::LocaleMatch,
    ];

    pub fn passes(&self, signals: &VisitorSignals, rules: &LocaleRules) -> bool {
        match self {
            Gate::NotCrawler => !is_crawler(&signals.user_agent, &rules.crawler_fragments),
            Gate::NoStoredPreference => !signals.has_stored_preference,
            Gate::NotSearchReferral => {
                !is_search_referral(&signals.referrer, &rules.search_engine_fragments)
            }
            Gate::HomePath => normalize_path(&signals.path) == HOME_PATH,
            Gate::LocaleMatch => language_matches(&signals.language, &rules.target_locale),
        }
    }

    /// The first gate in [Gate::ORDER] that fails, if any.
    pub fn first_failing(signals: &VisitorSignals, rules: &LocaleRules) -> Option<Gate> {
        Gate::ORDER
            .into_iter()
            .find(|gate| !gate.passes(signals, rules))
    }
}

pub fn is_crawler(user_agent: &str, fragments: &[String]) -> bool {
    let ua = user_agent.to_lowercase();
    fragments
        .iter()
        .any(|fragment| !fragment.is_empty() && ua.contains(&fragment.to_lowercase()))
}

/// Matches on the referrer's host when it parses as a URL, otherwise on the
/// whole referrer text.
pub fn is_search_referral(referrer: &str, fragments: &[String]) -> bool {
    let referrer = referrer.trim().to_lowercase();
    if referrer.is_empty() {
        return false;
    }

    let host = Url::parse(&referrer)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned));
    let haystack = host.as_deref().unwrap_or(&referrer);

    fragments
        .iter()
        .any(|fragment| contains_domain_fragment(haystack, &fragment.to_lowercase()))
}

/// True if `fragment` followed by a `.` occurs in `haystack` at a word boundary,
/// so `www.google.com` matches `google` but `notgoogle.com` does not.
pub fn contains_domain_fragment(haystack: &str, fragment: &str) -> bool {
    if fragment.is_empty() {
        return false;
    }
    let needle = format!("{fragment}.");
    haystack.match_indices(&needle).any(|(start, _)| {
        haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c))
    })
}

/// Strips a trailing default document, `/docs/index.html` becomes `/docs/`.
pub fn normalize_path(path: &str) -> &str {
    let split = path.len().checked_sub(DEFAULT_DOCUMENT.len());
    match split {
        Some(at)
            if path.is_char_boundary(at) && path[at..].eq_ignore_ascii_case(DEFAULT_DOCUMENT) =>
        {
            &path[..=at]
        }
        _ => path,
    }
}

pub fn language_matches(language: &str, target: &str) -> bool {
    let target = target.trim().to_lowercase();
    !target.is_empty() && language.trim().to_lowercase().starts_with(&target)
}

// ASCII only, like a regex `\b`: `ügoogle.` still starts a word at `g`.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use paste::paste;
    use pretty_assertions::assert_eq;

    use super::*;

    fn rules() -> LocaleRules {
        LocaleRules::default()
    }

    macro_rules! crawler_test {
        ($($name:ident => $ua:literal),* $(,)?) => {
            paste! {
                $(
                    #[test]
                    fn [<detects_crawler_ $name>]() {
                        assert!(is_crawler($ua, &rules().crawler_fragments));
                    }
                )*
            }
        };
    }

    crawler_test! {
        googlebot => "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
        bingbot => "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)",
        yandex => "Mozilla/5.0 (compatible; YandexBot/3.0; +http://yandex.com/bots)",
        duckduckbot => "DuckDuckBot/1.1; (+http://duckduckgo.com/duckduckbot.html)",
        baiduspider => "Mozilla/5.0 (compatible; Baiduspider/2.0; +http://www.baidu.com/search/spider.html)",
        slurp => "Mozilla/5.0 (compatible; Yahoo! Slurp; http://help.yahoo.com/help/us/ysearch/slurp)",
    }

    macro_rules! search_referral_test {
        ($($name:ident => $referrer:literal),* $(,)?) => {
            paste! {
                $(
                    #[test]
                    fn [<detects_search_referral_ $name>]() {
                        assert!(is_search_referral($referrer, &rules().search_engine_fragments));
                    }
                )*
            }
        };
    }

    search_referral_test! {
        google => "https://www.google.com/search?q=x",
        google_country => "https://google.fr/",
        bing => "https://www.bing.com/search?q=elevenmusic",
        yandex => "https://yandex.ru/search/?text=x",
        duckduckgo => "https://duckduckgo.com/",
        uppercase => "HTTPS://WWW.GOOGLE.COM/",
        unparsed => "www.google.com/search",
        non_ascii_prefix => "ügoogle.com/search",
    }

    #[test]
    fn regular_browsers_are_not_crawlers() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15";
        assert!(!is_crawler(ua, &rules().crawler_fragments));
        assert!(!is_crawler("", &rules().crawler_fragments));
    }

    #[test]
    fn other_referrers_are_not_search() {
        let fragments = rules().search_engine_fragments;
        for referrer in [
            "",
            "https://notgoogle.com/",
            "https://example.com/?q=google",
            "https://blog.example.com/google-tips",
            "https://elevenmusic-avis.com/pricing",
        ] {
            assert!(!is_search_referral(referrer, &fragments), "{referrer}");
        }
    }

    #[test]
    fn fragment_needs_boundary_and_dot() {
        assert!(contains_domain_fragment("www.google.com", "google"));
        assert!(contains_domain_fragment("google.com", "google"));
        assert!(!contains_domain_fragment("mygoogle.com", "google"));
        assert!(!contains_domain_fragment("my_google.com", "google"));
        assert!(contains_domain_fragment("égoogle.com", "google"));
        assert!(!contains_domain_fragment("google", "google"));
        assert!(!contains_domain_fragment("google.com", ""));
    }

    #[test]
    fn normalizes_default_document() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/index.html"), "/");
        assert_eq!(normalize_path("/INDEX.HTML"), "/");
        assert_eq!(normalize_path("/docs/index.html"), "/docs/");
        assert_eq!(normalize_path("/pricing"), "/pricing");
        assert_eq!(normalize_path("/index.htm"), "/index.htm");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn language_prefix_is_case_insensitive() {
        assert!(language_matches("en", "en"));
        assert!(language_matches("en-US", "en"));
        assert!(language_matches("EN-gb", "en"));
        assert!(!language_matches("fr-FR", "en"));
        assert!(!language_matches("", "en"));
        assert!(!language_matches("en-US", ""));
    }

    #[test]
    fn reports_first_failing_gate() {
        let signals = VisitorSignals {
            path: "/pricing".into(),
            referrer: "https://www.google.com/".into(),
            user_agent: "Mozilla/5.0".into(),
            language: "fr-FR".into(),
            has_stored_preference: false,
        };
        assert_eq!(
            Gate::first_failing(&signals, &rules()),
            Some(Gate::NotSearchReferral)
        );
    }
}
