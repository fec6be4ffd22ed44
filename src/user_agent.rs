//! User-Agent string for crawl requests.

/// Default User-Agent sent with every request.
///
/// Metadata files are often only served to clients that look like a search
/// engine crawler.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; YandexBot/3.0; +http://yandex.com/bots)";
