//! Scores and orders the navigation links of a page.

use crate::inspector::dom::{Document, element_ancestors, squashed_text};
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Links returned by [`LinkRanker::rank`]
pub const MAX_RANKED_LINKS: usize = 10;

static ANCHORS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("Failed to parse anchor selector - this is a bug")
});

static NAV_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(nav|navbar|menu)$").expect("Failed to compile nav class regex - this is a bug")
});

/// A scored same-origin navigation link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedLink {
    pub text: String,
    pub url: String,
    pub score: i32,
}

/// Keyword lists used for scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Words that make a link more likely to be a primary page
    #[serde(default = "default_boost_keywords")]
    pub boost_keywords: Vec<String>,

    /// Words that mark boilerplate pages
    #[serde(default = "default_penalty_keywords")]
    pub penalty_keywords: Vec<String>,
}

fn default_boost_keywords() -> Vec<String> {
    ["about", "services", "products", "contact", "home", "features"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_penalty_keywords() -> Vec<String> {
    ["privacy", "terms", "login", "sign"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            boost_keywords: default_boost_keywords(),
            penalty_keywords: default_penalty_keywords(),
        }
    }
}

/// Link ranker with compiled keyword patterns
#[derive(Debug)]
pub struct LinkRanker {
    boost: Option<Regex>,
    penalty: Option<Regex>,
}

impl Default for LinkRanker {
    fn default() -> Self {
        Self::new(&RankerConfig::default()).expect("Default keyword patterns should be valid")
    }
}

/// Where a link sits in the page chrome
#[derive(Debug, Default, Clone, Copy)]
struct Placement {
    nav: bool,
    header: bool,
    footer: bool,
}

impl Placement {
    fn of(link: ElementRef<'_>) -> Self {
        let mut placement = Self::default();
        for ancestor in element_ancestors(link) {
            let el = ancestor.value();
            match el.name() {
                "nav" => placement.nav = true,
                "header" => placement.header = true,
                "footer" => placement.footer = true,
                _ => {}
            }
            if el.attr("role") == Some("navigation") || el.classes().any(|c| NAV_CLASS.is_match(c))
            {
                placement.nav = true;
            }
        }
        placement
    }

    fn is_navigation_area(&self) -> bool {
        self.nav || self.header || self.footer
    }
}

impl LinkRanker {
    pub fn new(config: &RankerConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            boost: keyword_regex(&config.boost_keywords)?,
            penalty: keyword_regex(&config.penalty_keywords)?,
        })
    }

    /// Same-origin navigation links of `doc`, best first
    ///
    /// Off-origin, fragment-only, `javascript:`, `mailto:` and `tel:` links
    /// and links back to the page itself are dropped before scoring.
    /// Duplicates (ignoring the fragment) keep their first occurrence. Equal
    /// scores keep document order.
    pub fn rank(&self, doc: &Document) -> Vec<RankedLink> {
        let Some(base) = doc.base() else {
            ::log::debug!("Not ranking links of non-absolute page {}", doc.url());
            return Vec::new();
        };
        let current = normalize_url(base);

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for anchor in doc.select(&ANCHORS) {
            let placement = Placement::of(anchor);
            if !placement.is_navigation_area() {
                continue;
            }
            let raw = anchor.value().attr("href").unwrap_or_default().trim();
            let Some(target) = candidate_target(base, raw) else {
                continue;
            };
            if target == current || !seen.insert(target.to_string()) {
                continue;
            }

            let text = squashed_text(anchor);
            let score = self.score(&text, placement);
            links.push(RankedLink {
                text,
                url: target.to_string(),
                score,
            });
        }

        // Vec::sort_by is stable
        links.sort_by(|a, b| b.score.cmp(&a.score));
        links.truncate(MAX_RANKED_LINKS);
        links
    }

    fn score(&self, text: &str, placement: Placement) -> i32 {
        let mut score = 0;
        if self.boost.as_ref().is_some_and(|re| re.is_match(text)) {
            score += 10;
        }
        if self.penalty.as_ref().is_some_and(|re| re.is_match(text)) {
            score -= 5;
        }
        if placement.nav {
            score += 5;
        }
        if placement.header {
            score += 3;
        }
        if placement.footer {
            score -= 3;
        }
        if text.chars().count() < 15 {
            score += 2;
        }
        score
    }
}

/// Case-insensitive "contains any of" pattern, or `None` for an empty list
fn keyword_regex(keywords: &[String]) -> Result<Option<Regex>, regex::Error> {
    if keywords.is_empty() {
        return Ok(None);
    }
    let alternatives: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
    Regex::new(&format!("(?i){}", alternatives.join("|"))).map(Some)
}

/// Absolute, fragment-free target of a navigable same-origin link
fn candidate_target(base: &Url, raw: &str) -> Option<Url> {
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }
    let lowered = raw.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:"].iter().any(|scheme| lowered.starts_with(scheme)) {
        return None;
    }

    let target = base.join(raw).ok()?;
    if target.origin() != base.origin() {
        return None;
    }
    Some(normalize_url(&target))
}

/// The URL without its fragment
pub fn normalize_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized
}

/// Ranks `doc` with the default keyword lists
pub fn rank_navigation_links(doc: &Document) -> Vec<RankedLink> {
    LinkRanker::default().rank(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::dom::PageSnapshot;

    fn rank(html: &str) -> Vec<RankedLink> {
        let doc = Document::parse(&PageSnapshot::new("https://example.com/", html));
        rank_navigation_links(&doc)
    }

    fn texts(links: &[RankedLink]) -> Vec<&str> {
        links.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_penalized_link_ranks_last() {
        let links = rank(
            r#"<nav>
                <a href="/about">About Us</a>
                <a href="/privacy">Privacy Policy</a>
                <a href="/">Home</a>
            </nav>"#,
        );
        // "/" is the current page
        assert_eq!(texts(&links), vec!["About Us", "Privacy Policy"]);

        let links = rank(
            r#"<nav>
                <a href="/home">Home</a>
                <a href="/about">About Us</a>
                <a href="/privacy">Privacy Policy</a>
            </nav>"#,
        );
        assert_eq!(texts(&links), vec!["Home", "About Us", "Privacy Policy"]);
        assert_eq!(links[0].score, 17);
        assert_eq!(links[1].score, 17);
        assert_eq!(links[2].score, 2);
    }

    #[test]
    fn test_ties_keep_document_order() {
        let links = rank(
            r#"<nav>
                <a href="/about">About Us</a>
                <a href="/privacy">Privacy Policy</a>
                <a href="/home">Home</a>
            </nav>"#,
        );
        assert_eq!(texts(&links), vec!["About Us", "Home", "Privacy Policy"]);
    }

    #[test]
    fn test_excludes_non_navigable_links() {
        let links = rank(
            r##"<header>
                <a href="https://other.com/about">About elsewhere</a>
                <a href="#top">Top</a>
                <a href="javascript:void(0)">Menu</a>
                <a href="mailto:hi@example.com">Mail</a>
                <a href="/services">Services</a>
                <a href="/services#pricing">Pricing</a>
            </header>
            <main><a href="/blog">Blog</a></main>"##,
        );
        assert_eq!(texts(&links), vec!["Services"]);
        assert_eq!(links[0].url, "https://example.com/services");
        assert_eq!(links[0].score, 10 + 3 + 2);
    }

    #[test]
    fn test_footer_links_score_lower() {
        let links = rank(
            r#"<footer><a href="/contact">Contact</a></footer>
               <nav class="menu"><a href="/team">Team</a></nav>"#,
        );
        assert_eq!(texts(&links), vec!["Contact", "Team"]);
        assert_eq!(links[0].score, 10 - 3 + 2);
        assert_eq!(links[1].score, 5 + 2);
    }

    #[test]
    fn test_result_is_capped() {
        let items: String = (0..15)
            .map(|i| format!(r#"<a href="/p{i}">Page {i}</a>"#))
            .collect();
        let links = rank(&format!("<nav>{}</nav>", items));
        assert_eq!(links.len(), MAX_RANKED_LINKS);
        assert_eq!(links[0].text, "Page 0");
    }
}
