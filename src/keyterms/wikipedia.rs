use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::config::EncyclopediaConfig;
use crate::error::{DigestError, Result};
use crate::keyterms::{Article, Encyclopedia};
use crate::nlp::sentences::{RuleTokenizer, SentenceTokenizer};

const SEARCH_RESULTS: usize = 3;
const SUMMARY_SENTENCES: usize = 5;
const TIMEOUT_SECS: u64 = 15;
const USER_AGENT: &str = concat!("ytdigest/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    #[serde(rename = "type", default)]
    kind: String,
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: PageUrl,
}

#[derive(Debug, Deserialize)]
struct PageUrl {
    page: String,
}

fn punctuation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"))
}

/// Wikipedia lookups through the MediaWiki search API and the REST page
/// summary endpoint.
#[derive(Debug)]
pub struct WikipediaClient {
    base: url::Url,
    max_summary_chars: usize,
    tokenizer: RuleTokenizer,
    client: reqwest::blocking::Client,
}

impl WikipediaClient {
    pub fn from_config(config: &EncyclopediaConfig) -> anyhow::Result<Self> {
        let host = if config.language.is_empty() {
            config.endpoint.clone()
        } else {
            format!("{}.{}", config.language, config.endpoint)
        };
        let base = url::Url::parse(&format!("https://{}/", host))
            .map_err(|e| anyhow::anyhow!("Invalid encyclopedia endpoint '{}': {}", host, e))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            base,
            max_summary_chars: config.max_summary_chars,
            tokenizer: RuleTokenizer::default(),
            client,
        })
    }

    fn lookup_error(term: &str, reason: impl Into<String>) -> DigestError {
        DigestError::Encyclopedia {
            term: term.to_string(),
            reason: reason.into(),
        }
    }

    fn search(&self, term: &str) -> Result<Vec<String>> {
        let mut url = self.base.clone();
        url.set_path("w/api.php");
        let limit = SEARCH_RESULTS.to_string();
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("list", "search")
            .append_pair("srsearch", term)
            .append_pair("srlimit", &limit)
            .append_pair("format", "json");

        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::lookup_error(
                term,
                format!("search returned HTTP {}", status.as_u16()),
            ));
        }

        let parsed: SearchResponse = response.json()?;
        Ok(parsed
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    fn page_summary(&self, term: &str, title: &str) -> Result<Option<PageSummary>> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Self::lookup_error(term, "endpoint cannot be a base URL"))?
            .clear()
            .extend(["api", "rest_v1", "page", "summary", title]);

        let response = self.client.get(url).send()?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Self::lookup_error(
                term,
                format!("page summary returned HTTP {}", status.as_u16()),
            ));
        }
        Ok(Some(response.json()?))
    }

    fn to_article(&self, page: PageSummary) -> Article {
        let url = page
            .content_urls
            .map(|urls| urls.desktop.page)
            .unwrap_or_else(|| {
                let mut url = self.base.clone();
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.clear().extend(["wiki", page.title.as_str()]);
                }
                url.to_string()
            });

        Article {
            summary: shorten_summary(&self.tokenizer, &page.extract, self.max_summary_chars),
            title: page.title,
            url,
        }
    }
}

impl Encyclopedia for WikipediaClient {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn lookup(&self, term: &str) -> Result<Option<Article>> {
        let query = clean_term(term);
        if query.is_empty() {
            return Ok(None);
        }

        for title in self.search(&query)? {
            match self.page_summary(term, &title)? {
                Some(page) if page.kind == "disambiguation" => {
                    tracing::debug!("'{}' is a disambiguation page, trying next hit", title);
                }
                Some(page) => return Ok(Some(self.to_article(page))),
                None => {}
            }
        }
        Ok(None)
    }
}

/// Drop punctuation so search queries match article titles.
fn clean_term(term: &str) -> String {
    punctuation_re().replace_all(term, "").trim().to_string()
}

/// First five sentences, then at most `max_chars` characters plus "...".
fn shorten_summary(tokenizer: &dyn SentenceTokenizer, extract: &str, max_chars: usize) -> String {
    let sentences = tokenizer
        .split(extract)
        .unwrap_or_else(|_| vec![extract.trim().to_string()]);
    let short = sentences
        .into_iter()
        .take(SUMMARY_SENTENCES)
        .collect::<Vec<_>>()
        .join(" ");

    if short.chars().count() > max_chars {
        let mut cut: String = short.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    } else {
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_term() {
        assert_eq!(clean_term(" C++ (language) "), "C language");
        assert_eq!(clean_term("Grace Hopper"), "Grace Hopper");
        assert_eq!(clean_term("!!!"), "");
    }

    #[test]
    fn test_shorten_summary_keeps_five_sentences() {
        let extract = "One. Two. Three. Four. Five. Six. Seven.";
        assert_eq!(
            shorten_summary(&RuleTokenizer::default(), extract, 500),
            "One. Two. Three. Four. Five."
        );
    }

    #[test]
    fn test_shorten_summary_truncates_chars() {
        let extract = "a".repeat(600);
        let short = shorten_summary(&RuleTokenizer::default(), &extract, 500);
        assert_eq!(short.chars().count(), 503);
        assert!(short.ends_with("..."));
    }

    #[test]
    fn test_page_summary_parses() {
        let json = r#"{"type":"standard","title":"Grace Hopper","extract":"Grace Hopper was a computer scientist.",
                       "content_urls":{"desktop":{"page":"https://en.wikipedia.org/wiki/Grace_Hopper"}}}"#;
        let page: PageSummary = serde_json::from_str(json).unwrap();
        assert_eq!(page.kind, "standard");

        let client = WikipediaClient::from_config(&EncyclopediaConfig::default()).unwrap();
        let article = client.to_article(page);
        assert_eq!(article.title, "Grace Hopper");
        assert_eq!(article.url, "https://en.wikipedia.org/wiki/Grace_Hopper");
        assert_eq!(article.summary, "Grace Hopper was a computer scientist.");
    }

    #[test]
    fn test_missing_url_is_built_from_title() {
        let page = PageSummary {
            kind: "standard".to_string(),
            title: "Rust".to_string(),
            extract: String::new(),
            content_urls: None,
        };
        let client = WikipediaClient::from_config(&EncyclopediaConfig::default()).unwrap();
        assert_eq!(client.to_article(page).url, "https://en.wikipedia.org/wiki/Rust");
    }

    #[test]
    fn test_search_response_without_query() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"batchcomplete":""}"#).unwrap();
        assert!(parsed.query.is_none());
    }
}
