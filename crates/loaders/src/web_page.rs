use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::record::{Metadata, RawRecord, SourceInput};
use crate::{Loader, clean_string};

/// Tags whose text is boilerplate rather than page content.
const UNWANTED_TAGS: [&str; 10] = [
    "nav", "aside", "form", "header", "noscript", "svg", "canvas", "footer", "script", "style",
];

/// Fetches a web page and reduces it to its visible body text.
pub struct WebPageLoader {
    client: reqwest::Client,
}

impl WebPageLoader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for WebPageLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Loader for WebPageLoader {
    async fn load_data(&self, input: &SourceInput) -> Result<Vec<RawRecord>> {
        let SourceInput::Url(url) = input else {
            anyhow::bail!("web page loader expects a url input");
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to fetch web page: {url}"))?
            .error_for_status()
            .with_context(|| format!("web page request rejected: {url}"))?;

        let html = response
            .text()
            .await
            .with_context(|| format!("failed to read web page body: {url}"))?;

        let content = clean_string(&visible_text(&html));
        if content.is_empty() {
            anyhow::bail!("web page content is empty: {url}");
        }

        Ok(vec![RawRecord {
            content,
            metadata: Metadata::for_url(url.clone()),
        }])
    }
}

/// Extract body text, skipping text that lives under boilerplate tags.
fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("static selector");

    let Some(body) = document.select(&body_selector).next() else {
        return String::new();
    };

    let mut out = String::new();
    for node in body.descendants() {
        if let Some(text) = node.value().as_text() {
            let unwanted = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| UNWANTED_TAGS.contains(&element.name()))
            });
            if !unwanted {
                out.push_str(text);
                out.push(' ');
            }
        }
    }
    out
}
