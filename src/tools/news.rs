use reqwest::Client;
use serde::Deserialize;

use super::ProviderError;
use super::http::get_json;

const PAGE_SIZE: u32 = 5;
const REMOVED_TITLE: &str = "[Removed]";

#[derive(Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headlines {
    pub country: String,
    pub category: String,
    pub titles: Vec<String>,
}

impl Headlines {
    pub fn header(&self) -> String {
        format!(
            "Top {} News Headlines in {}:",
            capitalize(&self.category),
            self.country.to_uppercase()
        )
    }

    /// Header line followed by one title per line.
    pub fn render(&self) -> String {
        let mut out = self.header();
        for title in &self.titles {
            out.push('\n');
            out.push_str(title);
        }
        out
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Top-headlines endpoint (newsapi.org style).
pub struct NewsProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsProvider {
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// `None` when the provider has no usable article for this query.
    pub async fn top_headlines(
        &self,
        country: &str,
        category: &str,
    ) -> Result<Option<Headlines>, ProviderError> {
        let page_size = PAGE_SIZE.to_string();
        let request = self.client.get(&self.base_url).query(&[
            ("apiKey", self.api_key.as_str()),
            ("country", country),
            ("category", category),
            ("pageSize", page_size.as_str()),
        ]);
        let body: NewsResponse = get_json("news", request).await?;

        let titles: Vec<String> = body
            .articles
            .into_iter()
            .filter_map(|a| a.title)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && t != REMOVED_TITLE)
            .take(PAGE_SIZE as usize)
            .collect();

        if titles.is_empty() {
            return Ok(None);
        }
        Ok(Some(Headlines {
            country: country.to_string(),
            category: category.to_string(),
            titles,
        }))
    }
}
