use reqwest::Client;
use serde::Deserialize;
use std::fmt;

use super::ProviderError;
use super::http::get_json;

#[derive(Deserialize)]
struct ZenQuote {
    q: String,
    a: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub text: String,
    pub author: String,
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.text, self.author)
    }
}

/// Quote-of-the-day endpoint returning `[{"q": ..., "a": ...}]`.
pub struct QuoteProvider {
    client: Client,
    base_url: String,
}

impl QuoteProvider {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub async fn random(&self) -> Result<Option<Quote>, ProviderError> {
        let quotes: Vec<ZenQuote> = get_json("quote", self.client.get(&self.base_url)).await?;
        Ok(quotes.into_iter().next().map(|q| Quote {
            text: q.q.trim().to_string(),
            author: q.a.trim().to_string(),
        }))
    }
}
