use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::tools::{NO_NEWS, NO_QUOTE, NO_WEATHER, ProviderError, Providers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Quote,
    Weather,
    News,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SectionKind::Quote => "quote",
            SectionKind::Weather => "weather",
            SectionKind::News => "news",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Ready(String),
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub content: SectionContent,
}

impl Section {
    fn from_result(kind: SectionKind, result: Result<Option<String>, ProviderError>, empty: &str) -> Self {
        let content = match result {
            Ok(Some(text)) => SectionContent::Ready(text),
            Ok(None) => SectionContent::Ready(empty.to_string()),
            Err(e) => {
                warn!("Briefing {} section unavailable: {}", kind, e);
                SectionContent::Unavailable(e.to_string())
            }
        };
        Self { kind, content }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            SectionContent::Ready(text) => Some(text),
            SectionContent::Unavailable(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BriefingReport {
    pub sections: Vec<Section>,
}

impl BriefingReport {
    /// Available sections joined by newlines; failed sections are left out.
    pub fn text(&self) -> String {
        self.sections
            .iter()
            .filter_map(Section::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn unavailable(&self) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(|s| matches!(s.content, SectionContent::Unavailable(_)))
    }
}

/// Quote, weather and headlines gathered into one text.
pub struct Briefing {
    providers: Arc<Providers>,
}

impl Briefing {
    pub fn new(providers: Arc<Providers>) -> Self {
        Self { providers }
    }

    pub async fn quote(&self) -> Section {
        let result = self.providers.quote.random().await;
        Section::from_result(SectionKind::Quote, result.map(|q| q.map(|q| q.to_string())), NO_QUOTE)
    }

    pub async fn weather(&self, city: &str) -> Section {
        let result = self.providers.weather.current(city, false).await;
        Section::from_result(
            SectionKind::Weather,
            result.map(|w| w.map(|w| w.to_string())),
            NO_WEATHER,
        )
    }

    pub async fn news(&self, country: &str, category: &str) -> Section {
        let result = self.providers.news.top_headlines(country, category).await;
        Section::from_result(SectionKind::News, result.map(|h| h.map(|h| h.render())), NO_NEWS)
    }

    pub async fn compose(&self, city: &str, country: &str, category: &str) -> BriefingReport {
        let (quote, weather, news) = tokio::join!(
            self.quote(),
            self.weather(city),
            self.news(country, category)
        );
        BriefingReport {
            sections: vec![quote, weather, news],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ProvidersConfig;
    use crate::test_support::serve_mock;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    async fn briefing(app: Router) -> Briefing {
        let base = serve_mock(app).await;
        let config = ProvidersConfig {
            quote_base_url: format!("{}/quote", base),
            news_base_url: format!("{}/news", base),
            weather_base_url: format!("{}/weather", base),
            ..ProvidersConfig::default()
        };
        Briefing::new(Arc::new(Providers::from_config(&config).unwrap()))
    }

    #[tokio::test]
    async fn all_sections_join_in_order() {
        let app = Router::new()
            .route("/quote", get(|| async { Json(json!([{"q": "Begin.", "a": "Anon"}])) }))
            .route(
                "/weather",
                get(|| async {
                    Json(json!({"current": {"temp_c": 3, "humidity": 90, "condition": {"text": "Fog"}}}))
                }),
            )
            .route(
                "/news",
                get(|| async { Json(json!({"articles": [{"title": "Headline"}]})) }),
            );
        let report = briefing(app).await.compose("Riga", "lv", "general").await;
        assert_eq!(
            report.text(),
            "Begin. - Anon\n\
             Weather: Temperature: 3°C, Condition: Fog, Humidity: 90%\n\
             Top General News Headlines in LV:\nHeadline"
        );
        assert_eq!(report.unavailable().count(), 0);
    }

    #[tokio::test]
    async fn failing_provider_does_not_abort_the_others() {
        let app = Router::new()
            .route("/quote", get(|| async { Json(json!([{"q": "Carry on.", "a": "Anon"}])) }))
            .route("/weather", get(|| async { StatusCode::FORBIDDEN }))
            .route("/news", get(|| async { Json(json!({"articles": []})) }));
        let report = briefing(app).await.compose("Riga", "us", "general").await;

        let missing: Vec<_> = report.unavailable().map(|s| s.kind).collect();
        assert_eq!(missing, vec![SectionKind::Weather]);
        assert_eq!(report.text(), format!("Carry on. - Anon\n{}", NO_NEWS));
    }
}
