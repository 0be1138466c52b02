use reqwest::Client;
use serde::Deserialize;
use std::fmt;

use super::ProviderError;
use super::http::get_json;

#[derive(Deserialize)]
struct WeatherResponse {
    current: Option<Current>,
}

#[derive(Deserialize)]
struct Current {
    temp_c: f64,
    humidity: f64,
    condition: Condition,
}

#[derive(Deserialize)]
struct Condition {
    text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub temp_c: f64,
    pub condition: String,
    pub humidity: f64,
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Weather: Temperature: {}°C, Condition: {}, Humidity: {}%",
            self.temp_c, self.condition, self.humidity
        )
    }
}

/// Current-conditions endpoint (weatherapi.com style).
pub struct WeatherProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherProvider {
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    pub async fn current(
        &self,
        city: &str,
        air_quality: bool,
    ) -> Result<Option<WeatherReport>, ProviderError> {
        let request = self.client.get(&self.base_url).query(&[
            ("key", self.api_key.as_str()),
            ("q", city),
            ("aqi", if air_quality { "yes" } else { "no" }),
        ]);
        let body: WeatherResponse = get_json("weather", request).await?;
        Ok(body.current.map(|c| WeatherReport {
            temp_c: c.temp_c,
            condition: c.condition.text,
            humidity: c.humidity,
        }))
    }
}
