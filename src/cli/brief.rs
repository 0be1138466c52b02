use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};

use crate::core::briefing::{Briefing, Section};
use crate::core::config::AppConfig;
use crate::core::speech::{OpenAiSpeech, SpeechSynthesizer};
use crate::core::terminal::{self, print_info, print_spoken, print_step, print_warn};

use super::bootstrap::build_providers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BriefFlags {
    pub city: String,
    pub country: String,
    pub category: String,
    pub out: Option<PathBuf>,
    pub speak: bool,
}

impl Default for BriefFlags {
    fn default() -> Self {
        Self {
            city: "Riga".to_string(),
            country: "us".to_string(),
            category: "general".to_string(),
            out: None,
            speak: true,
        }
    }
}

pub(crate) fn parse_brief_flags(args: &[String], start: usize) -> BriefFlags {
    let mut flags = BriefFlags::default();
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--city" | "--country" | "--category" | "--out" => {
                if i + 1 < args.len() {
                    let value = args[i + 1].clone();
                    match args[i].as_str() {
                        "--city" => flags.city = value,
                        "--country" => flags.country = value,
                        "--category" => flags.category = value,
                        _ => flags.out = Some(PathBuf::from(value)),
                    }
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--no-speech" => {
                flags.speak = false;
                i += 1;
            }
            _ => i += 1,
        }
    }
    flags
}

fn speech_for(config: &AppConfig) -> Result<Option<OpenAiSpeech>> {
    if config.assistant.api_key.trim().is_empty() {
        return Ok(None);
    }
    let speech = OpenAiSpeech::new(
        config.assistant.api_key.clone(),
        config.assistant.base_url.clone(),
        &config.speech,
        config.assistant.request_timeout(),
    )
    .context("building speech HTTP client")?;
    Ok(Some(speech))
}

async fn speak(speech: Option<&OpenAiSpeech>, text: &str, out: &Path) {
    let Some(speech) = speech else {
        print_warn("No API key configured; skipping speech.");
        return;
    };
    match speech.synthesize(text, out).await {
        Ok(()) => print_spoken(&out.display().to_string()),
        Err(e) => print_warn(&format!("Speech failed: {}", e)),
    }
}

/// Gather the daily brief, print it and optionally speak it.
pub async fn run_brief(config: &AppConfig, flags: BriefFlags) -> Result<()> {
    let briefing = Briefing::new(build_providers(config)?);
    print_step(&format!("Preparing your brief for {}", flags.city));

    let report = briefing
        .compose(&flags.city, &flags.country, &flags.category)
        .await;
    for section in report.unavailable() {
        print_warn(&format!("The {} section is unavailable right now.", section.kind));
    }

    let text = report.text();
    if text.is_empty() {
        print_warn("Nothing to report.");
        return Ok(());
    }
    println!("\n{}\n", text);

    if flags.speak {
        let out = flags.out.unwrap_or_else(|| config.speech.output_path.clone());
        speak(speech_for(config)?.as_ref(), &text, &out).await;
    }
    Ok(())
}

fn show(section: &Section) -> Option<String> {
    match section.text() {
        Some(text) => {
            println!("\n{}\n", style(text).bold());
            Some(text.to_string())
        }
        None => {
            print_warn(&format!("The {} service is unavailable right now.", section.kind));
            None
        }
    }
}

const MENU_QUOTE: &str = "Quote of the day";
const MENU_WEATHER: &str = "Weather";
const MENU_NEWS: &str = "News headlines";
const MENU_EXIT: &str = "Exit";

/// One item at a time: pick, hear it, pick again.
pub async fn run_menu(config: &AppConfig) -> Result<()> {
    terminal::print_banner();
    let briefing = Briefing::new(build_providers(config)?);
    let speech = speech_for(config)?;
    let out = config.speech.output_path.clone();

    loop {
        let choice = inquire::Select::new(
            "What would you like to hear?",
            vec![MENU_QUOTE, MENU_WEATHER, MENU_NEWS, MENU_EXIT],
        )
        .prompt()?;

        let section = match choice {
            MENU_QUOTE => briefing.quote().await,
            MENU_WEATHER => {
                let city = inquire::Text::new("City:").with_default("Riga").prompt()?;
                briefing.weather(&city).await
            }
            MENU_NEWS => {
                let country = inquire::Text::new("Country code:")
                    .with_default("us")
                    .prompt()?;
                briefing.news(&country, "general").await
            }
            _ => {
                print_info("Exiting.");
                return Ok(());
            }
        };

        if let Some(text) = show(&section) {
            speak(speech.as_ref(), &text, &out).await;
        }
    }
}
