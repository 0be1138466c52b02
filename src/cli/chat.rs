use anyhow::Result;
use console::style;

use crate::core::config::AppConfig;
use crate::core::terminal::{self, print_assistant, print_error, print_info};

use super::bootstrap::build_gateway;

pub(crate) fn is_exit(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "exit" | "quit")
}

/// Interactive conversation with the assistant until `exit` or `quit`.
pub async fn run_chat(config: &AppConfig) -> Result<()> {
    terminal::print_banner();
    let gateway = build_gateway(config).await?;

    let conversation = match &config.assistant.thread_id {
        Some(thread_id) => gateway.resume_conversation(thread_id).await?,
        None => gateway.open_conversation().await?,
    };
    print_info(&format!("Conversation {}", conversation.thread_id()));
    println!(
        "  {}\n",
        style("Type 'exit' or 'quit' to leave.").dim()
    );

    loop {
        let input = inquire::Text::new("You:").prompt()?;
        if is_exit(&input) {
            break;
        }
        if input.trim().is_empty() {
            continue;
        }
        match gateway.send_message(&conversation, &input).await {
            Ok(reply) => print_assistant(&reply.response),
            Err(e) => print_error(&e.to_string()),
        }
    }
    Ok(())
}
