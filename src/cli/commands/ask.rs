//! Ask command implementation.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::llm::context::render_system_message;
use crate::llm::{ChatMessage, ContextLoader, LlmClient, StreamEvent, APOLOGY_MESSAGE};
use anyhow::Result;
use std::io::Write;

/// Run the ask command.
pub async fn run_ask(question: &str, stream: bool, settings: Settings) -> Result<()> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let client = LlmClient::new(settings.llm.clone())?;
    let context = ContextLoader::from_settings(&settings, &prompts).load().await;

    let messages = vec![
        render_system_message(&prompts, &context, question),
        ChatMessage::user(question),
    ];

    if stream {
        let mut failure = None;
        let mut stdout = std::io::stdout();
        println!();
        client
            .chat_stream(&messages, |event| match event {
                StreamEvent::Fragment(text) => {
                    print!("{}", text);
                    stdout.flush().ok();
                }
                StreamEvent::Done => println!("\n"),
                StreamEvent::Error(message) => failure = Some(message),
            })
            .await;

        if let Some(message) = failure {
            println!("{}\n", APOLOGY_MESSAGE);
            return Err(anyhow::anyhow!(message));
        }
        return Ok(());
    }

    let spinner = Output::spinner("Consulting The Griot...");
    let result = client.chat(&messages).await;
    spinner.finish_and_clear();

    match result {
        Ok(reply) => {
            println!("\n{}\n", reply.content);
            Ok(())
        }
        Err(e) => {
            println!("\n{}\n", APOLOGY_MESSAGE);
            Err(e.into())
        }
    }
}
