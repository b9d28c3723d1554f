//! Interactive chat command.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::llm::context::render_system_message;
use crate::llm::{ContextLoader, Conversation, LlmClient, StreamEvent, APOLOGY_MESSAGE};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> Result<()> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let client = LlmClient::new(settings.llm.clone())?;
    let loader = ContextLoader::from_settings(&settings, &prompts);
    let context = loader.load().await;

    let mut conversation = Conversation::new();

    println!("\n{}", style("The Griot").bold().cyan());
    println!("{}", style(client.provider().to_string()).dim());
    println!(
        "{}\n",
        style("Ask about the stories in the collection, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            conversation.clear();
            Output::info("Conversation history cleared.");
            continue;
        }

        conversation.push_user(input);
        let messages = conversation.request(render_system_message(&prompts, &context, input));
        debug!("Sending {} messages", messages.len());

        conversation.begin_assistant();
        print!("\n{} ", style("Griot:").cyan().bold());
        stdout.flush()?;

        client
            .chat_stream(&messages, |event| {
                match &event {
                    StreamEvent::Fragment(text) => print!("{}", text),
                    StreamEvent::Done => {}
                    StreamEvent::Error(message) => {
                        debug!("Stream error: {}", message);
                        print!("{}", APOLOGY_MESSAGE);
                    }
                }
                io::stdout().flush().ok();
                conversation.apply(&event);
            })
            .await;

        println!("\n");
    }

    Ok(())
}
