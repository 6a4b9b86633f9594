//! `kaede chat` — Interactive or single-message chat mode.

use kaede_agent::{AgentLoop, ContextAssembler};
use kaede_config::AppConfig;
use kaede_core::memory::MemoryStore;
use kaede_core::status::{StatusBus, StatusKind};
use kaede_memory::RemoteMemoryStore;
use kaede_providers::OpenAiCompatProvider;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if config.validate().is_err() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    GEMINI_API_KEY = '...'");
        eprintln!("    KAEDE_API_KEY  = '...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }
    let api_key = config.api_key.clone().unwrap_or_default();

    let workspace = config.workspace_dir();
    std::fs::create_dir_all(&workspace)
        .map_err(|e| format!("Failed to create workspace {}: {e}", workspace.display()))?;

    let provider = Arc::new(OpenAiCompatProvider::new(
        "gemini",
        &config.api_url,
        &api_key,
    )?);

    let memory: Option<Arc<dyn MemoryStore>> = if config.memory_enabled() {
        let key = config.memory.api_key.as_deref().unwrap_or_default();
        Some(Arc::new(RemoteMemoryStore::new(&config.memory.base_url, key)))
    } else {
        None
    };

    let tools = Arc::new(if config.tools.sandboxed {
        kaede_tools::sandboxed_registry(&workspace, config.tools.allowed_commands.clone())
    } else {
        kaede_tools::unrestricted_registry()
    });
    let mut tool_names = tools.names();
    tool_names.sort();

    let context = ContextAssembler::new(&workspace, memory.clone());
    let status = Arc::new(StatusBus::default());

    let mut agent = AgentLoop::new(
        provider,
        &config.model,
        tools.clone(),
        context,
        status.clone(),
    )
    .with_max_tokens(config.max_tokens)
    .with_max_iterations(config.agent.max_iterations)
    .with_max_history(config.agent.max_history)
    .with_max_tool_result_chars(config.agent.max_tool_result_chars);
    if let Some(memory) = memory.clone() {
        agent = agent.with_memory(memory);
    }

    // Render status events as transient stderr lines
    let mut status_rx = status.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = status_rx.recv().await {
            match event.kind {
                StatusKind::Thinking | StatusKind::Tool => eprintln!("  · {}", event.text),
                StatusKind::Done => {}
            }
        }
    });

    // Restore past context, then open a fresh session
    agent.bootstrap().await;

    if let Some(msg) = message {
        let response = agent.run(&msg).await?;
        println!("{response}");
        return Ok(());
    }

    println!();
    println!("  Kaede — interactive mode");
    println!("  Model:   {}", config.model);
    println!("  Memory:  {}", if memory.is_some() { "remote (persistent)" } else { "local files only" });
    println!("  Tools:   {}", tool_names.join(", "));
    println!();
    println!("  Commands: /reset (new session), /refresh (reload memory), quit");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {}
            "quit" | "exit" => break,
            "/reset" => {
                agent.reset().await;
                println!("  (conversation cleared, new session started)");
            }
            "/refresh" => {
                agent.refresh_memory().await;
                println!("  (memory cache invalidated)");
            }
            _ => match agent.run(input).await {
                Ok(response) => {
                    println!();
                    for line in response.lines() {
                        println!("  Kaede > {line}");
                    }
                    println!();
                }
                // A transport failure aborts the turn, not the chat
                Err(e) => {
                    eprintln!("  [Error] {e}");
                    println!();
                }
            },
        }
        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}
