//! Codepilot - 终端 REPL
//!
//! 入口：初始化日志、加载配置、以当前目录（或配置的 workspace_root）为工作区创建 Agent，
//! 逐行处理请求。

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use codepilot::config::load_config;
use codepilot::core::create_llm_from_config;
use codepilot::host::{LocalWorkspace, TerminalUi};
use codepilot::memory::ConversationMemory;
use codepilot::{observability, Agent, AgentSettings, Request, Response};

const HELP: &str = "\
Commands:
  /start            activate the session
  /stop             deactivate the session
  /stream <text>    stream a plain chat reply (no classification)
  /open <path>      mark a file as the active document
  /close            clear the active document
  /clear            forget the conversation history
  /status           show session state and token usage
  /quit             exit
Anything else is sent to the agent.";

fn print_response(response: &Response) {
    let action = &response.action;
    match &action.target {
        Some(target) => println!("[{}] {}", action.kind, target),
        None => println!("[{}]", action.kind),
    }
    if let Some(content) = &action.content {
        println!("{content}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;

    let root = match &cfg.app.workspace_root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let workspace = Arc::new(LocalWorkspace::with_settings(&root, &cfg.workspace));
    let ui = Arc::new(TerminalUi::new());
    let llm = create_llm_from_config(&cfg);

    let agent = Agent::new(llm, workspace.clone(), ui.clone(), AgentSettings::from(&cfg));
    agent.start().await;
    tracing::info!(root = %workspace.root().display(), "codepilot ready");

    let mut memory = ConversationMemory::new(cfg.agent.max_context_turns);
    println!("codepilot - workspace {} (type /help)", workspace.root().display());

    while let Some(line) = ui.read_line("> ").await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (line, ""),
        };

        match command {
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/start" => agent.start().await,
            "/stop" => agent.stop().await,
            "/status" => {
                let session = agent.session().await;
                let (prompt_tokens, completion_tokens, total_tokens) = agent.token_usage();
                println!(
                    "active: {}, task: {}, inactive policy: {:?}",
                    session.active,
                    session.current_task.as_deref().unwrap_or("-"),
                    agent.settings().inactive_policy
                );
                println!(
                    "tokens: prompt {prompt_tokens}, completion {completion_tokens}, \
total {total_tokens}"
                );
            }
            "/clear" => memory.clear(),
            "/open" if !arg.is_empty() => match workspace.resolve(arg) {
                Ok(path) => {
                    workspace.set_active_document(Some(path.to_string_lossy().to_string()))
                }
                Err(e) => println!("{e}"),
            },
            "/close" => workspace.set_active_document(None),
            "/stream" if !arg.is_empty() => {
                let request = Request::with_context(arg, memory.to_context())
                    .context("Invalid request")?;
                let mut on_token = |token: &str| {
                    print!("{token}");
                    let _ = std::io::stdout().flush();
                };
                let response = agent.process_request_streaming(&request, &mut on_token).await;
                println!();
                memory.push_turn(arg, response.action.content.clone().unwrap_or_default());
            }
            _ if command.starts_with('/') => println!("Unknown command. {HELP}"),
            _ => {
                let request = Request::with_context(line, memory.to_context())
                    .context("Invalid request")?;
                let response = agent.process_request(&request).await;
                print_response(&response);
                memory.push_turn(line, response.action.content.clone().unwrap_or_default());
            }
        }
    }

    agent.stop().await;
    Ok(())
}
