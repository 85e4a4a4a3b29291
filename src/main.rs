//! Sibyl CLI entry point

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use anyhow::Result;

#[derive(Parser)]
#[command(name = "sibyl")]
#[command(about = "🔮 Sibyl - AI analyst for portfolio sensitivity analysis")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Sibyl configuration
    Init,

    /// Chat with the assistant
    Chat {
        /// Message to send (omit for interactive mode)
        #[arg(short, long)]
        message: Option<String>,

        /// Stream tool-call events as they occur
        #[arg(short, long)]
        stream: bool,
    },

    /// Show Sibyl status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Setup Global Ctrl+C handler
    let exit_flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let r = exit_flag.clone();

    ctrlc::set_handler(move || {
        if r.load(std::sync::atomic::Ordering::SeqCst) {
            println!("\n👋 Bye!");
            std::process::exit(0);
        } else {
            println!("\n⚠️  Press Ctrl+C again to exit");
            r.store(true, std::sync::atomic::Ordering::SeqCst);

            // Reset flag after 3 seconds
            let r2 = r.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_secs(3));
                r2.store(false, std::sync::atomic::Ordering::SeqCst);
            });
        }
    }).ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            println!("🔮 Initializing Sibyl...");
            sibyl::config::init()?;
        }

        Commands::Chat { message, stream } => {
            let config = sibyl::config::load()?;
            let assistant = std::sync::Arc::new(sibyl::Assistant::with_demo_catalog(&config)?);

            if let Some(msg) = message {
                // Single message mode
                run_chat_once(&assistant, &msg, stream).await?;
            } else {
                // Interactive mode
                sibyl::ui::print_header(&config.model, &config.provider);
                println!("  Interactive mode (type 'exit' to quit)\n");
                run_chat_interactive(&assistant, stream).await?;
            }
        }

        Commands::Status => {
            let config = sibyl::config::load()?;
            println!("🔮 Sibyl Status\n");
            println!("Provider: {}", config.provider);
            println!("Model: {}", config.model);
            println!("Endpoint: {}", config.base_url);
            println!("API key: {}", if config.api_key.is_empty() { "not set" } else { "✓" });
            println!("Iteration cap: {}", config.max_iterations);
        }
    }

    Ok(())
}

async fn run_chat_once(
    assistant: &std::sync::Arc<sibyl::Assistant>,
    message: &str,
    stream: bool,
) -> Result<()> {
    use sibyl::adapters::{StreamingDelivery, SyncDelivery};
    use sibyl::agent::RunEvent;

    if stream {
        let delivery = StreamingDelivery::new(assistant.clone());
        let mut events = delivery.open(message.to_string(), None);

        while let Some(event) = events.next_event().await {
            match event {
                RunEvent::Start { .. } => {}
                RunEvent::ToolCall { name, summary } => {
                    sibyl::ui::print_tool_call(&name, &summary);
                }
                RunEvent::Response { content } => println!("\n🔮 {}", content),
                RunEvent::Error { message } => sibyl::ui::print_error(&message),
                RunEvent::Done => break,
            }
        }
    } else {
        let delivery = SyncDelivery::new(assistant.clone());
        let response = delivery.send(message, None).await?;
        println!("\n🔮 {}", response);
    }

    Ok(())
}

async fn run_chat_interactive(
    assistant: &std::sync::Arc<sibyl::Assistant>,
    stream: bool,
) -> Result<()> {
    use std::io::{self, Write};

    loop {
        // Blue "You"
        print!("\x1b[1;34mYou\x1b[0m: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("👋 Bye!");
            break;
        }

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("reset") {
            let dropped = assistant.reset();
            sibyl::ui::print_step(&format!("History cleared ({} messages)", dropped));
            continue;
        }

        if let Err(e) = run_chat_once(assistant, input, stream).await {
            println!("\n\x1b[1;31mError\x1b[0m: {}\n", e);
        }
    }

    Ok(())
}
