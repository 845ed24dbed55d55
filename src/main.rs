use anyhow::{Context, Result};
use clap::Parser;
use nano_banana_studio::ai::GeminiImageClient;
use nano_banana_studio::models::{Config, Mode, Status};
use nano_banana_studio::prompts;
use nano_banana_studio::session::{Studio, Submission};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "nano-banana-studio")]
#[command(about = "Generate and edit images with Gemini from the terminal")]
struct CliArgs {
    /// Image file to start editing from.
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Directory that `/save` writes into.
    #[arg(long, value_name = "DIR", default_value = ".")]
    out: PathBuf,
}

#[derive(Debug, PartialEq)]
enum Command {
    Prompt(String),
    Try(usize),
    Upload(PathBuf),
    Clear,
    History,
    Select(String),
    Save,
    Dismiss,
    Suggest,
    Help,
    Quit,
    Nothing,
}

const HELP: &str = "\
Type a prompt to generate an image, or to edit the current one.
  /upload <path>    load a local image as the current image
  /clear            close the current image (history is kept)
  /history          list images from this session, newest first
  /select <n|id>    make a history entry current again
  /save             write the current image to the output directory
  /suggest          list suggested prompts for the current mode
  /try <n>          submit suggestion n
  /dismiss          hide the last error
  /quit             exit";

fn parse_command(raw: &str) -> std::result::Result<Command, String> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(Command::Nothing);
    }
    if !line.starts_with('/') {
        return Ok(Command::Prompt(raw.to_string()));
    }

    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (line, ""),
    };

    let require_arg = |usage: &str| {
        if arg.is_empty() {
            Err(format!("Usage: {}", usage))
        } else {
            Ok(arg.to_string())
        }
    };

    match name {
        "/upload" => require_arg("/upload <path>").map(|p| Command::Upload(PathBuf::from(p))),
        "/select" => require_arg("/select <n|id>").map(Command::Select),
        "/try" => require_arg("/try <n>")?
            .parse()
            .map(Command::Try)
            .map_err(|_| format!("'{}' is not a suggestion number", arg)),
        "/clear" => Ok(Command::Clear),
        "/history" => Ok(Command::History),
        "/save" => Ok(Command::Save),
        "/dismiss" => Ok(Command::Dismiss),
        "/suggest" => Ok(Command::Suggest),
        "/help" => Ok(Command::Help),
        "/quit" | "/exit" => Ok(Command::Quit),
        other => Err(format!("Unknown command '{}'. Try /help.", other)),
    }
}

/// Resolve `/select` input: a 1-based history position or a record id.
fn resolve_selection(studio: &Studio, input: &str) -> Option<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Some(id);
    }
    let position: usize = input.parse().ok()?;
    studio
        .history()
        .get(position.checked_sub(1)?)
        .map(|record| record.id())
}

async fn upload_file(studio: &Studio, path: &Path) -> Result<()> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match studio.submit_upload(bytes, "") {
        Some(record) => println!("Loaded {} as {}", path.display(), record.id()),
        None if studio.status().is_idle() => {
            println!("{} is empty, nothing loaded", path.display())
        }
        None => println!("Still working on the previous request, nothing loaded"),
    }
    Ok(())
}

async fn submit(studio: &Studio, prompt: &str) {
    if let Some(message) = busy_message(studio.mode()) {
        println!("{}", message);
    }
    match studio.submit_prompt(prompt).await {
        Submission::Completed(record) => println!(
            "Created {} ({} bytes, {})",
            record.id(),
            record.payload().len(),
            record.payload().media_type()
        ),
        Submission::Failed(message) => println!("Error: {}", message),
        Submission::Busy => println!("Still working on the previous request"),
        Submission::EmptyPrompt => {}
    }
}

fn busy_message(mode: Mode) -> Option<&'static str> {
    match mode {
        Mode::Generate => Status::Generating.activity_message(),
        Mode::Edit => Status::Editing.activity_message(),
    }
}

fn print_summary(studio: &Studio) {
    let state = studio.snapshot();
    match state.current() {
        Some(current) => println!("[current] {} \"{}\"", current.id(), current.prompt()),
        None => println!("[no image] {}", studio.mode().placeholder()),
    }
    if let Some(err) = state.last_error() {
        println!("[error] {} (/dismiss to hide)", err);
    }
}

async fn run(studio: &Studio, out_dir: &Path) -> Result<()> {
    println!("Nano Banana Studio. /help for commands.");
    print_summary(studio);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match command {
            Command::Nothing => continue,
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::Prompt(text) => submit(studio, &text).await,
            Command::Try(n) => {
                let suggestions = prompts::suggestions(studio.mode());
                match n.checked_sub(1).and_then(|i| suggestions.get(i)) {
                    Some(prompt) => submit(studio, prompt).await,
                    None => println!("No suggestion {}", n),
                }
            }
            Command::Suggest => {
                for (i, suggestion) in prompts::suggestions(studio.mode()).iter().enumerate() {
                    println!("  {}. {}", i + 1, suggestion);
                }
            }
            Command::Upload(path) => {
                if let Err(e) = upload_file(studio, &path).await {
                    println!("{:#}", e);
                }
            }
            Command::Clear => studio.clear_current(),
            Command::History => {
                let history = studio.history();
                if history.is_empty() {
                    println!("No history yet");
                }
                for (i, record) in history.iter().enumerate() {
                    println!(
                        "  {}. {} {} \"{}\"",
                        i + 1,
                        record.created_at().format("%H:%M:%S"),
                        record.id(),
                        record.prompt()
                    );
                }
            }
            Command::Select(input) => {
                let selected = resolve_selection(studio, &input)
                    .map(|id| studio.select_from_history(id))
                    .unwrap_or(false);
                if !selected {
                    println!("No history entry '{}'", input);
                }
            }
            Command::Save => match studio.save_current(out_dir).await {
                Ok(Some(path)) => println!("Saved {}", path.display()),
                Ok(None) => println!("Nothing to save"),
                Err(e) => println!("Failed to save: {}", e),
            },
            Command::Dismiss => studio.dismiss_error(),
        }

        print_summary(studio);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nano_banana_studio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Image model: {}", config.image_model);

    let studio = Studio::new(Box::new(GeminiImageClient::from_config(&config)));

    if let Some(path) = &args.image {
        upload_file(&studio, path).await?;
    }

    run(&studio, &args.out).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use nano_banana_studio::ai::MockImageApi;

    #[test]
    fn test_plain_text_is_a_prompt() {
        assert_eq!(
            parse_command("  a cat in a spacesuit ").unwrap(),
            Command::Prompt("  a cat in a spacesuit ".to_string())
        );
        assert_eq!(parse_command("   ").unwrap(), Command::Nothing);
        assert_eq!(parse_command("  /clear ").unwrap(), Command::Clear);
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(
            parse_command("/upload ./cat.png").unwrap(),
            Command::Upload(PathBuf::from("./cat.png"))
        );
        assert_eq!(
            parse_command("/select 2").unwrap(),
            Command::Select("2".to_string())
        );
        assert_eq!(parse_command("/try 3").unwrap(), Command::Try(3));
    }

    #[test]
    fn test_command_errors() {
        assert!(parse_command("/upload").unwrap_err().contains("Usage"));
        assert!(parse_command("/try x").is_err());
        assert!(parse_command("/frobnicate").unwrap_err().contains("/help"));
    }

    #[test]
    fn test_resolve_selection_by_position_and_id() {
        let studio = Studio::new(Box::new(MockImageApi::new()));
        let older = studio.submit_upload(vec![1], "image/png").unwrap();
        let newer = studio.submit_upload(vec![2], "image/png").unwrap();

        assert_eq!(resolve_selection(&studio, "1"), Some(newer.id()));
        assert_eq!(resolve_selection(&studio, "2"), Some(older.id()));
        assert_eq!(resolve_selection(&studio, "0"), None);
        assert_eq!(resolve_selection(&studio, "3"), None);
        assert_eq!(
            resolve_selection(&studio, &older.id().to_string()),
            Some(older.id())
        );
    }
}
