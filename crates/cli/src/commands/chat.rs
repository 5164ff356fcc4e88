//! `docchat chat` — Interactive or single-message chat mode.

use std::path::{Path, PathBuf};

use docchat_agent::{ChatSession, DocumentContext, Orchestrator};
use docchat_config::AppConfig;
use docchat_core::error::{ExtractError, Result as ChatResult};
use docchat_document::DocumentExtractor;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

const HELP: &str = "\
Commands:
  /upload <path>   Load a PDF into the conversation
  /model [name]    Show or switch the active model
  /models          List supported models
  /save            Save the chat history to a file
  /clear           Clear the conversation (keeps document and model)
  /reset           Clear everything, back to the default model
  /history         Print the conversation so far
  /help            Show this help
  /exit            Quit";

/// One line of REPL input.
#[derive(Debug, PartialEq, Eq)]
enum ReplInput {
    Empty,
    Message(String),
    Upload(PathBuf),
    Model(Option<String>),
    Models,
    Save,
    Clear,
    Reset,
    History,
    Help,
    Exit,
    Unknown(String),
}

fn parse_input(line: &str) -> ReplInput {
    let line = line.trim();
    if line.is_empty() {
        return ReplInput::Empty;
    }
    if matches!(line, "exit" | "quit") {
        return ReplInput::Exit;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ReplInput::Message(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match (name, arg) {
        ("upload", "") => ReplInput::Unknown("/upload needs a path".into()),
        ("upload", path) => ReplInput::Upload(PathBuf::from(path)),
        ("model", "") => ReplInput::Model(None),
        ("model", model) => ReplInput::Model(Some(model.to_string())),
        ("models", _) => ReplInput::Models,
        ("save", _) => ReplInput::Save,
        ("clear", _) => ReplInput::Clear,
        ("reset", _) => ReplInput::Reset,
        ("history", _) => ReplInput::History,
        ("help", _) => ReplInput::Help,
        ("exit" | "quit", _) => ReplInput::Exit,
        _ => ReplInput::Unknown(format!("Unknown command '/{name}'")),
    }
}

/// Everything a chat needs besides the session itself.
struct ChatContext {
    config: AppConfig,
    orchestrator: Orchestrator,
    extractor: DocumentExtractor,
}

impl ChatContext {
    fn new(config: AppConfig, orchestrator: Orchestrator) -> Self {
        let extractor = DocumentExtractor::new(config.document.max_bytes);
        Self {
            config,
            orchestrator,
            extractor,
        }
    }
}

fn load_document(
    extractor: &DocumentExtractor,
    path: &Path,
) -> std::result::Result<DocumentContext, ExtractError> {
    let text = extractor.extract_file(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(DocumentContext::from_text(name, text))
}

fn upload_message(document: &DocumentContext) -> String {
    format!("PDF processed! ({} words)", document.word_count)
}

/// Load the `--document` file before the chat starts. A failure is reported
/// and the chat goes on without a document.
async fn preload_document(ctx: &ChatContext, session: &mut ChatSession, path: PathBuf) -> String {
    match handle(ctx, session, ReplInput::Upload(path)).await {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!(error = %e, "Could not load the startup document");
            format!("[Error] {e}")
        }
    }
}

/// Carry out one REPL input and return the text to show.
async fn handle(
    ctx: &ChatContext,
    session: &mut ChatSession,
    input: ReplInput,
) -> ChatResult<String> {
    let output = match input {
        ReplInput::Empty | ReplInput::Exit => String::new(),
        ReplInput::Message(text) => session.send(&ctx.orchestrator, &text).await?.answer,
        ReplInput::Upload(path) => {
            let document = load_document(&ctx.extractor, &path)?;
            upload_message(session.set_document(document))
        }
        ReplInput::Model(None) => format!("Active model: {}", session.model()),
        ReplInput::Model(Some(model)) => {
            session
                .select_model(
                    ctx.orchestrator.provider(),
                    &ctx.config.supported_models,
                    &model,
                )
                .await?;
            format!("Model loaded: {}", session.model())
        }
        ReplInput::Models => ctx
            .config
            .supported_models
            .iter()
            .map(|m| {
                let marker = if m == session.model() { "*" } else { " " };
                format!("{marker} {m}")
            })
            .collect::<Vec<_>>()
            .join("\n"),
        ReplInput::Save => {
            let path = session.save_transcript(&ctx.config.transcript.dir)?;
            format!("Chat history saved to {}", path.display())
        }
        ReplInput::Clear => {
            session.clear_chat();
            "Chat cleared.".to_string()
        }
        ReplInput::Reset => {
            session.clear_all();
            format!("Session reset. Model: {}", session.model())
        }
        ReplInput::History => {
            let transcript = session.export();
            if transcript.is_empty() {
                "(no messages yet)".to_string()
            } else {
                transcript.trim_end().to_string()
            }
        }
        ReplInput::Help => HELP.to_string(),
        ReplInput::Unknown(reason) => format!("{reason}. Type /help for commands."),
    };
    Ok(output)
}

pub async fn run(
    model: Option<String>,
    document: Option<PathBuf>,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let orchestrator = super::build_orchestrator(&config)?;
    let ctx = ChatContext::new(config, orchestrator);
    let mut session = ChatSession::from_config(&ctx.config);

    if let Some(model) = model {
        handle(&ctx, &mut session, ReplInput::Model(Some(model))).await?;
    }
    if let Some(path) = document {
        eprintln!("  {}", preload_document(&ctx, &mut session, path).await);
    }

    debug!(
        session = %session.id(),
        model = %session.model(),
        document = session.document().map(|d| d.name.as_str()),
        "Chat session ready"
    );

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let result = session.send(&ctx.orchestrator, &msg).await;
        eprint!("\r              \r");
        println!("{}", result?.answer);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  DocChat — Interactive Mode");
    println!();
    println!("  Model:     {}", session.model());
    match session.document() {
        Some(doc) => println!("  Document:  {} ({} words)", doc.name, doc.word_count),
        None => println!("  Document:  none (use /upload <path>)"),
    }
    println!();
    println!("  Type your message and press Enter. /help lists commands.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let input = parse_input(&line);
        if input == ReplInput::Exit {
            break;
        }
        let is_message = matches!(input, ReplInput::Message(_));
        if is_message {
            eprint!("  ...");
        }

        let outcome = handle(&ctx, &mut session, input).await;
        if is_message {
            eprint!("\r     \r");
        }
        match outcome {
            Ok(output) if output.is_empty() => {}
            Ok(output) => {
                let label = if is_message { "AI > " } else { "" };
                println!();
                for line in output.lines() {
                    println!("  {label}{line}");
                }
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }
        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

fn prompt() -> std::io::Result<()> {
    use std::io::Write;
    print!("  You > ");
    std::io::stdout().flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_core::ErrorKind;
    use docchat_core::error::ProviderError;
    use docchat_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use docchat_document::fixtures::pdf_with_pages;
    use std::sync::Arc;

    struct EchoProvider;

    #[async_trait::async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                text: format!("{} answered a prompt of {} chars.", request.model, request.prompt.len()),
                model: request.model,
                usage: None,
            })
        }
    }

    fn context(transcript_dir: &Path) -> ChatContext {
        let mut config = AppConfig::default();
        config.transcript.dir = transcript_dir.to_path_buf();
        ChatContext::new(config, Orchestrator::new(Arc::new(EchoProvider)))
    }

    #[test]
    fn parses_plain_messages_and_commands() {
        assert_eq!(parse_input("   "), ReplInput::Empty);
        assert_eq!(parse_input(" hello "), ReplInput::Message("hello".into()));
        assert_eq!(parse_input("exit"), ReplInput::Exit);
        assert_eq!(parse_input("/exit"), ReplInput::Exit);
        assert_eq!(
            parse_input("/upload  my docs/paper.pdf "),
            ReplInput::Upload(PathBuf::from("my docs/paper.pdf"))
        );
        assert_eq!(parse_input("/model"), ReplInput::Model(None));
        assert_eq!(parse_input("/model llama3"), ReplInput::Model(Some("llama3".into())));
        assert_eq!(parse_input("/models"), ReplInput::Models);
        assert_eq!(parse_input("/history"), ReplInput::History);
        assert!(matches!(parse_input("/upload"), ReplInput::Unknown(_)));
        assert!(matches!(parse_input("/frobnicate"), ReplInput::Unknown(_)));
    }

    #[tokio::test]
    async fn upload_chat_save_flow() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut session = ChatSession::from_config(&ctx.config);

        let pdf = dir.path().join("paper.pdf");
        std::fs::write(&pdf, pdf_with_pages(&["Three little words"])).unwrap();
        let out = handle(&ctx, &mut session, ReplInput::Upload(pdf)).await.unwrap();
        assert_eq!(out, "PDF processed! (3 words)");

        let out = handle(&ctx, &mut session, parse_input("What is it about?"))
            .await
            .unwrap();
        assert!(out.starts_with("mistral answered"));

        let out = handle(&ctx, &mut session, ReplInput::Save).await.unwrap();
        assert!(out.starts_with("Chat history saved to"));
        let saved: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("chat_history_"))
            .collect();
        assert_eq!(saved.len(), 1);

        let history = handle(&ctx, &mut session, ReplInput::History).await.unwrap();
        assert!(history.starts_with("User: What is it about?\nAI: mistral answered"));
    }

    #[tokio::test]
    async fn model_commands() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut session = ChatSession::from_config(&ctx.config);

        let out = handle(&ctx, &mut session, parse_input("/model llama3")).await.unwrap();
        assert_eq!(out, "Model loaded: llama3");

        let out = handle(&ctx, &mut session, ReplInput::Models).await.unwrap();
        assert_eq!(out, "  mistral\n* llama3\n  tinyllama");

        let err = handle(&ctx, &mut session, parse_input("/model gpt-4"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedModel);

        let out = handle(&ctx, &mut session, ReplInput::Reset).await.unwrap();
        assert_eq!(out, "Session reset. Model: mistral");
    }

    #[tokio::test]
    async fn failed_upload_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut session = ChatSession::from_config(&ctx.config);

        let bad = dir.path().join("bad.pdf");
        std::fs::write(&bad, b"plain text").unwrap();
        let err = handle(&ctx, &mut session, ReplInput::Upload(bad)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert!(session.document().is_none());
    }

    #[tokio::test]
    async fn bad_startup_document_leaves_chat_usable() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut session = ChatSession::from_config(&ctx.config);

        let out = preload_document(&ctx, &mut session, dir.path().join("missing.pdf")).await;
        assert!(out.starts_with("[Error]"));
        assert!(session.document().is_none());

        let out = handle(&ctx, &mut session, parse_input("Still there?"))
            .await
            .unwrap();
        assert!(out.starts_with("mistral answered"));

        let pdf = dir.path().join("notes.pdf");
        std::fs::write(&pdf, pdf_with_pages(&["Two words"])).unwrap();
        let out = preload_document(&ctx, &mut session, pdf).await;
        assert_eq!(out, "PDF processed! (2 words)");
    }

    #[tokio::test]
    async fn history_of_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut session = ChatSession::from_config(&ctx.config);
        let out = handle(&ctx, &mut session, ReplInput::History).await.unwrap();
        assert_eq!(out, "(no messages yet)");
    }
}
