//! File loading and the interactive question loop.

use std::path::{Path, PathBuf};

use anyhow::Result;
use docqa_rag::{ConversationTurn, RetrievalOrchestrator, RetrievalResult, UploadedFile, record_exchange};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

const PROMPT: &str = "docqa> ";

/// What a line typed at the prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// A question for the documents.
    Ask(String),
    /// Forget the conversation so far.
    Clear,
    /// Leave the chat.
    Quit,
    /// Nothing to do (blank line).
    Skip,
}

impl ChatCommand {
    /// Interpret one input line.
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Self::Skip,
            "/quit" | "/exit" | "quit" | "exit" => Self::Quit,
            "/clear" => Self::Clear,
            question => Self::Ask(question.to_string()),
        }
    }
}

/// Files read from disk, plus the paths that could not be read.
#[derive(Debug, Default)]
pub struct LoadedFiles {
    /// Readable files, in argument order.
    pub files: Vec<UploadedFile>,
    /// `(path, reason)` for every path that could not be read.
    pub unreadable: Vec<(PathBuf, String)>,
}

/// Read every path into an [`UploadedFile`] named after its file name.
///
/// An unreadable path is logged and reported in
/// [`LoadedFiles::unreadable`]; the remaining paths are still read.
pub async fn load_files(paths: &[impl AsRef<Path>]) -> LoadedFiles {
    let mut loaded = LoadedFiles::default();
    for path in paths {
        let path = path.as_ref();
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let name = path
                    .file_name()
                    .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
                loaded.files.push(UploadedFile::new(name, bytes));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                loaded.unreadable.push((path.to_path_buf(), e.to_string()));
            }
        }
    }
    loaded
}

fn print_answer(result: &RetrievalResult, show_sources: bool) {
    println!("\n{}\n", result.answer);
    if show_sources {
        for source in &result.sources {
            println!(
                "  [{:.3}] {} p.{}: {}",
                source.score,
                source.chunk.chunk.document_name,
                source.chunk.chunk.page + 1,
                preview(source.text(), 80)
            );
        }
        if !result.sources.is_empty() {
            println!();
        }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

/// Run the question loop until the user quits.
///
/// History lives here and is only extended with answers that were actually
/// produced; a failed question is reported and the conversation carries on.
pub async fn run_chat(orchestrator: &RetrievalOrchestrator, show_sources: bool) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut history: Vec<ConversationTurn> = Vec::new();

    println!("Ask a question about your documents. /clear resets the conversation, /quit leaves.");
    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        match ChatCommand::parse(&line) {
            ChatCommand::Skip => continue,
            ChatCommand::Quit => break,
            ChatCommand::Clear => {
                history.clear();
                println!("Conversation cleared.");
            }
            ChatCommand::Ask(question) => {
                if let Err(e) = editor.add_history_entry(question.as_str()) {
                    debug!(error = %e, "could not record line history");
                }
                match orchestrator.answer_with_sources(&question, &history).await {
                    Ok(result) => {
                        print_answer(&result, show_sources);
                        record_exchange(&mut history, question, result.answer);
                    }
                    Err(e) => {
                        warn!(error = %e, "question failed");
                        eprintln!("Could not answer: {e}");
                    }
                }
            }
        }
    }

    Ok(())
}
