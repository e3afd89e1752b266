//! Interactive line-oriented front end
//!
//! Presentation only: reads commands from stdin, renders notices, and feeds
//! events into the session runtime. All validation and state transitions live
//! in the session core.

use crate::runtime::SessionHandle;
use crate::session::state::DocumentStatus;
use crate::session::{Event, LocalFile, Notice, Role, UploadRejection, ACCEPTED_EXTENSIONS};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const HELP: &str = "\
commands:
  <question>        ask the assistant (uses your uploaded documents)
  /upload <path>    upload a document through the file picker path
  /drop <paths...>  drop one or more files onto the window
  /remove <name>    remove an uploaded document from this session
  /docs             list uploaded documents
  /clear            clear the visible chat history
  /reset            wipe assistant memory (asks for confirmation)
  /help             show this help
  /quit             exit";

/// Run the REPL until EOF or `/quit`.
pub async fn run(handle: SessionHandle) -> std::io::Result<()> {
    let SessionHandle {
        event_tx,
        notice_rx,
        mut state_rx,
    } = handle;

    // Notices render from their own task so answers appear as they settle.
    let renderer = tokio::spawn(render_notices(notice_rx));

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("docchat - type a question, or /help for commands");

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();

        let event = match line.split_whitespace().next() {
            None => continue,
            Some("/quit") | Some("/exit") => break,
            Some("/help") => {
                println!("{HELP}");
                continue;
            }
            Some("/docs") => {
                list_documents(&state_rx.borrow_and_update());
                continue;
            }
            Some("/upload") => match parse_file(&line, "/upload") {
                Some(file) => Event::FilePicked { file },
                None => continue,
            },
            Some("/drop") => {
                let files: Vec<LocalFile> = line
                    .split_whitespace()
                    .skip(1)
                    .filter_map(LocalFile::from_path)
                    .collect();
                if files.is_empty() {
                    println!("usage: /drop <paths...>");
                    continue;
                }
                Event::FilesDropped { files }
            }
            Some("/remove") => match line.split_whitespace().nth(1) {
                Some(name) => Event::RemoveDocument {
                    name: name.to_string(),
                },
                None => {
                    println!("usage: /remove <name>");
                    continue;
                }
            },
            Some("/clear") => Event::ClearChat,
            Some("/reset") => {
                if confirm_reset(&mut lines, &mut stdout).await? {
                    Event::ResetConfirmed
                } else {
                    println!("reset cancelled");
                    continue;
                }
            }
            Some(cmd) if cmd.starts_with('/') => {
                println!("unknown command {cmd}; /help lists commands");
                continue;
            }
            Some(_) => Event::SubmitQuestion { text: line },
        };

        if event_tx.send(event).await.is_err() {
            break;
        }
    }

    renderer.abort();
    Ok(())
}

fn parse_file(line: &str, command: &str) -> Option<LocalFile> {
    let Some(path) = line.split_whitespace().nth(1) else {
        println!("usage: {command} <path>");
        return None;
    };
    let file = LocalFile::from_path(path);
    if file.is_none() {
        println!("{path} has no usable file name");
    }
    file
}

fn list_documents(state: &crate::session::SessionState) {
    if state.documents.is_empty() {
        println!("no documents uploaded");
        return;
    }
    for doc in &state.documents {
        let status = match doc.status {
            DocumentStatus::Ready => "ready",
        };
        println!("  {} ({status})", doc.name);
    }
}

/// Destructive action: require an explicit yes before the purge is issued.
async fn confirm_reset(
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    stdout: &mut tokio::io::Stdout,
) -> std::io::Result<bool> {
    stdout
        .write_all(b"Delete all assistant memory? This cannot be undone. [y/N] ")
        .await?;
    stdout.flush().await?;
    let answer = lines.next_line().await?.unwrap_or_default();
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

async fn render_notices(mut notice_rx: broadcast::Receiver<Notice>) {
    loop {
        match notice_rx.recv().await {
            Ok(notice) => render(&notice),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Notice renderer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn render(notice: &Notice) {
    match notice {
        Notice::MessageAppended { message } => match message.role {
            // The user's line is already on screen.
            Role::User => {}
            Role::Assistant => {
                println!("assistant> {}", message.content);
                if !message.sources.is_empty() {
                    println!("  sources: {}", message.sources.join(", "));
                }
            }
        },
        Notice::TranscriptCleared { epoch } => {
            tracing::debug!(epoch, "Picker controls reset");
            println!("chat cleared");
        }
        Notice::UploadStarted { name } => println!("uploading {name}..."),
        Notice::DocumentAdded { name } => println!("uploaded {name}"),
        Notice::DocumentRemoved { name } => println!("removed {name}"),
        Notice::UploadRejected { name, reason } => match reason {
            UploadRejection::Duplicate => println!("{name} is already uploaded"),
            UploadRejection::UnsupportedType => println!(
                "{name}: unsupported file type (accepted: {})",
                ACCEPTED_EXTENSIONS.join(", ")
            ),
        },
        Notice::UploadFailed { name, message } => println!("upload of {name} failed: {message}"),
        Notice::MemoryWiped { purge_ok: true } => println!("assistant memory wiped"),
        Notice::MemoryWiped { purge_ok: false } => {
            println!("local session cleared, but the server-side purge may not have completed");
        }
    }
}
