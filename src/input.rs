use crate::messages::UiInput;
use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Interpret one line typed at the terminal.
///
/// An empty line activates the action control, `q`/`quit` exits, anything
/// else is taken as an image path (optionally prefixed with `image `).
pub fn parse_line(line: &str) -> UiInput {
    let line = line.trim();

    match line {
        "" => UiInput::Click,
        "q" | "quit" | "exit" => UiInput::Quit,
        _ => {
            let path = line.strip_prefix("image ").unwrap_or(line).trim();
            // Terminals quote paths dropped onto them
            let path = path
                .strip_prefix('\'')
                .and_then(|p| p.strip_suffix('\''))
                .or_else(|| path.strip_prefix('"').and_then(|p| p.strip_suffix('"')))
                .unwrap_or(path);
            UiInput::SelectImage(PathBuf::from(path))
        }
    }
}

/// Forward stdin lines to the controller until EOF.
///
/// Runs on a dedicated thread so a pending read never holds up runtime
/// shutdown.
pub fn spawn_stdin_reader(tx: mpsc::Sender<UiInput>) -> Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            if let Err(e) = read_lines(std::io::stdin().lock(), &tx) {
                tracing::error!("Input reader stopped: {}", e);
            }
            tracing::debug!("Stdin reader finished");
        })
        .context("Failed to spawn stdin reader")
}

fn read_lines(reader: impl BufRead, tx: &mpsc::Sender<UiInput>) -> Result<()> {
    for line in reader.lines() {
        let line = line.context("Failed to read stdin")?;
        let input = parse_line(&line);

        if let UiInput::SelectImage(path) = &input {
            if !path.is_file() {
                tracing::warn!("Not an image file: {:?}", path);
                continue;
            }
        }

        let quit = input == UiInput::Quit;
        if tx.blocking_send(input).is_err() || quit {
            break;
        }
    }

    Ok(())
}
