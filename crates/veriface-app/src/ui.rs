use std::io::{BufRead, Write};
use std::path::PathBuf;

use kanal::{AsyncReceiver, AsyncSender};
use tokio_util::sync::CancellationToken;
use veriface_types::{AppEvent, ResultRecord, ResultStatus, TriggerMode};

const HELP: &str = "commands: check | server <url> | auto on|off | results | overlay <file.png> | quit";

/// Terminal operator console: stdin commands in, result lists out.
///
/// The two directions run independently. A backend blocked on a full UI
/// channel is always drained by the printer, even while a command send is
/// waiting for room.
pub async fn ui_loop(
    app_to_ui_rx: AsyncReceiver<AppEvent>,
    ui_to_app_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    // Blocking stdin lives on its own thread so shutdown never waits on it
    let (line_tx, line_rx) = kanal::unbounded::<String>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    println!("{HELP}");

    let (printed, forwarded) = tokio::join!(
        forward_from_backend(app_to_ui_rx, std::io::stdout(), cancel.clone()),
        forward_to_backend(line_rx.to_async(), ui_to_app_tx, cancel),
    );
    tracing::debug!("[UI] Console closed after {} events", printed?);
    forwarded
}

/// Renders backend events until the channel closes or shutdown.
/// Returns how many events were written.
pub async fn forward_from_backend<W: Write + Send>(
    app_to_ui_rx: AsyncReceiver<AppEvent>,
    mut out: W,
    cancel: CancellationToken,
) -> anyhow::Result<usize> {
    let mut written = 0;
    loop {
        let event = tokio::select! {
            biased;
            event = app_to_ui_rx.recv() => match event {
                Ok(event) => event,
                Err(_) => break,
            },
            _ = cancel.cancelled() => break,
        };
        if let Some(text) = render_event(&event) {
            writeln!(out, "{text}")?;
            written += 1;
        }
    }
    out.flush()?;
    Ok(written)
}

/// Parses console lines and sends them to the backend. Ends on `quit`, when
/// input closes, or on shutdown.
pub async fn forward_to_backend(
    lines: AsyncReceiver<String>,
    ui_to_app_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.recv() => line,
        };
        let event = match line {
            Ok(line) => match parse_command(&line) {
                Some(event) => event,
                None => {
                    if !line.trim().is_empty() {
                        println!("{HELP}");
                    }
                    continue;
                }
            },
            // stdin closed
            Err(_) => AppEvent::Quit,
        };

        let quit = matches!(event, AppEvent::Quit);
        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = ui_to_app_tx.send(event) => sent?,
        }
        if quit {
            break;
        }
    }
    Ok(())
}

pub fn parse_command(line: &str) -> Option<AppEvent> {
    let line = line.trim();
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match (command.to_ascii_lowercase().as_str(), arg) {
        ("check" | "c", "") => Some(AppEvent::TriggerCapture(TriggerMode::Manual)),
        ("server", url) => Some(AppEvent::SetServerUrl(url.to_string())),
        ("auto", "on") => Some(AppEvent::SetAutoSend(true)),
        ("auto", "off") => Some(AppEvent::SetAutoSend(false)),
        ("results" | "r", "") => Some(AppEvent::RequestResults),
        ("overlay", path) if !path.is_empty() => Some(AppEvent::SaveOverlay(PathBuf::from(path))),
        ("quit" | "q" | "exit", "") => Some(AppEvent::Quit),
        _ => None,
    }
}

pub fn render_event(event: &AppEvent) -> Option<String> {
    match event {
        AppEvent::ShowResults { mode, results } => {
            let title = match mode {
                TriggerMode::Manual => "Manual Results",
                TriggerMode::Auto => "Auto Results",
            };
            Some(render_results(title, results))
        }
        AppEvent::LoadingChanged(true) => Some("Processing...".to_string()),
        AppEvent::StatusUpdate(status) => Some(status.clone()),
        AppEvent::BackendReady => Some("Ready".to_string()),
        _ => None,
    }
}

/// `results` is expected most-recent-first
pub fn render_results(title: &str, results: &[ResultRecord]) -> String {
    let mut out = format!("== {title} ({}) ==", results.len());
    for record in results {
        out.push_str(&format!("\n{} - {}", record.timestamp, record.status));

        let data = match (&record.status, &record.data) {
            (ResultStatus::Done, data) => {
                serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
            }
            (_, serde_json::Value::Null) => String::new(),
            (_, serde_json::Value::String(s)) => s.clone(),
            (_, other) => other.to_string(),
        };
        for line in data.lines() {
            out.push_str(&format!("\n    {line}"));
        }
        if !record.msg.is_empty() {
            out.push_str(&format!("\n    {}", record.msg));
        }
    }
    out
}
