//! Output formatting for replay events.

use clap::ValueEnum;

use crate::script::Event;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Render one event as a single line.
pub fn render(event: &Event, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string(event),
        OutputFormat::Human => Ok(match event {
            Event::Data {
                step,
                listener,
                key,
                data,
            } => format!("[{step}] {listener} <- {key}: {}", serde_json::to_string(data)?),
            Event::Ack { step, op, err } => match err {
                Some(err) => format!("[{step}] ack {op}: error: {err}"),
                None => format!("[{step}] ack {op}: ok"),
            },
            Event::Error { step, error } => format!("[{step}] error: {error}"),
        }),
    }
}
