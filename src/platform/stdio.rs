use anyhow::{Context as _, Result};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::platform::{Context, EventAction, EventContext, Reply};
use crate::plugin::PluginChain;

/// What the host did with one event.
#[derive(Debug, Serialize)]
struct Outcome<'a> {
    action: EventAction,
    reply: Option<&'a Reply>,
}

/// Run the line-delimited JSON host: one `Context` per input line, one
/// outcome per output line. Events are handled strictly one after another.
/// A line that is not a valid event still gets a `CONTINUE` outcome so
/// output stays aligned with input; blank lines produce nothing.
pub async fn run<R, W>(chain: &PluginChain, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Reading events ({} plugin(s) registered)", chain.len());

    let mut lines = reader.lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read event from input")?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match serde_json::from_str::<Context>(line) {
            Ok(context) => {
                let mut event = EventContext::new(context);
                chain.dispatch(&mut event).await;
                Some(event)
            }
            Err(e) => {
                warn!("Malformed event, passing through: {}", e);
                None
            }
        };

        let outcome = match event.as_ref() {
            Some(event) => Outcome {
                action: event.action,
                reply: event.reply.as_ref(),
            },
            None => Outcome {
                action: EventAction::Continue,
                reply: None,
            },
        };
        let mut out = serde_json::to_string(&outcome).context("Failed to encode outcome")?;
        out.push('\n');
        writer
            .write_all(out.as_bytes())
            .await
            .context("Failed to write outcome")?;
        writer.flush().await.context("Failed to flush output")?;
    }

    info!("Input closed, host stopping");
    Ok(())
}
