//! Sequential consumption of the live inbound stream.

use {
    tokio_stream::StreamExt,
    tracing::{debug, info, warn},
};

use crate::{
    context::HandlerContext,
    dispatch::Dispatcher,
    error::Result,
    history::load_history,
    session::Session,
};

/// What to do with a message whose history fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPolicy {
    /// Dispatch the message with an empty history window.
    #[default]
    UseEmpty,
    /// Drop the message without dispatching.
    Skip,
}

/// Pull messages one at a time until the stream ends or fails.
///
/// Messages are processed strictly in receipt order; the next message is
/// not pulled until the full pipeline for the current one has finished.
/// Per-message failures are contained here and at the dispatcher; only the
/// stream itself ending or erroring escapes to the supervisor.
pub async fn consume(
    session: &Session,
    dispatcher: &Dispatcher,
    history_policy: HistoryPolicy,
) -> Result<()> {
    let mut stream = session.connection().stream_messages().await?;
    info!(address = %session.address(), "listening for messages");

    while let Some(item) = stream.next().await {
        let message = item?;

        if message.sender == session.address() {
            debug!("skipping delivery echo of a self-sent message");
            continue;
        }
        debug!(sender = %message.sender, "received message");

        let history = match load_history(session, message.sender).await {
            Ok(history) => history,
            Err(error) => match history_policy {
                HistoryPolicy::UseEmpty => {
                    warn!(
                        sender = %message.sender,
                        %error,
                        "history fetch failed, dispatching with empty history"
                    );
                    Vec::new()
                },
                HistoryPolicy::Skip => {
                    warn!(
                        sender = %message.sender,
                        %error,
                        "history fetch failed, skipping message"
                    );
                    continue;
                },
            },
        };

        let context = HandlerContext::new(message, history, session.clone());
        dispatcher.dispatch(&context).await;
    }

    info!("message stream ended");
    Ok(())
}
