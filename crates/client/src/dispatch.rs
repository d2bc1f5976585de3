//! Handler invocation behind a failure boundary.

use std::sync::Arc;

use {
    async_trait::async_trait,
    tracing::{error, warn},
};

use crate::context::HandlerContext;

/// Fixed reply sent when handling a message fails for any internal reason.
/// Correspondents get this instead of silence or a stack trace.
pub const APOLOGY_REPLY: &str =
    "Sorry, something went wrong on my end. Please try again later.";

/// Application extension point: produce and send a reply for one inbound
/// message. Implementations report failure through the returned error and
/// must not assume it terminates the stream.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, context: &HandlerContext) -> anyhow::Result<()>;
}

/// Invokes the handler and contains its failures so that one bad message
/// never aborts the stream.
pub struct Dispatcher {
    handler: Arc<dyn MessageHandler>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(handler: Arc<dyn MessageHandler>) -> Self {
        Self { handler }
    }

    /// Run the handler against `context`. Always returns normally: a
    /// handler failure is logged and answered with a best-effort apology;
    /// a failing apology send is logged and swallowed.
    pub async fn dispatch(&self, context: &HandlerContext) {
        let Err(handler_error) = self.handler.handle(context).await else {
            return;
        };
        error!(
            sender = %context.message().sender,
            error = %handler_error,
            "handler failed"
        );

        if let Err(send_error) = context.reply(APOLOGY_REPLY).await {
            warn!(%send_error, "failed to send apology reply");
        }
    }
}
