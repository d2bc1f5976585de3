//! Bounded reconnect supervision of the connect-and-consume cycle.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::{
    consumer::{HistoryPolicy, consume},
    dispatch::Dispatcher,
    error::Result,
    session::{Session, SessionConfig},
    transport::Transport,
};

/// Delay before the first reconnect attempt.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum delay between reconnect attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Remaining reconnect attempts for one supervised run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u32,
}

impl RetryBudget {
    #[must_use]
    pub const fn new(remaining: u32) -> Self {
        Self { remaining }
    }

    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Consume one retry. `false` means the budget was already empty and
    /// the failure is terminal.
    pub fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Run connect-and-consume cycles until the stream ends normally or the
/// retry budget is exhausted.
///
/// A configuration error is terminal on the spot: it is deterministic and
/// would fail identically on every retry, so no budget is spent on it.
/// Every other connect or stream failure consumes one retry and restarts
/// the cycle after a capped exponential backoff.
pub async fn supervise(
    transport: &dyn Transport,
    config: &SessionConfig,
    dispatcher: &Dispatcher,
    history_policy: HistoryPolicy,
    max_retries: u32,
) -> Result<()> {
    let mut budget = RetryBudget::new(max_retries);
    let mut backoff = INITIAL_BACKOFF;

    loop {
        let error = match Session::connect(transport, config).await {
            Ok(session) => {
                backoff = INITIAL_BACKOFF;
                match consume(&session, dispatcher, history_policy).await {
                    Ok(()) => {
                        info!("done");
                        return Ok(());
                    },
                    Err(error) => error,
                }
            },
            Err(error) if error.is_fatal() => {
                error!(%error, "fatal configuration error");
                return Err(error);
            },
            Err(error) => error,
        };

        if !budget.try_consume() {
            error!(%error, "retry budget exhausted, giving up");
            return Err(error);
        }
        warn!(
            %error,
            remaining = budget.remaining(),
            "session cycle failed, reconnecting"
        );
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}
