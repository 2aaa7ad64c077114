//! Write-once response cell.
//!
//! Every call gets exactly one [`MethodResponse`]. The cell is the only
//! writer; whoever holds it owns the right to answer. A second `fulfill` is a
//! protocol violation: it panics in debug builds and is dropped with a
//! warning otherwise.

use crate::protocol::MethodResponse;
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyError {
    #[error("request was abandoned without a response")]
    Abandoned,
}

/// Writing half. Shareable across threads; the first `fulfill` wins.
#[derive(Debug)]
pub struct ResponseCell {
    tx: Mutex<Option<oneshot::Sender<MethodResponse>>>,
}

/// Reading half, held by the caller.
#[derive(Debug)]
pub struct ResponseReceiver {
    rx: oneshot::Receiver<MethodResponse>,
}

impl ResponseCell {
    pub fn new() -> (Self, ResponseReceiver) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            ResponseReceiver { rx },
        )
    }

    /// Deliver the response. Returns `false` when the cell was already used.
    pub fn fulfill(&self, response: MethodResponse) -> bool {
        let sender = self
            .tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let Some(sender) = sender else {
            tracing::warn!(
                response = response.kind(),
                "response already fulfilled, ignoring second answer"
            );
            debug_assert!(false, "response cell fulfilled twice");
            return false;
        };
        if sender.send(response).is_err() {
            tracing::debug!("caller stopped waiting before the response arrived");
        }
        true
    }

    pub fn is_fulfilled(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }
}

impl Drop for ResponseCell {
    fn drop(&mut self) {
        let pending = self
            .tx
            .get_mut()
            .map(|tx| tx.is_some())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_some());
        if pending {
            tracing::warn!("response cell dropped without an answer");
        }
    }
}

impl ResponseReceiver {
    /// Wait for the response. Resolves to `Abandoned` if the cell is dropped
    /// unanswered.
    pub async fn recv(self) -> Result<MethodResponse, ReplyError> {
        self.rx.await.map_err(|_| ReplyError::Abandoned)
    }

    /// Non-blocking peek; `None` while the request is still in flight.
    pub fn try_recv(&mut self) -> Option<Result<MethodResponse, ReplyError>> {
        match self.rx.try_recv() {
            Ok(response) => Some(Ok(response)),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(ReplyError::Abandoned)),
        }
    }
}
