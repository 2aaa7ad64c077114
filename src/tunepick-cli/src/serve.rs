//! JSON-lines method channel.
//!
//! Each input line is a `MethodCall`; each answer is written as one
//! `MethodReply` line as soon as it is ready, so replies may arrive out of
//! call order. A call whose request is abandoned gets no line at all.

use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tunepick_bridge::{MethodCall, MethodReply, PickerBridge};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeStats {
    pub calls: usize,
    pub replies: usize,
    pub malformed: usize,
    pub abandoned: usize,
    /// Still waiting for the user when the grace period ran out.
    pub unfinished: usize,
}

impl ServeStats {
    fn settle(&mut self, joined: Result<bool, JoinError>) {
        match joined {
            Ok(true) => self.replies += 1,
            Ok(false) => self.abandoned += 1,
            Err(err) => {
                tracing::error!(error = %err, "reply task failed");
                self.abandoned += 1;
            }
        }
    }
}

/// Calls in flight on one channel. Each call waits for its answer on its
/// own task; finished tasks are reaped as the channel runs.
struct Dispatcher<'a> {
    bridge: &'a PickerBridge,
    replies: mpsc::UnboundedSender<MethodReply>,
    pending: JoinSet<bool>,
    stats: ServeStats,
}

impl<'a> Dispatcher<'a> {
    fn new(bridge: &'a PickerBridge, replies: mpsc::UnboundedSender<MethodReply>) -> Self {
        Self {
            bridge,
            replies,
            pending: JoinSet::new(),
            stats: ServeStats::default(),
        }
    }

    fn accept(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        let call: MethodCall = match serde_json::from_str(line) {
            Ok(call) => call,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed method call");
                self.stats.malformed += 1;
                return;
            }
        };
        self.stats.calls += 1;

        let id = call.id;
        let rx = self.bridge.handle(&call);
        let replies = self.replies.clone();
        self.pending.spawn(async move {
            match rx.recv().await {
                Ok(response) => {
                    tracing::debug!(id, response = response.kind(), "replying");
                    replies.send(MethodReply { id, response }).is_ok()
                }
                Err(err) => {
                    tracing::warn!(id, error = %err, "no reply for call");
                    false
                }
            }
        });
        self.reap_finished();
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.pending.try_join_next() {
            self.stats.settle(joined);
        }
    }

    /// Wait up to `grace` for the remaining calls, then abort the rest.
    async fn drain(self, grace: Duration) -> ServeStats {
        let Self {
            mut pending,
            mut stats,
            replies,
            ..
        } = self;
        drop(replies);

        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = pending.join_next().await {
                stats.settle(joined);
            }
        })
        .await;
        if drained.is_err() {
            stats.unfinished = pending.len();
            tracing::warn!(
                unfinished = stats.unfinished,
                "input closed with picks still waiting on the user"
            );
            pending.abort_all();
        }
        // Aborted tasks release their senders, letting the writer finish.
        while pending.join_next().await.is_some() {}
        stats
    }
}

/// Serve calls from `reader` until EOF, then wait up to `grace` for
/// outstanding answers. Returns the writer and what happened.
pub async fn serve<R, W>(
    bridge: &PickerBridge,
    reader: R,
    writer: W,
    grace: Duration,
) -> anyhow::Result<(W, ServeStats)>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (reply_tx, reply_rx) = mpsc::unbounded_channel::<MethodReply>();
    let writer_task = tokio::spawn(write_replies(writer, reply_rx));

    let mut dispatcher = Dispatcher::new(bridge, reply_tx);
    let mut lines = reader.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => dispatcher.accept(&line),
                None => break,
            },
            Some(joined) = dispatcher.pending.join_next(), if !dispatcher.pending.is_empty() => {
                dispatcher.stats.settle(joined);
            }
        }
    }
    let stats = dispatcher.drain(grace).await;

    let writer = writer_task.await??;
    Ok((writer, stats))
}

async fn write_replies<W>(
    mut writer: W,
    mut replies: mpsc::UnboundedReceiver<MethodReply>,
) -> anyhow::Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(reply) = replies.recv().await {
        let mut line = serde_json::to_vec(&reply)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(writer)
}
