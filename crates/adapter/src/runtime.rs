//! Session runtime - a single owner thread behind an async handle
//!
//! [`SessionHandle::spawn`] moves the session onto a dedicated thread that drains a tokio
//! `mpsc` channel. Every grid mutation happens on that thread; async callers send a
//! request and wait for the reply on a `oneshot`.

use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};

use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::Session;

/// Requests buffered before senders wait
pub const MAX_PENDING_REQUESTS: usize = 64;

/// Payload delivered to the owner thread
#[derive(Debug, Clone)]
pub enum Inbound {
    Line(String),
    Message(ClientMessage),
}

struct Request {
    inbound: Inbound,
    reply: oneshot::Sender<Vec<ServerMessage>>,
}

pub struct SessionHandle {
    tx: mpsc::Sender<Request>,
    worker: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn spawn(mut session: Session) -> Result<Self> {
        let (tx, mut rx) = mpsc::channel::<Request>(MAX_PENDING_REQUESTS);
        let worker = thread::Builder::new()
            .name("dotmatch-session".to_string())
            .spawn(move || {
                while let Some(req) = rx.blocking_recv() {
                    let out = match req.inbound {
                        Inbound::Line(line) => session.handle_line(&line),
                        Inbound::Message(msg) => session.handle(msg),
                    };
                    // The caller may have given up waiting.
                    let _ = req.reply.send(out);
                }
            })
            .context("failed to spawn session thread")?;
        Ok(Self {
            tx,
            worker: Some(worker),
        })
    }

    pub async fn request(&self, msg: ClientMessage) -> Result<Vec<ServerMessage>> {
        self.send(Inbound::Message(msg)).await
    }

    pub async fn request_line(&self, line: impl Into<String>) -> Result<Vec<ServerMessage>> {
        self.send(Inbound::Line(line.into())).await
    }

    async fn send(&self, inbound: Inbound) -> Result<Vec<ServerMessage>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request { inbound, reply })
            .await
            .map_err(|_| anyhow!("session thread has stopped"))?;
        rx.await.context("session dropped the request")
    }

    /// Close the channel and wait for the owner thread to finish
    pub fn shutdown(mut self) -> Result<()> {
        self.join()
    }

    fn join(&mut self) -> Result<()> {
        let (closed, _) = mpsc::channel(1);
        drop(std::mem::replace(&mut self.tx, closed));
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| anyhow!("session thread panicked"))?;
        }
        Ok(())
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        let _ = self.join();
    }
}

/// Serve a line protocol: one request per input line, every reply written as a line.
/// Blank lines are skipped. Returns the number of requests handled.
pub async fn serve_lines<R, W>(handle: &SessionHandle, reader: R, mut writer: W) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0;
    while let Some(line) = lines.next_line().await.context("failed to read request")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        for msg in handle.request_line(line).await? {
            let mut bytes = serde_json::to_vec(&msg).context("failed to encode reply")?;
            bytes.push(b'\n');
            writer.write_all(&bytes).await.context("failed to write reply")?;
        }
        writer.flush().await.context("failed to flush replies")?;
        handled += 1;
    }
    Ok(handled)
}
