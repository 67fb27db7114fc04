//! Newline-delimited JSON bridge for the host command channel.
//!
//! Reads `CommandEnvelope` lines, dispatches each one through a
//! [`SessionCommandHandler`] on its own task, and writes `ResponseEnvelope`
//! lines back. Every session state change is also written as a
//! `session.updated` `EventEnvelope` carrying the full snapshot.
//!
//! When running over stdio, stdout is exclusively reserved for the JSON
//! protocol; all diagnostic output (tracing, logs) must be routed to stderr.

use crate::driver::SessionDriver;
use crate::error::{Result, StackrankError};
use crate::host::contract::{
    CommandEnvelope, CommandName, EventEnvelope, ResponseEnvelope, SESSION_UPDATED_EVENT,
};
use crate::host::handler::SessionCommandHandler;
use stackrank_gateway::AnswerGateway;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

type SharedWriter<W> = Arc<Mutex<BufWriter<W>>>;

/// Run the bridge over the process's stdin and stdout.
pub async fn run_stdio_bridge<G: AnswerGateway + 'static>(driver: SessionDriver<G>) -> Result<()> {
    run_bridge(driver, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Run the bridge until `input` closes or a `runtime.stop` command is
/// received.
///
/// Two kinds of task operate concurrently:
///
/// 1. **Command tasks** -- one per command line, so a pending search does
///    not hold up a view change or a snapshot request.
/// 2. **Event forwarder** -- writes a `session.updated` event for every
///    published snapshot.
///
/// On end of input the bridge waits for in-flight commands to answer. On
/// `runtime.stop` it answers the stop and abandons them.
pub async fn run_bridge<G, R, W>(driver: SessionDriver<G>, input: R, output: W) -> Result<()>
where
    G: AnswerGateway + 'static,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let writer: SharedWriter<W> = Arc::new(Mutex::new(BufWriter::new(output)));
    let event_handle = tokio::spawn(forward_events(driver.clone(), Arc::clone(&writer)));
    let handler = SessionCommandHandler::new(driver);

    let mut commands = JoinSet::new();
    let reader_result = run_reader(&handler, input, &writer, &mut commands).await;

    match &reader_result {
        Ok(ReaderExit::EndOfInput) => {
            while let Some(joined) = commands.join_next().await {
                if let Err(e) = joined {
                    tracing::warn!(error = %e, "host command task failed");
                }
            }
        }
        Ok(ReaderExit::Stopped) | Err(_) => commands.shutdown().await,
    }

    event_handle.abort();
    let _ = event_handle.await;

    reader_result.map(|_| ())
}

enum ReaderExit {
    EndOfInput,
    Stopped,
}

/// Read command lines and spawn a dispatch task for each.
async fn run_reader<G, R, W>(
    handler: &SessionCommandHandler<G>,
    input: R,
    writer: &SharedWriter<W>,
    commands: &mut JoinSet<()>,
) -> Result<ReaderExit>
where
    G: AnswerGateway + 'static,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut reader = BufReader::new(input);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| StackrankError::Channel(format!("failed to read command: {e}")))?;

        if bytes_read == 0 {
            tracing::info!("input closed (EOF); shutting down host bridge");
            return Ok(ReaderExit::EndOfInput);
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let envelope: CommandEnvelope = match serde_json::from_str(trimmed) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse command envelope");
                let response = ResponseEnvelope::error(
                    "parse-error",
                    format!("failed to parse command envelope: {e}"),
                );
                write_json(writer, &response).await?;
                continue;
            }
        };

        if envelope.command == CommandName::RuntimeStop {
            let response = handler.handle(&envelope).await;
            write_json(writer, &response).await?;
            tracing::info!("runtime.stop received; shutting down host bridge");
            return Ok(ReaderExit::Stopped);
        }

        reap_finished(commands);
        let handler = handler.clone();
        let writer = Arc::clone(writer);
        commands.spawn(async move {
            let response = handler.handle(&envelope).await;
            if let Err(e) = write_json(&writer, &response).await {
                tracing::warn!(
                    request_id = %response.request_id,
                    error = %e,
                    "failed to write response envelope"
                );
            }
        });
    }
}

/// Drop finished command tasks so the set only holds in-flight commands.
fn reap_finished(commands: &mut JoinSet<()>) {
    while let Some(joined) = commands.try_join_next() {
        if let Err(e) = joined {
            tracing::warn!(error = %e, "host command task failed");
        }
    }
}

/// Write one `session.updated` event per published snapshot.
async fn forward_events<G, W>(driver: SessionDriver<G>, writer: SharedWriter<W>)
where
    G: AnswerGateway + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut updates = driver.subscribe();
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        let payload = match serde_json::to_value(&snapshot) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize snapshot; skipping event");
                continue;
            }
        };
        let event = EventEnvelope::new(
            uuid::Uuid::new_v4().to_string(),
            SESSION_UPDATED_EVENT,
            payload,
        );
        if let Err(e) = write_json(&writer, &event).await {
            tracing::warn!(error = %e, "failed to write event envelope; stopping event forwarder");
            break;
        }
    }
}

/// Serialize `value` as a single JSON line and flush it.
async fn write_json<W, T>(writer: &SharedWriter<W>, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let json = serde_json::to_string(value)
        .map_err(|e| StackrankError::Protocol(format!("failed to serialize envelope: {e}")))?;
    let mut w = writer.lock().await;
    w.write_all(json.as_bytes())
        .await
        .map_err(|e| StackrankError::Channel(format!("failed to write output: {e}")))?;
    w.write_all(b"\n")
        .await
        .map_err(|e| StackrankError::Channel(format!("failed to write newline: {e}")))?;
    w.flush()
        .await
        .map_err(|e| StackrankError::Channel(format!("failed to flush output: {e}")))?;
    Ok(())
}
