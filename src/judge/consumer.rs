//! Redis Stream consumer for judge results

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use redis::aio::ConnectionManager;

use crate::{
    config::JudgeConfig,
    constants::{RESULT_CLAIM_MIN_IDLE_MS, RESULT_STREAM_BLOCK_MS},
    error::ApplyError,
    judge::{
        applier::{ApplyOutcome, ResultApplier},
        dispatcher::JOB_PAYLOAD_FIELD,
    },
    models::JudgeOutcome,
};

/// Entries read per XREADGROUP call
const READ_BATCH: usize = 16;

/// One entry read from the result stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: String,
    /// `None` when the entry has no payload field (or was trimmed)
    pub payload: Option<String>,
}

/// What to do with an entry after processing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    /// Leave pending so it is redelivered
    Retry,
}

/// Decide whether an apply result settles the entry
pub fn disposition(result: &Result<ApplyOutcome, ApplyError>) -> Disposition {
    match result {
        Ok(_) => Disposition::Ack,
        Err(e) if e.is_retryable() => Disposition::Retry,
        Err(_) => Disposition::Ack,
    }
}

/// Reads judge results from a consumer group and applies them
pub struct ResultConsumer {
    redis: ConnectionManager,
    applier: Arc<ResultApplier>,
    stream: String,
    group: String,
    consumer: String,
    shutdown: Arc<AtomicBool>,
}

impl ResultConsumer {
    pub fn new(
        redis: ConnectionManager,
        applier: Arc<ResultApplier>,
        config: &JudgeConfig,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            redis,
            applier,
            stream: config.result_stream.clone(),
            group: config.result_group.clone(),
            consumer: config.consumer_name.clone(),
            shutdown,
        }
    }

    /// Create the consumer group (ignore error if it already exists)
    pub async fn initialize(&self) -> Result<()> {
        let mut conn = self.redis.clone();

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.stream)
            .arg(&self.group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(()) => {
                tracing::info!(
                    stream = %self.stream,
                    group = %self.group,
                    "Created judge result consumer group"
                );
            }
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                tracing::debug!("Judge result consumer group already exists");
            }
            Err(e) => return Err(anyhow!("Failed to create consumer group: {}", e)),
        }

        Ok(())
    }

    /// Run the consumer loop until shutdown
    pub async fn run(self) -> Result<()> {
        tracing::info!(
            consumer = %self.consumer,
            group = %self.group,
            "Starting judge result consumer"
        );

        self.initialize().await?;
        if let Err(e) = self.claim_idle_entries().await {
            tracing::warn!(error = %e, "Failed to claim idle judge results");
        }

        // Start on our own pending list so claimed and unacked entries are replayed
        let mut cursor = ReadCursor::Backlog;

        while !self.shutdown.load(Ordering::SeqCst) {
            let step = match self.process_batch(cursor).await {
                Ok(batch) if batch.retry => BatchStep::Retry,
                Ok(batch) => BatchStep::Settled { read: batch.read },
                Err(e) => {
                    let err_msg = e.to_string();
                    tracing::error!(error = %err_msg, "Error reading judge results");

                    if err_msg.contains("NOGROUP") {
                        tracing::warn!("Consumer group missing, re-initializing...");
                        if let Err(init_err) = self.initialize().await {
                            tracing::error!(error = %init_err, "Failed to re-initialize consumer group");
                        }
                    }
                    BatchStep::Failed
                }
            };

            cursor = cursor.advance(step);
            if step.should_pause() {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }

        tracing::info!("Judge result consumer shutting down");
        Ok(())
    }

    /// Take over entries other consumers left unacknowledged
    async fn claim_idle_entries(&self) -> Result<()> {
        let mut conn = self.redis.clone();

        let pending: Vec<(String, String, u64, u64)> = redis::cmd("XPENDING")
            .arg(&self.stream)
            .arg(&self.group)
            .arg("-")
            .arg("+")
            .arg(100)
            .query_async(&mut conn)
            .await?;

        for (entry_id, owner, idle_ms, deliveries) in pending {
            if owner == self.consumer || idle_ms < RESULT_CLAIM_MIN_IDLE_MS {
                continue;
            }

            tracing::info!(
                entry_id = %entry_id,
                previous_owner = %owner,
                deliveries,
                "Claiming abandoned judge result"
            );

            let _: redis::Value = redis::cmd("XCLAIM")
                .arg(&self.stream)
                .arg(&self.group)
                .arg(&self.consumer)
                .arg(RESULT_CLAIM_MIN_IDLE_MS)
                .arg(&entry_id)
                .arg("JUSTID")
                .query_async(&mut conn)
                .await?;
        }

        Ok(())
    }

    async fn process_batch(&self, cursor: ReadCursor) -> Result<BatchResult> {
        let mut conn = self.redis.clone();

        let response: redis::Value = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.group)
            .arg(&self.consumer)
            .arg("COUNT")
            .arg(READ_BATCH)
            .arg("BLOCK")
            .arg(RESULT_STREAM_BLOCK_MS)
            .arg("STREAMS")
            .arg(&self.stream)
            .arg(cursor.start_id())
            .query_async(&mut conn)
            .await?;

        let entries = parse_read_response(&response)?;
        let mut batch = BatchResult {
            read: entries.len(),
            retry: false,
        };

        for entry in entries {
            match self.process_entry(&entry).await {
                Disposition::Ack => self.ack(&entry.id).await?,
                Disposition::Retry => batch.retry = true,
            }
        }

        Ok(batch)
    }

    async fn process_entry(&self, entry: &StreamEntry) -> Disposition {
        let outcome = match entry
            .payload
            .as_deref()
            .map(serde_json::from_str::<JudgeOutcome>)
        {
            Some(Ok(outcome)) => outcome,
            Some(Err(e)) => {
                tracing::warn!(entry_id = %entry.id, error = %e, "Dropping undecodable judge result");
                return Disposition::Ack;
            }
            None => {
                tracing::warn!(entry_id = %entry.id, "Dropping judge result without payload");
                return Disposition::Ack;
            }
        };

        let result = self.applier.apply(&outcome).await;
        match &result {
            Ok(_) => {}
            Err(ApplyError::NotFound(id)) => {
                tracing::warn!(submission_id = id, "Judge result for unknown submission");
            }
            Err(e) if e.is_retryable() => {
                tracing::error!(
                    submission_id = outcome.submission_id,
                    error = %e,
                    "Failed to apply judge result, will retry"
                );
            }
            Err(e) => {
                tracing::error!(
                    submission_id = outcome.submission_id,
                    error = %e,
                    "Rejected judge result"
                );
            }
        }

        disposition(&result)
    }

    async fn ack(&self, entry_id: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        let _: i64 = redis::cmd("XACK")
            .arg(&self.stream)
            .arg(&self.group)
            .arg(entry_id)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

struct BatchResult {
    read: usize,
    retry: bool,
}

/// Where the next XREADGROUP starts reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadCursor {
    /// Entries already delivered to this consumer but not acked
    Backlog,
    /// Entries never delivered to any consumer
    New,
}

/// How a batch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStep {
    /// Every entry read was acked
    Settled { read: usize },
    /// At least one entry was left pending for redelivery
    Retry,
    /// The batch aborted part way; read entries may be unacked
    Failed,
}

impl BatchStep {
    pub fn should_pause(&self) -> bool {
        !matches!(self, Self::Settled { .. })
    }
}

impl ReadCursor {
    pub fn start_id(&self) -> &'static str {
        match self {
            Self::Backlog => "0",
            Self::New => ">",
        }
    }

    /// Stay on the backlog until a read comes back empty; return to it
    /// whenever entries may be left unacked
    pub fn advance(self, step: BatchStep) -> Self {
        match step {
            BatchStep::Retry | BatchStep::Failed => Self::Backlog,
            BatchStep::Settled { read: 0 } => Self::New,
            BatchStep::Settled { .. } => self,
        }
    }
}

/// Parse an XREADGROUP reply for a single stream
///
/// Shape: `[[stream_name, [[entry_id, [field, value, ...]], ...]]]`, or nil
/// when the block timed out.
pub fn parse_read_response(response: &redis::Value) -> Result<Vec<StreamEntry>> {
    let streams = match response {
        redis::Value::Nil => return Ok(Vec::new()),
        redis::Value::Array(streams) => streams,
        _ => return Err(anyhow!("Invalid stream response format")),
    };

    let Some(redis::Value::Array(stream)) = streams.first() else {
        return Ok(Vec::new());
    };

    let messages = match stream.get(1) {
        Some(redis::Value::Array(messages)) => messages,
        Some(redis::Value::Nil) | None => return Ok(Vec::new()),
        _ => return Err(anyhow!("Invalid stream entries")),
    };

    messages.iter().map(parse_entry).collect()
}

fn parse_entry(message: &redis::Value) -> Result<StreamEntry> {
    let redis::Value::Array(parts) = message else {
        return Err(anyhow!("Invalid stream entry"));
    };

    let id = match parts.first() {
        Some(redis::Value::BulkString(id)) => String::from_utf8_lossy(id).to_string(),
        _ => return Err(anyhow!("Invalid entry ID")),
    };

    let payload = match parts.get(1) {
        Some(redis::Value::Array(fields)) => fields.chunks(2).find_map(|chunk| match chunk {
            [redis::Value::BulkString(key), redis::Value::BulkString(value)]
                if key.as_slice() == JOB_PAYLOAD_FIELD.as_bytes() =>
            {
                Some(String::from_utf8_lossy(value).to_string())
            }
            _ => None,
        }),
        _ => None,
    };

    Ok(StreamEntry { id, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::SubmissionStatus;

    fn bulk(s: &str) -> redis::Value {
        redis::Value::BulkString(s.as_bytes().to_vec())
    }

    #[test]
    fn test_parse_read_response() {
        let response = redis::Value::Array(vec![redis::Value::Array(vec![
            bulk("judge-result-topic"),
            redis::Value::Array(vec![
                redis::Value::Array(vec![
                    bulk("1700000000000-0"),
                    redis::Value::Array(vec![
                        bulk("payload"),
                        bulk(r#"{"submissionId":3,"status":"ACCEPTED"}"#),
                    ]),
                ]),
                redis::Value::Array(vec![bulk("1700000000000-1"), redis::Value::Nil]),
            ]),
        ])]);

        let entries = parse_read_response(&response).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "1700000000000-0");
        assert_eq!(
            entries[0].payload.as_deref(),
            Some(r#"{"submissionId":3,"status":"ACCEPTED"}"#)
        );
        assert_eq!(entries[1].payload, None);
    }

    #[test]
    fn test_parse_timeout_is_empty() {
        assert!(parse_read_response(&redis::Value::Nil).unwrap().is_empty());
    }

    #[test]
    fn test_cursor_drains_backlog_before_new_entries() {
        let cursor = ReadCursor::Backlog;
        assert_eq!(cursor.start_id(), "0");

        let cursor = cursor.advance(BatchStep::Settled { read: 16 });
        assert_eq!(cursor, ReadCursor::Backlog);

        let cursor = cursor.advance(BatchStep::Settled { read: 0 });
        assert_eq!(cursor, ReadCursor::New);
        assert_eq!(cursor.start_id(), ">");

        assert_eq!(cursor.advance(BatchStep::Settled { read: 3 }), ReadCursor::New);
    }

    #[test]
    fn test_cursor_returns_to_backlog_after_lost_acks() {
        // A failed XACK mid-batch leaves read entries in our own pending list
        assert_eq!(ReadCursor::New.advance(BatchStep::Failed), ReadCursor::Backlog);
        assert_eq!(ReadCursor::New.advance(BatchStep::Retry), ReadCursor::Backlog);
        assert_eq!(ReadCursor::Backlog.advance(BatchStep::Failed), ReadCursor::Backlog);

        assert!(BatchStep::Failed.should_pause());
        assert!(BatchStep::Retry.should_pause());
        assert!(!BatchStep::Settled { read: 0 }.should_pause());
    }

    #[test]
    fn test_disposition() {
        let applied: Result<ApplyOutcome, ApplyError> = Ok(ApplyOutcome::AlreadyApplied {
            status: SubmissionStatus::Accepted,
        });
        assert_eq!(disposition(&applied), Disposition::Ack);
        assert_eq!(disposition(&Err(ApplyError::NotFound(1))), Disposition::Ack);
        assert_eq!(
            disposition(&Err(ApplyError::Store(AppError::Database("down".into())))),
            Disposition::Retry
        );
    }
}
