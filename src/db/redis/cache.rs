use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ActivityRecord, ContentRecord, Recommendation, RecordId};
use crate::services::catalog_fingerprint;
use crate::services::similarity_cache::push_field;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Recommendations { user_id: RecordId, fingerprint: Uuid },
}

impl CacheKey {
    /// Key for one user's recommendations over a given catalog and activity snapshot
    ///
    /// Besides the text in the catalog fingerprint, view counts and content
    /// types are hashed since they drive cold-start ranking and reasons.
    /// Only the user's own activity feeds the fingerprint, so activity by
    /// other users does not invalidate the entry.
    pub fn recommendations(
        user_id: &RecordId,
        catalog: &[ContentRecord],
        activity: &[ActivityRecord],
        top_n: usize,
    ) -> Self {
        let mut bytes = catalog_fingerprint(catalog).as_bytes().to_vec();
        bytes.extend_from_slice(&(top_n as u64).to_be_bytes());
        for record in catalog {
            bytes.extend_from_slice(&record.view_count.to_be_bytes());
            push_field(&mut bytes, record.content_type.to_string().as_bytes());
        }
        for record in activity.iter().filter(|a| &a.user_id == user_id) {
            push_field(&mut bytes, record.content_id.as_str().as_bytes());
            let content_type = record.content_type.map(|t| t.to_string()).unwrap_or_default();
            push_field(&mut bytes, content_type.as_bytes());
        }

        CacheKey::Recommendations {
            user_id: user_id.clone(),
            fingerprint: Uuid::new_v5(&Uuid::NAMESPACE_OID, &bytes),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Recommendations {
                user_id,
                fingerprint,
            } => write!(f, "recs:{}:{}", user_id, fingerprint.simple()),
        }
    }
}

/// Storage for finished recommendation lists
///
/// Writes are fire-and-forget so a slow cache never delays a response.
#[async_trait::async_trait]
pub trait RecommendationCache: Send + Sync {
    async fn get_recommendations(&self, key: &CacheKey) -> AppResult<Option<Vec<Recommendation>>>;

    fn put_recommendations(&self, key: &CacheKey, recommendations: &[Recommendation], ttl: u64);
}

/// Creates a Redis client for caching
///
/// Does not connect; connections are opened per operation.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

struct PendingWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed recommendation cache with a background writer task
#[derive(Clone)]
pub struct Cache {
    client: Client,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer to flush queued writes and waits until it has stopped
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");

        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task failed");
        }
    }
}

impl Cache {
    /// Creates the cache and spawns its writer on the current runtime
    pub fn spawn(client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(Self::writer_task(client.clone(), write_rx, shutdown_rx));

        (
            Self { client, write_tx },
            CacheWriterHandle { shutdown_tx, task },
        )
    }

    async fn writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    if let Err(e) = Self::write(&client, write).await {
                        tracing::error!(error = %e, "Failed to write recommendations to Redis");
                    }
                }
                _ = shutdown_rx.recv() => {
                    // drain without blocking on senders that are still alive
                    write_rx.close();
                    let mut flushed = 0;
                    while let Some(write) = write_rx.recv().await {
                        match Self::write(&client, write).await {
                            Ok(()) => flushed += 1,
                            Err(e) => tracing::error!(error = %e, "Failed to flush cache write during shutdown"),
                        }
                    }
                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write(client: &Client, write: PendingWrite) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(write.key, write.value, write.ttl).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecommendationCache for Cache {
    async fn get_recommendations(&self, key: &CacheKey) -> AppResult<Option<Vec<Recommendation>>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        cached
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })
            })
            .transpose()
    }

    fn put_recommendations(&self, key: &CacheKey, recommendations: &[Recommendation], ttl: u64) {
        let value = match serde_json::to_string(recommendations) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            value,
            ttl,
        };

        if self.write_tx.send(write).is_err() {
            tracing::error!("Cache writer is gone, dropping write");
        }
    }
}
