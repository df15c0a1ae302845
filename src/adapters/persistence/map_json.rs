//! Implements CorrelationPort using a JSON file.
//!
//! One flat JSON object, shared with the cron-era deployments of this bot:
//! - `"<telegramMessageId>": <ticketId>` routes an admin reply to its ticket
//! - `"alerted_<ticketId>_<latestMsgIdOrInitial>": true` marks an alert as sent
//!
//! Loaded once at startup; additions are staged in memory; `save()` rewrites
//! the whole document. Entries are never pruned. Concurrent notifier runs can
//! lose each other's writes (documented limitation).

use crate::domain::DomainError;
use crate::ports::CorrelationPort;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

const ALERTED_PREFIX: &str = "alerted_";

/// In-memory view of the map document.
#[derive(Debug, Default)]
struct MapData {
    /// Outbound Telegram message id -> ticket id.
    routes: HashMap<i64, i64>,
    /// Dedup keys (`<ticketId>_<latestMsgIdOrInitial>`, prefix stripped).
    alerted: HashSet<String>,
}

impl MapData {
    /// Parse the flat JSON document. Unrecognized keys are skipped, older
    /// deployments stored ticket ids as digit strings, both forms are accepted.
    fn from_document(doc: &serde_json::Map<String, Value>) -> Self {
        let mut data = MapData::default();
        for (key, value) in doc {
            if let Some(dedup_key) = key.strip_prefix(ALERTED_PREFIX) {
                if value.as_bool() == Some(true) {
                    data.alerted.insert(dedup_key.to_string());
                }
            } else if let Ok(message_id) = key.parse::<i64>() {
                let ticket_id = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.parse::<i64>().ok(),
                    _ => None,
                };
                if let Some(ticket_id) = ticket_id {
                    data.routes.insert(message_id, ticket_id);
                }
            } else {
                debug!(key = %key, "skipping unrecognized map entry");
            }
        }
        data
    }

    fn to_document(&self) -> serde_json::Map<String, Value> {
        let mut doc = serde_json::Map::new();
        for (message_id, ticket_id) in &self.routes {
            doc.insert(message_id.to_string(), Value::from(*ticket_id));
        }
        for dedup_key in &self.alerted {
            doc.insert(format!("{}{}", ALERTED_PREFIX, dedup_key), Value::Bool(true));
        }
        doc
    }
}

/// JSON file-based correlation map.
pub struct JsonCorrelationMap {
    path: std::path::PathBuf,
    cache: tokio::sync::RwLock<MapData>,
}

impl JsonCorrelationMap {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: tokio::sync::RwLock::new(MapData::default()),
        }
    }

    /// Load the map from disk. Fails open: a missing or malformed file yields
    /// an empty map and never errors the caller.
    pub async fn load(&self) -> Result<(), DomainError> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(s) => match serde_json::from_str::<Value>(&s) {
                Ok(Value::Object(doc)) => MapData::from_document(&doc),
                _ => {
                    debug!(path = %self.path.display(), "malformed map file, starting empty");
                    MapData::default()
                }
            },
            Err(_) => MapData::default(),
        };
        *self.cache.write().await = data;
        Ok(())
    }

    /// Atomic save using the write-replace pattern: write a temp file, flush,
    /// then rename over the target so a crash mid-write cannot truncate the map.
    async fn persist(&self) -> Result<(), DomainError> {
        let doc = Value::Object(self.cache.read().await.to_document());
        let json = serde_json::to_string_pretty(&doc)
            .map_err(|e| DomainError::Correlation(e.to_string()))?;

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| DomainError::Correlation(format!("create map dir: {}", e)))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::Correlation(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::Correlation(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::Correlation(format!("sync temp file: {}", e)))?;
        drop(f);

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::Correlation(format!("atomic rename failed: {}", e)))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl CorrelationPort for JsonCorrelationMap {
    async fn ticket_for_message(&self, message_id: i64) -> Result<Option<i64>, DomainError> {
        let cache = self.cache.read().await;
        Ok(cache.routes.get(&message_id).copied())
    }

    async fn is_alerted(&self, dedup_key: &str) -> Result<bool, DomainError> {
        let cache = self.cache.read().await;
        Ok(cache.alerted.contains(dedup_key))
    }

    async fn record_sent(&self, message_id: i64, ticket_id: i64) -> Result<(), DomainError> {
        let mut cache = self.cache.write().await;
        cache.routes.insert(message_id, ticket_id);
        Ok(())
    }

    async fn mark_alerted(&self, dedup_key: &str) -> Result<(), DomainError> {
        let mut cache = self.cache.write().await;
        cache.alerted.insert(dedup_key.to_string());
        Ok(())
    }

    async fn save(&self) -> Result<(), DomainError> {
        self.persist().await
    }
}
