//! Response cache hook.
//!
//! The engine itself never persists anything between runs; a caller that
//! wants to reuse expensive probe responses across sessions supplies an
//! implementation of this trait. Thread-safety and eviction policy are the
//! implementation's business.

use async_trait::async_trait;
use serde_json::Value;

/// A caller-supplied response cache.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value);
    async fn delete(&self, key: &str);
    async fn clear(&self);
}
