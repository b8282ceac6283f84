use serde_json::Value;

/// Read side of whatever holds the host's configuration.
pub trait ConfigSource: Send + Sync {
    /// Value stored at a dotted path (e.g. `jwt.app`), if any.
    fn read(&self, namespace: &str) -> Option<Value>;
}
