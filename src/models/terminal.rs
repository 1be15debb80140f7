use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result record produced by the external execution service and relayed
/// between room members exactly as received, `null` fields included.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct ExecutionResult(pub Map<String, Value>);

impl ExecutionResult {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}
