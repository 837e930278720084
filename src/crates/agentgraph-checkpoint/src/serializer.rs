//! Byte encoding of checkpoints for durable stores

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Converts values to and from the bytes a store writes
pub trait SerializerProtocol: Send + Sync {
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T>;
}

/// JSON encoding, optionally pretty-printed
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output, easier to inspect on disk
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl SerializerProtocol for JsonSerializer {
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        if self.pretty {
            Ok(serde_json::to_vec_pretty(value)?)
        } else {
            Ok(serde_json::to_vec(value)?)
        }
    }

    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_pretty_output_is_indented() {
        let bytes = JsonSerializer::pretty().dumps(&json!({"a": 1})).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains('\n'));
    }

    #[test]
    fn test_loads_rejects_garbage() {
        let result: Result<Value> = JsonSerializer::new().loads(b"{not json");
        assert!(result.is_err());
    }
}
