//! Copy/paste channel for single blocks.
//!
//! The clipboard is an injected capability rather than a hidden global, so the
//! persistence mechanism (localStorage in the browser, memory in tests) stays
//! a pluggable detail and editor sessions never share state by accident.

use crate::models::Block;
use crate::storage::{load_string_from_storage, save_string_to_storage, CLIPBOARD_KEY};
use std::sync::{Arc, Mutex};

/// One serialized block, at most. Payloads are opaque JSON strings; malformed
/// data is treated as an empty clipboard by the consumer.
pub(crate) trait ClipboardPort: Send + Sync {
    fn read(&self) -> Option<String>;
    fn write(&self, payload: &str);
}

pub(crate) fn encode_block(block: &Block) -> Option<String> {
    serde_json::to_string(block).ok()
}

/// `None` when the payload is empty, unparsable or missing required fields.
pub(crate) fn decode_block(payload: &str) -> Option<Block> {
    if payload.trim().is_empty() {
        return None;
    }
    serde_json::from_str::<Block>(payload)
        .ok()
        .filter(|b| !b.id.trim().is_empty())
}

/// Browser clipboard slot backed by localStorage (survives page navigation).
#[derive(Clone, Default)]
pub(crate) struct LocalStorageClipboard;

impl ClipboardPort for LocalStorageClipboard {
    fn read(&self) -> Option<String> {
        load_string_from_storage(CLIPBOARD_KEY)
    }

    fn write(&self, payload: &str) {
        save_string_to_storage(CLIPBOARD_KEY, payload);
    }
}

/// In-memory slot for native tests.
#[derive(Clone, Default)]
pub(crate) struct MemoryClipboard {
    slot: Arc<Mutex<Option<String>>>,
}

impl ClipboardPort for MemoryClipboard {
    fn read(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }

    fn write(&self, payload: &str) {
        if let Ok(mut s) = self.slot.lock() {
            *s = Some(payload.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockType;

    #[test]
    fn test_memory_clipboard_roundtrip() {
        let clip = MemoryClipboard::default();
        assert!(clip.read().is_none());

        let block = Block::new(BlockType::Quote);
        clip.write(&encode_block(&block).expect("encode"));

        let decoded = decode_block(&clip.read().expect("payload")).expect("decode");
        assert_eq!(decoded, block);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_block("").is_none());
        assert!(decode_block("   ").is_none());
        assert!(decode_block("{not json").is_none());
        assert!(decode_block(r#"{"type":"text","content":{}}"#).is_none());
        assert!(decode_block(r#"{"id":"","type":"text","content":{}}"#).is_none());
    }
}
