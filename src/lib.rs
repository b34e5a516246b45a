mod api;
mod app;
mod clipboard;
mod components;
mod document;
mod editor;
mod history;
mod models;
mod pages;
mod sanitize;
mod state;
mod storage;
mod util;

use app::App;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::clipboard::{decode_block, encode_block, ClipboardPort, LocalStorageClipboard};
    use crate::models::{Block, BlockType};
    use crate::storage::{load_string_from_storage, save_string_to_storage};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_clipboard_roundtrip_via_local_storage() {
        let clip = LocalStorageClipboard;
        let block = Block::new(BlockType::Button);
        clip.write(&encode_block(&block).expect("encode"));

        let decoded = decode_block(&clip.read().expect("payload")).expect("decode");
        assert_eq!(decoded, block);
    }

    #[wasm_bindgen_test]
    fn test_string_storage_roundtrip() {
        save_string_to_storage("pagecraft_test_key", "v1");
        assert_eq!(
            load_string_from_storage("pagecraft_test_key").as_deref(),
            Some("v1")
        );
    }
}
