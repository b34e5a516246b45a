pub(crate) const TOKEN_KEY: &str = "pagecraft_token";

/// Process-wide clipboard slot. Lives outside any document's lifecycle so a
/// copied block survives navigating between pages.
pub(crate) const CLIPBOARD_KEY: &str = "pagecraft_clipboard_block";

#[cfg(target_arch = "wasm32")]
pub(crate) fn load_string_from_storage(key: &str) -> Option<String> {
    let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten())?;
    storage.get_item(key).ok().flatten()
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn load_string_from_storage(_key: &str) -> Option<String> {
    None
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn save_string_to_storage(key: &str, value: &str) {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.set_item(key, value);
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn save_string_to_storage(_key: &str, _value: &str) {}
