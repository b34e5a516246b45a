pub(crate) type TimerId = i32;

#[cfg(target_arch = "wasm32")]
pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Fresh opaque block id. Ids are regenerated on duplicate/paste, never reused.
pub(crate) fn new_block_id() -> String {
    let mut buf = [0u8; 8];
    let _ = getrandom::getrandom(&mut buf);
    let mut id = String::with_capacity(20);
    id.push_str("blk-");
    for b in buf {
        id.push_str(&format!("{b:02x}"));
    }
    id
}

/// Schedule a one-shot browser timer.
///
/// Returns `None` outside wasm (there is no event loop to fire it); native
/// tests invoke the callback's target method directly instead.
#[cfg(target_arch = "wasm32")]
pub(crate) fn set_timeout(ms: i32, f: impl FnOnce() + 'static) -> Option<TimerId> {
    use wasm_bindgen::JsCast;

    let win = web_sys::window()?;
    let cb = wasm_bindgen::closure::Closure::once_into_js(f);
    win.set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), ms)
        .ok()
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn set_timeout(_ms: i32, _f: impl FnOnce() + 'static) -> Option<TimerId> {
    None
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn clear_timeout(id: TimerId) {
    if let Some(win) = web_sys::window() {
        win.clear_timeout_with_handle(id);
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn clear_timeout(_id: TimerId) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_block_id_shape_and_uniqueness() {
        let a = new_block_id();
        let b = new_block_id();
        assert!(a.starts_with("blk-"));
        assert_eq!(a.len(), 20);
        assert_ne!(a, b);
    }

    #[test]
    fn test_native_timers_are_inert() {
        assert!(set_timeout(100, || {}).is_none());
        clear_timeout(0);
    }
}
