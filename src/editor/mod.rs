//! Editor session: the mutable block document, its history and its save
//! protocol.
//!
//! One `EditorSession` is created per open page and handed to the canvas via
//! context (constructor-injected, never a module-level singleton, so parallel
//! sessions in tests do not share state).
//!
//! Responsibilities:
//! - structural edits (insert/move/duplicate/remove/settings) with an
//!   immediate history snapshot
//! - content patches with a debounced, coalescing history snapshot
//! - two-phase deferred removal (cancellable while the exit animation runs)
//! - dirty tracking, debounced autosave, conflict detection/resolution
//!
//! Non-responsibilities: canvas rendering, drag-and-drop, rich-text editing.

use crate::api::{
    ApiClient, ApiErrorKind, ConflictResponse, PageDetail, SaveOutcome, SavePageRequest,
};
use crate::clipboard::{decode_block, encode_block, ClipboardPort};
use crate::document;
use crate::history::EditHistory;
use crate::models::{Block, BlockType, PageMeta};
use crate::sanitize::sanitize_blocks;
use crate::state::AppContext;
use crate::util::{clear_timeout, now_ms, set_timeout, TimerId};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Exit-animation window before a removed block is actually spliced out.
pub(crate) const REMOVAL_DELAY_MS: i32 = 200;
/// Coalescing window for rapid content edits (one history entry per pause).
pub(crate) const CONTENT_HISTORY_DEBOUNCE_MS: i32 = 500;
pub(crate) const AUTOSAVE_DEBOUNCE_MS: i32 = 800;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SaveStatus {
    Clean,
    Dirty,
    Saving,
    Error,
    Conflict,
}

impl SaveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SaveStatus::Clean => "Saved",
            SaveStatus::Dirty => "Unsaved changes",
            SaveStatus::Saving => "Saving...",
            SaveStatus::Error => "Save failed",
            SaveStatus::Conflict => "Conflict",
        }
    }
}

#[derive(Clone)]
pub(crate) struct EditorSession {
    app_state: AppContext,

    pub page_id: RwSignal<String>,
    pub meta: RwSignal<PageMeta>,
    pub blocks: RwSignal<Vec<Block>>,
    pub selected_id: RwSignal<Option<String>>,

    /// Blocks flagged for the exit transition; still addressable until the
    /// deferred splice fires.
    pub exiting_ids: RwSignal<Vec<String>>,

    pub status: RwSignal<SaveStatus>,
    pub save_error: RwSignal<Option<String>>,
    pub conflict: RwSignal<Option<ConflictResponse>>,
    pub last_saved_ms: RwSignal<Option<i64>>,

    pub loading: RwSignal<bool>,
    pub load_error: RwSignal<Option<String>>,

    history: RwSignal<EditHistory>,

    /// Concurrency token: the server `updated-at` we last observed. Only ever
    /// updated from a server response, never speculatively.
    save_token: RwSignal<String>,

    /// Bumped on every document load; stale timer callbacks check it and bail
    /// so they can never mutate a newly loaded document.
    generation: RwSignal<u64>,

    save_in_flight: RwSignal<bool>,
    resave_queued: RwSignal<bool>,
    content_history_pending: RwSignal<bool>,

    removal_timers: Arc<Mutex<HashMap<String, TimerId>>>,
    content_history_timer: Arc<Mutex<Option<TimerId>>>,
    autosave_timer: Arc<Mutex<Option<TimerId>>>,

    clipboard: Arc<dyn ClipboardPort>,
}

impl EditorSession {
    pub fn new(app_state: AppContext, clipboard: Arc<dyn ClipboardPort>) -> Self {
        Self {
            app_state,
            page_id: RwSignal::new(String::new()),
            meta: RwSignal::new(PageMeta::default()),
            blocks: RwSignal::new(vec![]),
            selected_id: RwSignal::new(None),
            exiting_ids: RwSignal::new(vec![]),
            status: RwSignal::new(SaveStatus::Clean),
            save_error: RwSignal::new(None),
            conflict: RwSignal::new(None),
            last_saved_ms: RwSignal::new(None),
            loading: RwSignal::new(false),
            load_error: RwSignal::new(None),
            history: RwSignal::new(EditHistory::default()),
            save_token: RwSignal::new(String::new()),
            generation: RwSignal::new(0),
            save_in_flight: RwSignal::new(false),
            resave_queued: RwSignal::new(false),
            content_history_pending: RwSignal::new(false),
            removal_timers: Arc::new(Mutex::new(HashMap::new())),
            content_history_timer: Arc::new(Mutex::new(None)),
            autosave_timer: Arc::new(Mutex::new(None)),
            clipboard,
        }
    }

    // ----- document lifecycle -------------------------------------------------

    /// Load a page from the backend, replacing the current document.
    ///
    /// Pending timers from the previous document are invalidated before the
    /// request goes out and a stale response is dropped on the floor.
    pub fn load_page(&self, page_id: String) {
        let gen = self.bump_generation();
        self.cancel_all_timers();

        self.page_id.set(page_id.clone());
        self.loading.set(true);
        self.load_error.set(None);

        let api_client = self.app_state.0.api_client.get_untracked();
        let s2 = self.clone();
        spawn_local(async move {
            let result = api_client.get_page(&page_id).await;
            if s2.generation.get_untracked() != gen {
                return;
            }
            match result {
                Ok(page) => s2.install_loaded(page),
                Err(e) => s2.load_error.set(Some(e.to_string())),
            }
            s2.loading.set(false);
        });
    }

    /// Seed the session from a loaded page: single-entry history, clean
    /// dirty/conflict state, no selection.
    pub fn install_loaded(&self, page: PageDetail) {
        self.page_id.set(page.id);
        self.meta.set(PageMeta {
            title: page.title,
            slug: page.slug,
            description: page.description,
            meta_title: page.meta_title,
            og_image: page.og_image,
            noindex: page.noindex,
        });
        self.save_token.set(page.updated_at);
        self.blocks.set(page.blocks.clone());
        self.selected_id.set(None);
        self.exiting_ids.set(vec![]);
        self.conflict.set(None);
        self.save_error.set(None);
        self.status.set(SaveStatus::Clean);
        self.content_history_pending.set(false);
        self.resave_queued.set(false);
        self.history.update(|h| h.reset(page.blocks));
    }

    fn bump_generation(&self) -> u64 {
        let next = self.generation.get_untracked().wrapping_add(1);
        self.generation.set(next);
        next
    }

    fn cancel_all_timers(&self) {
        self.cancel_pending_removals();
        if let Ok(mut slot) = self.content_history_timer.lock() {
            if let Some(tid) = slot.take() {
                clear_timeout(tid);
            }
        }
        if let Ok(mut slot) = self.autosave_timer.lock() {
            if let Some(tid) = slot.take() {
                clear_timeout(tid);
            }
        }
        self.content_history_pending.set(false);
    }

    // ----- dirty / history plumbing ------------------------------------------

    fn mark_dirty(&self) {
        self.save_error.set(None);
        // A conflict blocks saving until resolved; local edits keep piling
        // onto the local tree in the meantime.
        if self.conflict.get_untracked().is_some() {
            return;
        }
        if self.status.get_untracked() != SaveStatus::Saving {
            self.status.set(SaveStatus::Dirty);
        } else {
            // Edits during an in-flight save re-dirty once it resolves.
            self.resave_queued.set(true);
        }
        self.schedule_autosave();
    }

    /// Immediate snapshot for structural edits. Callers flush any pending
    /// coalesced content snapshot BEFORE mutating the tree, so content and
    /// structural steps never merge into one entry.
    fn record_structural(&self) {
        let snapshot = self.blocks.get_untracked();
        self.history.update(|h| h.record(snapshot));
    }

    fn after_structural_edit(&self) {
        self.record_structural();
        self.mark_dirty();
    }

    /// Push the settled content state as one history entry (debounce target).
    pub fn flush_content_history(&self) {
        if let Ok(mut slot) = self.content_history_timer.lock() {
            if let Some(tid) = slot.take() {
                clear_timeout(tid);
            }
        }
        if !self.content_history_pending.get_untracked() {
            return;
        }
        self.content_history_pending.set(false);
        let snapshot = self.blocks.get_untracked();
        self.history.update(|h| h.record(snapshot));
    }

    fn schedule_content_history(&self) {
        self.content_history_pending.set(true);
        let gen = self.generation.get_untracked();
        let s2 = self.clone();
        let tid = set_timeout(CONTENT_HISTORY_DEBOUNCE_MS, move || {
            if s2.generation.get_untracked() == gen {
                s2.flush_content_history();
            }
        });
        if let Ok(mut slot) = self.content_history_timer.lock() {
            if let Some(prev) = slot.take() {
                clear_timeout(prev);
            }
            *slot = tid;
        }
    }

    // ----- edit operations ----------------------------------------------------

    /// Insert a fresh block of `kind` at `index` (append when `None`) and
    /// select it.
    pub fn add_block(&self, kind: BlockType, index: Option<usize>) {
        self.flush_content_history();
        let block = Block::new(kind);
        let id = block.id.clone();
        self.blocks.update(|b| document::insert_at(b, block, index));
        self.selected_id.set(Some(id));
        self.after_structural_edit();
    }

    /// Column-scoped insert. Disallowed kinds (columns in a column) are a
    /// silent no-op.
    pub fn add_block_in_column(
        &self,
        columns_id: &str,
        slot_index: usize,
        kind: BlockType,
        index: Option<usize>,
    ) {
        self.flush_content_history();
        let block = Block::new(kind);
        let id = block.id.clone();
        let mut ok = false;
        self.blocks.update(|b| {
            ok = document::insert_in_column(b, columns_id, slot_index, block, index);
        });
        if ok {
            self.selected_id.set(Some(id));
            self.after_structural_edit();
        }
    }

    /// Phase one of removal: flag the block as exiting and arm the deferred
    /// splice. The block stays addressable until the delay elapses.
    pub fn request_remove(&self, id: &str) {
        if !document::contains_block(&self.blocks.get_untracked(), id) {
            return;
        }
        if self.selected_id.get_untracked().as_deref() == Some(id) {
            self.selected_id.set(None);
        }
        self.exiting_ids.update(|ids| {
            if !ids.iter().any(|x| x == id) {
                ids.push(id.to_string());
            }
        });

        let gen = self.generation.get_untracked();
        let id_owned = id.to_string();
        let s2 = self.clone();
        let id_for_timer = id_owned.clone();
        let tid = set_timeout(REMOVAL_DELAY_MS, move || {
            s2.finalize_remove(&id_for_timer, gen);
        });
        if let Ok(mut map) = self.removal_timers.lock() {
            if let Some(prev) = map.insert(id_owned, tid.unwrap_or(0)) {
                clear_timeout(prev);
            }
        }
    }

    /// Phase two: actually splice the block out, unless the removal was
    /// cancelled (undo/redo) or belongs to a previous document.
    pub fn finalize_remove(&self, id: &str, gen: u64) {
        if self.generation.get_untracked() != gen {
            return;
        }
        if let Ok(mut map) = self.removal_timers.lock() {
            map.remove(id);
        }
        let still_exiting = self.exiting_ids.get_untracked().iter().any(|x| x == id);
        if !still_exiting {
            return;
        }
        self.exiting_ids.update(|ids| ids.retain(|x| x != id));

        self.flush_content_history();
        let mut ok = false;
        self.blocks.update(|b| ok = document::remove_anywhere(b, id));
        if ok {
            self.after_structural_edit();
        }
    }

    /// Drop every armed removal and clear the exiting flags. Called by
    /// undo/redo and on document switch so a stale timer can never fire
    /// against a tree it no longer applies to.
    pub fn cancel_pending_removals(&self) {
        if let Ok(mut map) = self.removal_timers.lock() {
            for (_, tid) in map.drain() {
                clear_timeout(tid);
            }
        }
        self.exiting_ids.set(vec![]);
    }

    /// Reorder within the top level; out-of-range indices are a no-op.
    pub fn move_block(&self, from: usize, to: usize) {
        self.flush_content_history();
        let mut ok = false;
        self.blocks.update(|b| ok = document::move_at(b, from, to));
        if ok {
            self.after_structural_edit();
        }
    }

    pub fn move_block_in_column(&self, columns_id: &str, slot_index: usize, from: usize, to: usize) {
        self.flush_content_history();
        let mut ok = false;
        self.blocks
            .update(|b| ok = document::move_in_column(b, columns_id, slot_index, from, to));
        if ok {
            self.after_structural_edit();
        }
    }

    /// Deep clone with fresh ids, inserted right after the source; the clone
    /// becomes the selection.
    pub fn duplicate_block(&self, id: &str) {
        self.flush_content_history();
        let mut new_id = None;
        self.blocks
            .update(|b| new_id = document::duplicate_anywhere(b, id));
        if let Some(new_id) = new_id {
            self.selected_id.set(Some(new_id));
            self.after_structural_edit();
        }
    }

    /// Serialize the block (nested subtree included) into the clipboard slot.
    pub fn copy_block(&self, id: &str) {
        let blocks = self.blocks.get_untracked();
        let Some(block) = document::find_anywhere(&blocks, id) else {
            return;
        };
        if let Some(payload) = encode_block(block) {
            self.clipboard.write(&payload);
        }
    }

    /// Insert the clipboard block (fresh ids) after the current selection, or
    /// at the end when nothing is selected. Empty or malformed clipboard data
    /// is a silent no-op.
    pub fn paste_block(&self) {
        let Some(payload) = self.clipboard.read() else {
            return;
        };
        let Some(mut block) = decode_block(&payload) else {
            return;
        };
        self.flush_content_history();
        document::regenerate_ids(&mut block);
        let new_id = block.id.clone();

        let mut ok = false;
        match self.selected_id.get_untracked() {
            Some(target) if document::contains_block(&self.blocks.get_untracked(), &target) => {
                self.blocks
                    .update(|b| ok = document::insert_after_anywhere(b, &target, block));
            }
            _ => {
                self.blocks.update(|b| {
                    document::insert_at(b, block, None);
                    ok = true;
                });
            }
        }
        if ok {
            self.selected_id.set(Some(new_id));
            self.after_structural_edit();
        }
    }

    /// Shallow-merge a partial content object. The canvas updates instantly;
    /// the history entry is debounced so keystrokes coalesce.
    pub fn update_content(&self, id: &str, patch: serde_json::Value) {
        let mut ok = false;
        self.blocks
            .update(|b| ok = document::patch_content_anywhere(b, id, &patch));
        if ok {
            self.schedule_content_history();
            self.mark_dirty();
        }
    }

    /// Settings changes are structural: immediate history entry.
    pub fn update_settings(&self, id: &str, patch: serde_json::Value) {
        self.flush_content_history();
        let mut ok = false;
        self.blocks
            .update(|b| ok = document::patch_settings_anywhere(b, id, &patch));
        if ok {
            self.after_structural_edit();
        }
    }

    pub fn set_column_count(&self, columns_id: &str, count: usize) {
        self.flush_content_history();
        let mut ok = false;
        self.blocks
            .update(|b| ok = document::set_column_count(b, columns_id, count));
        if ok {
            self.after_structural_edit();
        }
    }

    pub fn set_column_widths(&self, columns_id: &str, widths: Vec<f32>) {
        self.flush_content_history();
        let mut ok = false;
        self.blocks
            .update(|b| ok = document::set_column_widths(b, columns_id, widths));
        if ok {
            self.after_structural_edit();
        }
    }

    /// Page metadata rides the autosave path but is not a history entry
    /// (history tracks the block tree only).
    pub fn update_meta(&self, f: impl FnOnce(&mut PageMeta)) {
        self.meta.update(f);
        self.mark_dirty();
    }

    // ----- undo / redo --------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.history.with(|h| h.can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.history.with(|h| h.can_redo())
    }

    /// Pending coalesced content is committed first, so one undo steps back
    /// over exactly the just-typed text and redo can restore it.
    pub fn undo(&self) {
        self.cancel_pending_removals();
        self.flush_content_history();

        let mut snapshot = None;
        self.history.update(|h| snapshot = h.undo());
        if let Some(snapshot) = snapshot {
            self.apply_history_snapshot(snapshot);
        }
    }

    pub fn redo(&self) {
        self.cancel_pending_removals();
        self.flush_content_history();

        let mut snapshot = None;
        self.history.update(|h| snapshot = h.redo());
        if let Some(snapshot) = snapshot {
            self.apply_history_snapshot(snapshot);
        }
    }

    fn apply_history_snapshot(&self, snapshot: Vec<Block>) {
        // Selection may point at a block the snapshot does not contain.
        if let Some(sel) = self.selected_id.get_untracked() {
            if !document::contains_block(&snapshot, &sel) {
                self.selected_id.set(None);
            }
        }
        self.blocks.set(snapshot);
        self.mark_dirty();
    }

    // ----- save / conflict protocol ------------------------------------------

    fn schedule_autosave(&self) {
        if self.conflict.get_untracked().is_some() {
            return;
        }
        let gen = self.generation.get_untracked();
        let s2 = self.clone();
        let tid = set_timeout(AUTOSAVE_DEBOUNCE_MS, move || {
            if s2.generation.get_untracked() == gen {
                s2.save();
            }
        });
        if let Ok(mut slot) = self.autosave_timer.lock() {
            if let Some(prev) = slot.take() {
                clear_timeout(prev);
            }
            *slot = tid;
        }
    }

    /// Attempt a save now. Blocked while a conflict is unresolved; a save
    /// already in flight queues a follow-up instead of racing it.
    pub fn save(&self) {
        if self.conflict.get_untracked().is_some() {
            return;
        }
        if self.save_in_flight.get_untracked() {
            self.resave_queued.set(true);
            return;
        }

        let meta = self.meta.get_untracked();
        let req = SavePageRequest {
            page_id: self.page_id.get_untracked(),
            title: meta.title,
            slug: meta.slug,
            description: meta.description,
            meta_title: meta.meta_title,
            og_image: meta.og_image,
            noindex: meta.noindex,
            // Nothing unsanitized ever crosses the persistence boundary.
            blocks: sanitize_blocks(&self.blocks.get_untracked()),
            expected_updated_at: self.save_token.get_untracked(),
        };

        self.save_in_flight.set(true);
        self.status.set(SaveStatus::Saving);

        let gen = self.generation.get_untracked();
        let api_client: ApiClient = self.app_state.0.api_client.get_untracked();
        let s2 = self.clone();
        spawn_local(async move {
            let result = api_client.save_page(&req).await;
            if s2.generation.get_untracked() != gen {
                s2.save_in_flight.set(false);
                return;
            }
            match result {
                Ok(SaveOutcome::Saved { updated_at }) => s2.apply_save_success(updated_at),
                Ok(SaveOutcome::Conflict(c)) => s2.apply_save_conflict(c),
                Err(e) if e.kind == ApiErrorKind::Unauthorized => {
                    s2.apply_save_failure("Session expired. Reload and sign in again.".to_string())
                }
                Err(e) => s2.apply_save_failure(e.to_string()),
            }
        });
    }

    /// Server accepted the save: adopt its token and settle to Clean unless
    /// edits arrived while the request was in flight.
    pub fn apply_save_success(&self, updated_at: String) {
        self.save_in_flight.set(false);
        self.save_token.set(updated_at);
        self.last_saved_ms.set(Some(now_ms()));

        if self.resave_queued.get_untracked() {
            self.resave_queued.set(false);
            self.status.set(SaveStatus::Dirty);
            self.schedule_autosave();
        } else {
            self.status.set(SaveStatus::Clean);
        }
    }

    /// Server reports another writer saved in the interim. Both copies are
    /// retained until the operator picks a side; saving is blocked meanwhile.
    pub fn apply_save_conflict(&self, conflict: ConflictResponse) {
        self.save_in_flight.set(false);
        self.resave_queued.set(false);
        self.conflict.set(Some(conflict));
        self.status.set(SaveStatus::Conflict);
    }

    /// Non-conflict failure: keep local edits, surface the message, wait for
    /// a manual retry or the next edit to re-arm autosave.
    pub fn apply_save_failure(&self, message: String) {
        self.save_in_flight.set(false);
        self.resave_queued.set(false);
        self.save_error.set(Some(message));
        self.status.set(SaveStatus::Error);
    }

    /// Keep the local tree, but adopt the server's token so the next save
    /// compares against the right baseline.
    pub fn resolve_keep_local(&self) {
        let Some(c) = self.conflict.get_untracked() else {
            return;
        };
        self.conflict.set(None);
        self.save_token.set(c.server_updated_at);
        self.status.set(SaveStatus::Dirty);
        self.schedule_autosave();
    }

    /// Discard local edits in favor of the server copy; history restarts from
    /// that copy.
    pub fn resolve_load_server(&self) {
        let Some(c) = self.conflict.get_untracked() else {
            return;
        };
        self.cancel_all_timers();
        self.conflict.set(None);
        self.meta.update(|m| m.title = c.server_title);
        self.save_token.set(c.server_updated_at);
        self.blocks.set(c.server_blocks.clone());
        self.selected_id.set(None);
        self.save_error.set(None);
        self.status.set(SaveStatus::Clean);
        self.history.update(|h| h.reset(c.server_blocks));
    }

    #[cfg(test)]
    pub(crate) fn history_len(&self) -> usize {
        self.history.with_untracked(|h| h.len())
    }

    #[cfg(test)]
    pub(crate) fn current_generation(&self) -> u64 {
        self.generation.get_untracked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::models::BlockData;
    use crate::state::AppState;

    fn page(blocks: Vec<Block>) -> PageDetail {
        PageDetail {
            id: "pg-1".to_string(),
            title: "Landing".to_string(),
            slug: "landing".to_string(),
            description: String::new(),
            meta_title: String::new(),
            og_image: String::new(),
            noindex: false,
            blocks,
            updated_at: "t0".to_string(),
        }
    }

    fn session_with(blocks: Vec<Block>) -> EditorSession {
        let s = EditorSession::new(
            AppContext(AppState::new()),
            Arc::new(MemoryClipboard::default()),
        );
        s.install_loaded(page(blocks));
        s
    }

    fn heading_text(s: &EditorSession, index: usize) -> String {
        match &s.blocks.get_untracked()[index].data {
            BlockData::Heading(h) => h.text.clone(),
            other => panic!("expected heading, got {other:?}"),
        }
    }

    #[test]
    fn test_load_seeds_clean_single_entry_history() {
        let s = session_with(vec![Block::new(BlockType::Text)]);
        assert_eq!(s.status.get_untracked(), SaveStatus::Clean);
        assert_eq!(s.history_len(), 1);
        assert!(!s.can_undo());
        assert!(!s.can_redo());
    }

    #[test]
    fn test_add_block_selects_dirties_and_records() {
        let s = session_with(vec![]);
        s.add_block(BlockType::Heading, None);

        let blocks = s.blocks.get_untracked();
        assert_eq!(blocks.len(), 1);
        assert_eq!(s.selected_id.get_untracked(), Some(blocks[0].id.clone()));
        assert_eq!(s.status.get_untracked(), SaveStatus::Dirty);
        assert_eq!(s.history_len(), 2);
    }

    #[test]
    fn test_columns_in_column_insert_is_silent_noop() {
        let s = session_with(vec![Block::new(BlockType::Columns)]);
        let columns_id = s.blocks.get_untracked()[0].id.clone();

        s.add_block_in_column(&columns_id, 0, BlockType::Columns, None);

        assert_eq!(s.history_len(), 1);
        assert_eq!(s.status.get_untracked(), SaveStatus::Clean);
    }

    #[test]
    fn test_content_patches_coalesce_into_one_entry() {
        let s = session_with(vec![Block::new(BlockType::Heading)]);
        let id = s.blocks.get_untracked()[0].id.clone();

        for text in ["h", "he", "hel", "hell", "hello"] {
            s.update_content(&id, serde_json::json!({"text": text}));
        }
        // Tree reflects the keystrokes immediately...
        assert_eq!(heading_text(&s, 0), "hello");
        assert_eq!(s.status.get_untracked(), SaveStatus::Dirty);
        // ...but no history entry lands until the debounce settles.
        assert_eq!(s.history_len(), 1);

        s.flush_content_history();
        assert_eq!(s.history_len(), 2);

        // A second flush without edits records nothing.
        s.flush_content_history();
        assert_eq!(s.history_len(), 2);
    }

    #[test]
    fn test_structural_edit_flushes_pending_content_first() {
        let s = session_with(vec![Block::new(BlockType::Heading)]);
        let id = s.blocks.get_untracked()[0].id.clone();

        s.update_content(&id, serde_json::json!({"text": "typed"}));
        s.add_block(BlockType::Divider, None);

        // Entry 1: load. Entry 2: settled content. Entry 3: structural.
        assert_eq!(s.history_len(), 3);

        s.undo();
        assert_eq!(s.blocks.get_untracked().len(), 1);
        assert_eq!(heading_text(&s, 0), "typed");
    }

    #[test]
    fn test_undo_redo_inverse_roundtrip() {
        let s = session_with(vec![]);
        s.add_block(BlockType::Heading, None);
        let before = s.blocks.get_untracked();

        s.add_block(BlockType::Text, None);
        let after = s.blocks.get_untracked();

        s.undo();
        assert_eq!(s.blocks.get_untracked(), before);
        s.redo();
        assert_eq!(s.blocks.get_untracked(), after);
        assert_eq!(s.status.get_untracked(), SaveStatus::Dirty);
    }

    #[test]
    fn test_undo_clears_dangling_selection() {
        let s = session_with(vec![]);
        s.add_block(BlockType::Heading, None);
        assert!(s.selected_id.get_untracked().is_some());

        s.undo();
        assert!(s.blocks.get_untracked().is_empty());
        assert!(s.selected_id.get_untracked().is_none());
    }

    #[test]
    fn test_deferred_removal_two_phase() {
        let s = session_with(vec![Block::new(BlockType::Text)]);
        let id = s.blocks.get_untracked()[0].id.clone();
        let gen = s.current_generation();

        s.selected_id.set(Some(id.clone()));
        s.request_remove(&id);

        // Phase one: flagged, deselected, still present.
        assert!(s.exiting_ids.get_untracked().contains(&id));
        assert!(s.selected_id.get_untracked().is_none());
        assert_eq!(s.blocks.get_untracked().len(), 1);
        assert_eq!(s.history_len(), 1);

        // Phase two (the timer firing).
        s.finalize_remove(&id, gen);
        assert!(s.blocks.get_untracked().is_empty());
        assert!(s.exiting_ids.get_untracked().is_empty());
        assert_eq!(s.history_len(), 2);
        assert_eq!(s.status.get_untracked(), SaveStatus::Dirty);
    }

    #[test]
    fn test_undo_cancels_deferred_removal() {
        let s = session_with(vec![]);
        s.add_block(BlockType::Text, None);
        let id = s.blocks.get_untracked()[0].id.clone();
        let gen = s.current_generation();

        s.request_remove(&id);
        s.undo();

        // The stale timer fires after the undo: it must be a no-op.
        s.finalize_remove(&id, gen);
        assert!(s.exiting_ids.get_untracked().is_empty());
        assert!(s.blocks.get_untracked().is_empty());
        // Redo restores the block; the cancelled removal never fires.
        s.redo();
        assert!(document::contains_block(&s.blocks.get_untracked(), &id));
        s.finalize_remove(&id, gen);
        assert!(document::contains_block(&s.blocks.get_untracked(), &id));
    }

    #[test]
    fn test_stale_generation_removal_is_noop() {
        let s = session_with(vec![Block::new(BlockType::Text)]);
        let id = s.blocks.get_untracked()[0].id.clone();
        let old_gen = s.current_generation();
        s.request_remove(&id);

        // Simulate a document switch before the timer fires.
        s.install_loaded(page(vec![Block::new(BlockType::Text)]));
        let kept = s.blocks.get_untracked();
        s.finalize_remove(&id, old_gen);
        assert_eq!(s.blocks.get_untracked(), kept);
    }

    #[test]
    fn test_move_out_of_range_records_nothing() {
        let s = session_with(vec![
            Block::new(BlockType::Text),
            Block::new(BlockType::Text),
            Block::new(BlockType::Text),
        ]);
        let before = s.blocks.get_untracked();

        s.move_block(5, 1);

        assert_eq!(s.blocks.get_untracked(), before);
        assert_eq!(s.history_len(), 1);
        assert_eq!(s.status.get_untracked(), SaveStatus::Clean);
    }

    #[test]
    fn test_copy_paste_after_selection() {
        let s = session_with(vec![]);
        s.add_block(BlockType::Heading, None);
        let x_id = s.blocks.get_untracked()[0].id.clone();
        s.update_content(&x_id, serde_json::json!({"text": "X"}));
        s.flush_content_history();

        s.add_block(BlockType::Text, None);
        let y_id = s.blocks.get_untracked()[1].id.clone();

        s.copy_block(&x_id);
        s.selected_id.set(Some(y_id.clone()));
        s.paste_block();

        let blocks = s.blocks.get_untracked();
        assert_eq!(blocks.len(), 3);
        // Pasted block lands right after Y...
        assert_eq!(blocks[1].id, y_id);
        let pasted = &blocks[2];
        // ...with a fresh id, equal content, and it is now selected.
        assert_ne!(pasted.id, x_id);
        assert_eq!(pasted.data, blocks[0].data);
        assert_eq!(s.selected_id.get_untracked(), Some(pasted.id.clone()));
    }

    #[test]
    fn test_paste_with_empty_or_garbage_clipboard_is_noop() {
        let clip = MemoryClipboard::default();
        let s = EditorSession::new(AppContext(AppState::new()), Arc::new(clip.clone()));
        s.install_loaded(page(vec![Block::new(BlockType::Text)]));

        s.paste_block();
        assert_eq!(s.blocks.get_untracked().len(), 1);

        clip.write("{broken json");
        s.paste_block();
        assert_eq!(s.blocks.get_untracked().len(), 1);
        assert_eq!(s.history_len(), 1);
    }

    #[test]
    fn test_paste_without_selection_appends() {
        let s = session_with(vec![Block::new(BlockType::Text)]);
        let id = s.blocks.get_untracked()[0].id.clone();
        s.copy_block(&id);
        s.selected_id.set(None);

        s.paste_block();
        let blocks = s.blocks.get_untracked();
        assert_eq!(blocks.len(), 2);
        assert_ne!(blocks[1].id, id);
    }

    #[test]
    fn test_save_success_settles_clean() {
        let s = session_with(vec![]);
        s.add_block(BlockType::Text, None);
        s.status.set(SaveStatus::Saving);
        s.save_in_flight.set(true);

        s.apply_save_success("t1".to_string());
        assert_eq!(s.status.get_untracked(), SaveStatus::Clean);
        assert_eq!(s.save_token.get_untracked(), "t1");
        assert!(s.last_saved_ms.get_untracked().is_some());
    }

    #[test]
    fn test_edit_during_save_stays_dirty_after_success() {
        let s = session_with(vec![]);
        s.status.set(SaveStatus::Saving);
        s.save_in_flight.set(true);

        // Edit arrives while the request is in flight.
        s.add_block(BlockType::Text, None);
        assert!(s.resave_queued.get_untracked());

        s.apply_save_success("t1".to_string());
        assert_eq!(s.status.get_untracked(), SaveStatus::Dirty);
    }

    #[test]
    fn test_save_failure_keeps_local_edits() {
        let s = session_with(vec![]);
        s.add_block(BlockType::Text, None);
        s.apply_save_failure("boom".to_string());

        assert_eq!(s.status.get_untracked(), SaveStatus::Error);
        assert_eq!(s.save_error.get_untracked().as_deref(), Some("boom"));
        assert_eq!(s.blocks.get_untracked().len(), 1);

        // The next edit clears the error and re-dirties.
        s.add_block(BlockType::Divider, None);
        assert_eq!(s.status.get_untracked(), SaveStatus::Dirty);
        assert!(s.save_error.get_untracked().is_none());
    }

    #[test]
    fn test_conflict_keep_local_adopts_server_token() {
        let s = session_with(vec![]);
        s.add_block(BlockType::Heading, None);
        let local = s.blocks.get_untracked();

        s.apply_save_conflict(ConflictResponse {
            server_title: "Other".to_string(),
            server_blocks: vec![Block::new(BlockType::Quote)],
            server_updated_at: "t9".to_string(),
        });
        assert_eq!(s.status.get_untracked(), SaveStatus::Conflict);

        s.resolve_keep_local();
        assert_eq!(s.blocks.get_untracked(), local);
        assert_eq!(s.save_token.get_untracked(), "t9");
        assert_eq!(s.status.get_untracked(), SaveStatus::Dirty);
        assert!(s.conflict.get_untracked().is_none());
    }

    #[test]
    fn test_conflict_load_server_replaces_document() {
        let s = session_with(vec![]);
        s.add_block(BlockType::Heading, None);

        let server_blocks = vec![Block::new(BlockType::Quote)];
        s.apply_save_conflict(ConflictResponse {
            server_title: "Server title".to_string(),
            server_blocks: server_blocks.clone(),
            server_updated_at: "t9".to_string(),
        });

        s.resolve_load_server();
        assert_eq!(s.blocks.get_untracked(), server_blocks);
        assert_eq!(s.meta.get_untracked().title, "Server title");
        assert_eq!(s.save_token.get_untracked(), "t9");
        assert_eq!(s.status.get_untracked(), SaveStatus::Clean);
        assert_eq!(s.history_len(), 1);
        assert!(!s.can_undo());
    }

    #[test]
    fn test_edits_while_conflicted_do_not_unblock_saving() {
        let s = session_with(vec![]);
        s.apply_save_conflict(ConflictResponse {
            server_title: String::new(),
            server_blocks: vec![],
            server_updated_at: "t9".to_string(),
        });

        s.add_block(BlockType::Text, None);
        assert_eq!(s.status.get_untracked(), SaveStatus::Conflict);

        // save() is blocked outright while unresolved.
        s.save();
        assert!(!s.save_in_flight.get_untracked());
    }

    #[test]
    fn test_settings_patch_is_structural() {
        let s = session_with(vec![Block::new(BlockType::Text)]);
        let id = s.blocks.get_untracked()[0].id.clone();

        s.update_settings(&id, serde_json::json!({"hidden": true}));
        assert_eq!(s.history_len(), 2);
        assert!(s.blocks.get_untracked()[0].settings.hidden());
    }

    #[test]
    fn test_column_resize_preserves_blocks() {
        let s = session_with(vec![Block::new(BlockType::Columns)]);
        let columns_id = s.blocks.get_untracked()[0].id.clone();
        s.add_block_in_column(&columns_id, 1, BlockType::Text, None);

        s.set_column_count(&columns_id, 1);
        let BlockData::Columns(c) = &s.blocks.get_untracked()[0].data else {
            panic!()
        };
        assert_eq!(c.columns.len(), 1);
        assert_eq!(c.columns[0].blocks.len(), 1, "vacated slot merged, not dropped");
    }
}
