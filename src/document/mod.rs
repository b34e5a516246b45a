//! Pure, synchronous operations over the block tree.
//!
//! Everything here is free of signals and timers so the editing semantics can
//! be exercised natively. Invalid input (unknown id, out-of-range index,
//! disallowed nesting) is a no-op; callers use the returned `bool` to decide
//! whether an edit actually happened and deserves a history entry.

use crate::models::{Block, BlockData, ColumnSlot};
use crate::util::new_block_id;

/// Find a block by id, searching the top level first, then every column slot.
pub(crate) fn find_anywhere<'a>(blocks: &'a [Block], id: &str) -> Option<&'a Block> {
    for b in blocks {
        if b.id == id {
            return Some(b);
        }
        if let BlockData::Columns(c) = &b.data {
            for slot in &c.columns {
                if let Some(found) = slot.blocks.iter().find(|x| x.id == id) {
                    return Some(found);
                }
            }
        }
    }
    None
}

pub(crate) fn contains_block(blocks: &[Block], id: &str) -> bool {
    find_anywhere(blocks, id).is_some()
}

/// Every id in the tree, column slots included.
#[allow(dead_code)]
pub(crate) fn collect_ids(blocks: &[Block]) -> Vec<String> {
    let mut out = Vec::new();
    for b in blocks {
        out.push(b.id.clone());
        if let BlockData::Columns(c) = &b.data {
            for slot in &c.columns {
                for inner in &slot.blocks {
                    out.push(inner.id.clone());
                }
            }
        }
    }
    out
}

/// Give the block (and, recursively, every block in its slots) fresh ids.
/// Clones must never reuse the source's identifiers.
pub(crate) fn regenerate_ids(block: &mut Block) {
    block.id = new_block_id();
    if let BlockData::Columns(c) = &mut block.data {
        for slot in &mut c.columns {
            for inner in &mut slot.blocks {
                inner.id = new_block_id();
            }
        }
    }
}

/// Insert at `index` (clamped), or append when `index` is `None`.
pub(crate) fn insert_at(blocks: &mut Vec<Block>, block: Block, index: Option<usize>) {
    match index {
        Some(i) => blocks.insert(i.min(blocks.len()), block),
        None => blocks.push(block),
    }
}

/// Insert into one slot of a columns block. Columns-in-column is rejected
/// (nesting is capped at depth 1), as is an unknown target.
pub(crate) fn insert_in_column(
    blocks: &mut [Block],
    columns_id: &str,
    slot_index: usize,
    block: Block,
    index: Option<usize>,
) -> bool {
    if block.is_columns() {
        return false;
    }
    let Some(parent) = blocks.iter_mut().find(|b| b.id == columns_id) else {
        return false;
    };
    let BlockData::Columns(c) = &mut parent.data else {
        return false;
    };
    let Some(slot) = c.columns.get_mut(slot_index) else {
        return false;
    };
    insert_at(&mut slot.blocks, block, index);
    true
}

/// Splice a block out of the tree wherever it lives.
pub(crate) fn remove_anywhere(blocks: &mut Vec<Block>, id: &str) -> bool {
    if let Some(i) = blocks.iter().position(|b| b.id == id) {
        blocks.remove(i);
        return true;
    }
    for b in blocks.iter_mut() {
        if let BlockData::Columns(c) = &mut b.data {
            for slot in &mut c.columns {
                if let Some(i) = slot.blocks.iter().position(|x| x.id == id) {
                    slot.blocks.remove(i);
                    return true;
                }
            }
        }
    }
    false
}

fn move_within(list: &mut Vec<Block>, from: usize, to: usize) -> bool {
    if from >= list.len() || to >= list.len() || from == to {
        return false;
    }
    let b = list.remove(from);
    list.insert(to, b);
    true
}

/// Reorder within the top level. Out-of-range indices are a no-op.
pub(crate) fn move_at(blocks: &mut Vec<Block>, from: usize, to: usize) -> bool {
    move_within(blocks, from, to)
}

/// Reorder within one column slot.
pub(crate) fn move_in_column(
    blocks: &mut [Block],
    columns_id: &str,
    slot_index: usize,
    from: usize,
    to: usize,
) -> bool {
    let Some(parent) = blocks.iter_mut().find(|b| b.id == columns_id) else {
        return false;
    };
    let BlockData::Columns(c) = &mut parent.data else {
        return false;
    };
    let Some(slot) = c.columns.get_mut(slot_index) else {
        return false;
    };
    move_within(&mut slot.blocks, from, to)
}

/// Deep-clone a block with regenerated ids and insert the clone immediately
/// after the source in the same container. Returns the clone's id.
pub(crate) fn duplicate_anywhere(blocks: &mut Vec<Block>, id: &str) -> Option<String> {
    if let Some(i) = blocks.iter().position(|b| b.id == id) {
        let mut clone = blocks[i].clone();
        regenerate_ids(&mut clone);
        let new_id = clone.id.clone();
        blocks.insert(i + 1, clone);
        return Some(new_id);
    }
    for b in blocks.iter_mut() {
        if let BlockData::Columns(c) = &mut b.data {
            for slot in &mut c.columns {
                if let Some(i) = slot.blocks.iter().position(|x| x.id == id) {
                    let mut clone = slot.blocks[i].clone();
                    regenerate_ids(&mut clone);
                    let new_id = clone.id.clone();
                    slot.blocks.insert(i + 1, clone);
                    return Some(new_id);
                }
            }
        }
    }
    None
}

/// Insert `block` immediately after `target_id` in whichever container the
/// target lives in. Pasting a columns block next to a slot-nested target is
/// rejected to preserve the depth-1 cap.
pub(crate) fn insert_after_anywhere(blocks: &mut Vec<Block>, target_id: &str, block: Block) -> bool {
    if let Some(i) = blocks.iter().position(|b| b.id == target_id) {
        blocks.insert(i + 1, block);
        return true;
    }
    for b in blocks.iter_mut() {
        if let BlockData::Columns(c) = &mut b.data {
            for slot in &mut c.columns {
                if let Some(i) = slot.blocks.iter().position(|x| x.id == target_id) {
                    if block.is_columns() {
                        return false;
                    }
                    slot.blocks.insert(i + 1, block);
                    return true;
                }
            }
        }
    }
    false
}

/// Shallow-merge `patch` into the variant content of `data`.
///
/// Works through the serialized form so callers can patch any variant with a
/// plain JSON object; a patch that breaks the content shape leaves the block
/// unchanged.
pub(crate) fn merge_content(data: &mut BlockData, patch: &serde_json::Value) -> bool {
    let Some(patch_obj) = patch.as_object() else {
        return false;
    };
    let Ok(mut v) = serde_json::to_value(&*data) else {
        return false;
    };
    let Some(content) = v.get_mut("content").and_then(|c| c.as_object_mut()) else {
        return false;
    };
    for (k, val) in patch_obj {
        content.insert(k.clone(), val.clone());
    }
    match serde_json::from_value::<BlockData>(v) {
        Ok(next) => {
            *data = next;
            true
        }
        Err(_) => false,
    }
}

fn for_block_anywhere(
    blocks: &mut [Block],
    id: &str,
    f: impl FnOnce(&mut Block) -> bool,
) -> bool {
    for b in blocks.iter_mut() {
        if b.id == id {
            return f(b);
        }
        if let BlockData::Columns(c) = &mut b.data {
            for slot in &mut c.columns {
                if let Some(inner) = slot.blocks.iter_mut().find(|x| x.id == id) {
                    return f(inner);
                }
            }
        }
    }
    false
}

pub(crate) fn patch_content_anywhere(
    blocks: &mut [Block],
    id: &str,
    patch: &serde_json::Value,
) -> bool {
    for_block_anywhere(blocks, id, |b| merge_content(&mut b.data, patch))
}

pub(crate) fn patch_settings_anywhere(
    blocks: &mut [Block],
    id: &str,
    patch: &serde_json::Value,
) -> bool {
    for_block_anywhere(blocks, id, |b| {
        if !patch.is_object() {
            return false;
        }
        b.settings.merge(patch);
        true
    })
}

/// Change the slot count of a columns block.
///
/// Growing appends empty slots; shrinking merges each vacated slot's blocks
/// into the preceding surviving slot so no content is discarded. Widths are
/// reset (the canvas falls back to equal widths).
pub(crate) fn set_column_count(blocks: &mut [Block], columns_id: &str, count: usize) -> bool {
    let count = count.clamp(1, 4);
    let Some(parent) = blocks.iter_mut().find(|b| b.id == columns_id) else {
        return false;
    };
    let BlockData::Columns(c) = &mut parent.data else {
        return false;
    };
    if c.columns.len() == count {
        return false;
    }

    if count > c.columns.len() {
        c.columns.resize_with(count, ColumnSlot::default);
    } else {
        let vacated: Vec<ColumnSlot> = c.columns.drain(count..).collect();
        let last = &mut c.columns[count - 1];
        for slot in vacated {
            last.blocks.extend(slot.blocks);
        }
    }
    c.column_widths = None;
    true
}

pub(crate) fn set_column_widths(blocks: &mut [Block], columns_id: &str, widths: Vec<f32>) -> bool {
    let Some(parent) = blocks.iter_mut().find(|b| b.id == columns_id) else {
        return false;
    };
    let BlockData::Columns(c) = &mut parent.data else {
        return false;
    };
    if widths.len() != c.columns.len() {
        return false;
    }
    c.column_widths = Some(widths);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockType, ColumnsContent};
    use std::collections::HashSet;

    fn heading(text: &str) -> Block {
        let mut b = Block::new(BlockType::Heading);
        merge_content(&mut b.data, &serde_json::json!({"text": text}));
        b
    }

    fn columns_with(slot_a: Vec<Block>, slot_b: Vec<Block>) -> Block {
        let mut b = Block::new(BlockType::Columns);
        b.data = BlockData::Columns(ColumnsContent {
            columns: vec![ColumnSlot { blocks: slot_a }, ColumnSlot { blocks: slot_b }],
            column_widths: None,
        });
        b
    }

    fn assert_unique_ids(blocks: &[Block]) {
        let ids = collect_ids(blocks);
        let set: HashSet<&String> = ids.iter().collect();
        assert_eq!(set.len(), ids.len(), "duplicate id in tree: {ids:?}");
    }

    #[test]
    fn test_insert_and_ids_stay_unique() {
        let mut tree = vec![];
        insert_at(&mut tree, Block::new(BlockType::Heading), None);
        insert_at(&mut tree, Block::new(BlockType::Text), Some(0));
        insert_at(&mut tree, Block::new(BlockType::Image), Some(99));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[0].kind(), BlockType::Text);
        assert_unique_ids(&tree);
    }

    #[test]
    fn test_columns_in_column_is_rejected() {
        let mut tree = vec![Block::new(BlockType::Columns)];
        let columns_id = tree[0].id.clone();
        let before = tree.clone();

        let ok = insert_in_column(
            &mut tree,
            &columns_id,
            0,
            Block::new(BlockType::Columns),
            None,
        );
        assert!(!ok);
        assert_eq!(tree, before);
    }

    #[test]
    fn test_insert_in_column_bad_slot_is_noop() {
        let mut tree = vec![Block::new(BlockType::Columns)];
        let columns_id = tree[0].id.clone();
        assert!(!insert_in_column(
            &mut tree,
            &columns_id,
            5,
            Block::new(BlockType::Text),
            None,
        ));
    }

    #[test]
    fn test_move_out_of_range_is_noop() {
        let mut tree = vec![heading("a"), heading("b"), heading("c")];
        let before = tree.clone();
        assert!(!move_at(&mut tree, 5, 1));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_move_reorders_top_level() {
        let mut tree = vec![heading("a"), heading("b"), heading("c")];
        assert!(move_at(&mut tree, 0, 2));
        let texts: Vec<_> = tree
            .iter()
            .map(|b| match &b.data {
                BlockData::Heading(h) => h.text.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(texts, ["b", "c", "a"]);
    }

    #[test]
    fn test_duplicate_columns_regenerates_nested_ids() {
        let a = heading("A");
        let b = Block::new(BlockType::Text);
        let a_id = a.id.clone();
        let b_id = b.id.clone();
        let mut tree = vec![columns_with(vec![a], vec![b])];
        let src_id = tree[0].id.clone();

        let clone_id = duplicate_anywhere(&mut tree, &src_id).expect("duplicate should succeed");

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[1].id, clone_id);
        assert_unique_ids(&tree);

        let BlockData::Columns(c) = &tree[1].data else {
            panic!("clone should be columns");
        };
        let cloned_ids: Vec<_> = c
            .columns
            .iter()
            .flat_map(|s| s.blocks.iter().map(|x| x.id.clone()))
            .collect();
        assert_eq!(cloned_ids.len(), 2);
        assert!(!cloned_ids.contains(&a_id));
        assert!(!cloned_ids.contains(&b_id));

        // Content is copied verbatim apart from the ids.
        let BlockData::Heading(h) = &c.columns[0].blocks[0].data else {
            panic!("expected heading in first slot");
        };
        assert_eq!(h.text, "A");
    }

    #[test]
    fn test_duplicate_inside_slot_inserts_after_source() {
        let a = heading("A");
        let a_id = a.id.clone();
        let mut tree = vec![columns_with(vec![a, heading("B")], vec![])];

        duplicate_anywhere(&mut tree, &a_id).expect("duplicate in slot");

        let BlockData::Columns(c) = &tree[0].data else {
            panic!()
        };
        assert_eq!(c.columns[0].blocks.len(), 3);
        assert_eq!(c.columns[0].blocks[0].id, a_id);
        assert_unique_ids(&tree);
    }

    #[test]
    fn test_remove_anywhere_reaches_slots() {
        let a = heading("A");
        let a_id = a.id.clone();
        let mut tree = vec![heading("top"), columns_with(vec![a], vec![])];

        assert!(remove_anywhere(&mut tree, &a_id));
        assert!(!contains_block(&tree, &a_id));
        assert!(!remove_anywhere(&mut tree, "no-such-id"));
    }

    #[test]
    fn test_patch_content_shallow_merges() {
        let mut tree = vec![heading("before")];
        let id = tree[0].id.clone();

        assert!(patch_content_anywhere(
            &mut tree,
            &id,
            &serde_json::json!({"text": "after"}),
        ));
        let BlockData::Heading(h) = &tree[0].data else {
            panic!()
        };
        assert_eq!(h.text, "after");
        assert_eq!(h.level, 2, "untouched fields survive the merge");
    }

    #[test]
    fn test_patch_content_bad_shape_is_noop() {
        let mut tree = vec![heading("keep")];
        let id = tree[0].id.clone();
        let before = tree.clone();

        assert!(!patch_content_anywhere(
            &mut tree,
            &id,
            &serde_json::json!({"level": "not-a-number"}),
        ));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_patch_settings_anywhere() {
        let a = heading("A");
        let a_id = a.id.clone();
        let mut tree = vec![columns_with(vec![a], vec![])];

        assert!(patch_settings_anywhere(
            &mut tree,
            &a_id,
            &serde_json::json!({"hidden": true}),
        ));
        let found = find_anywhere(&tree, &a_id).expect("still present");
        assert!(found.settings.hidden());
    }

    #[test]
    fn test_grow_columns_appends_empty_slot() {
        let mut tree = vec![columns_with(vec![heading("A")], vec![heading("B")])];
        let id = tree[0].id.clone();

        assert!(set_column_count(&mut tree, &id, 3));
        let BlockData::Columns(c) = &tree[0].data else {
            panic!()
        };
        assert_eq!(c.columns.len(), 3);
        assert!(c.columns[2].blocks.is_empty());
        assert_eq!(c.columns[0].blocks.len(), 1);
    }

    #[test]
    fn test_shrink_columns_merges_into_preceding_slot() {
        let mut b = Block::new(BlockType::Columns);
        b.data = BlockData::Columns(ColumnsContent {
            columns: vec![
                ColumnSlot {
                    blocks: vec![heading("A")],
                },
                ColumnSlot {
                    blocks: vec![heading("B")],
                },
                ColumnSlot {
                    blocks: vec![heading("C1"), heading("C2")],
                },
            ],
            column_widths: Some(vec![0.3, 0.3, 0.4]),
        });
        let id = b.id.clone();
        let mut tree = vec![b];

        assert!(set_column_count(&mut tree, &id, 2));
        let BlockData::Columns(c) = &tree[0].data else {
            panic!()
        };
        assert_eq!(c.columns.len(), 2);
        // Slot 1 keeps B and absorbs C1, C2 in order.
        assert_eq!(c.columns[1].blocks.len(), 3);
        assert!(c.column_widths.is_none());
        assert_unique_ids(&tree);
    }

    #[test]
    fn test_set_column_widths_requires_matching_len() {
        let mut tree = vec![Block::new(BlockType::Columns)];
        let id = tree[0].id.clone();
        assert!(!set_column_widths(&mut tree, &id, vec![0.5]));
        assert!(set_column_widths(&mut tree, &id, vec![0.3, 0.7]));
    }

    #[test]
    fn test_insert_after_anywhere_respects_nesting_cap() {
        let a = heading("A");
        let a_id = a.id.clone();
        let mut tree = vec![columns_with(vec![a], vec![])];

        // A text block lands next to the nested target.
        assert!(insert_after_anywhere(
            &mut tree,
            &a_id,
            Block::new(BlockType::Text),
        ));
        // A columns block does not.
        assert!(!insert_after_anywhere(
            &mut tree,
            &a_id,
            Block::new(BlockType::Columns),
        ));
        assert_unique_ids(&tree);
    }
}
