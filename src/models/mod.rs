use crate::util::new_block_id;
use serde::{Deserialize, Serialize};

/// Closed set of block kinds the builder understands.
///
/// `Display` gives the lowercase wire/palette name; `EnumIter` drives the
/// insert palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum BlockType {
    Heading,
    Text,
    Image,
    Button,
    Spacer,
    Divider,
    Columns,
    Video,
    Quote,
    Form,
    Code,
    Social,
    Accordion,
    Table,
    Toc,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct HeadingContent {
    pub text: String,
    pub level: u8,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct TextContent {
    pub html: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ImageContent {
    pub src: String,
    pub alt: String,
    pub caption: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ButtonContent {
    pub label: String,
    pub href: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct SpacerContent {
    pub height: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DividerContent {}

/// One slot of a columns block. Slots never hold another columns block.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ColumnSlot {
    pub blocks: Vec<Block>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ColumnsContent {
    pub columns: Vec<ColumnSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_widths: Option<Vec<f32>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct VideoContent {
    pub url: String,
    pub caption: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct QuoteContent {
    pub text: String,
    pub attribution: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct FormField {
    pub name: String,
    pub label: String,
    pub kind: String,
    pub required: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct FormContent {
    pub fields: Vec<FormField>,
    pub submit_label: String,
    pub action: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct CodeContent {
    pub code: String,
    pub language: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct SocialLink {
    pub network: String,
    pub url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct SocialContent {
    pub links: Vec<SocialLink>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct AccordionItem {
    pub title: String,
    pub body: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct AccordionContent {
    pub items: Vec<AccordionItem>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct TableContent {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct TocContent {
    pub max_level: u8,
}

/// Kind + variant-specific content, adjacently tagged so the persisted JSON is
/// `{ "type": "heading", "content": { ... } }`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub(crate) enum BlockData {
    Heading(HeadingContent),
    Text(TextContent),
    Image(ImageContent),
    Button(ButtonContent),
    Spacer(SpacerContent),
    Divider(DividerContent),
    Columns(ColumnsContent),
    Video(VideoContent),
    Quote(QuoteContent),
    Form(FormContent),
    Code(CodeContent),
    Social(SocialContent),
    Accordion(AccordionContent),
    Table(TableContent),
    Toc(TocContent),
}

impl BlockData {
    pub fn kind(&self) -> BlockType {
        match self {
            BlockData::Heading(_) => BlockType::Heading,
            BlockData::Text(_) => BlockType::Text,
            BlockData::Image(_) => BlockType::Image,
            BlockData::Button(_) => BlockType::Button,
            BlockData::Spacer(_) => BlockType::Spacer,
            BlockData::Divider(_) => BlockType::Divider,
            BlockData::Columns(_) => BlockType::Columns,
            BlockData::Video(_) => BlockType::Video,
            BlockData::Quote(_) => BlockType::Quote,
            BlockData::Form(_) => BlockType::Form,
            BlockData::Code(_) => BlockType::Code,
            BlockData::Social(_) => BlockType::Social,
            BlockData::Accordion(_) => BlockType::Accordion,
            BlockData::Table(_) => BlockType::Table,
            BlockData::Toc(_) => BlockType::Toc,
        }
    }

    /// Default content used when the palette inserts a fresh block.
    pub fn default_for(kind: BlockType) -> Self {
        match kind {
            BlockType::Heading => BlockData::Heading(HeadingContent {
                text: "New heading".to_string(),
                level: 2,
            }),
            BlockType::Text => BlockData::Text(TextContent {
                html: "<p>New text</p>".to_string(),
            }),
            BlockType::Image => BlockData::Image(ImageContent::default()),
            BlockType::Button => BlockData::Button(ButtonContent {
                label: "Click me".to_string(),
                href: "#".to_string(),
            }),
            BlockType::Spacer => BlockData::Spacer(SpacerContent { height: 32 }),
            BlockType::Divider => BlockData::Divider(DividerContent {}),
            BlockType::Columns => BlockData::Columns(ColumnsContent {
                columns: vec![ColumnSlot::default(), ColumnSlot::default()],
                column_widths: None,
            }),
            BlockType::Video => BlockData::Video(VideoContent::default()),
            BlockType::Quote => BlockData::Quote(QuoteContent::default()),
            BlockType::Form => BlockData::Form(FormContent {
                fields: vec![
                    FormField {
                        name: "name".to_string(),
                        label: "Name".to_string(),
                        kind: "text".to_string(),
                        required: false,
                    },
                    FormField {
                        name: "email".to_string(),
                        label: "Email".to_string(),
                        kind: "email".to_string(),
                        required: true,
                    },
                ],
                submit_label: "Submit".to_string(),
                action: String::new(),
            }),
            BlockType::Code => BlockData::Code(CodeContent {
                code: String::new(),
                language: "html".to_string(),
            }),
            BlockType::Social => BlockData::Social(SocialContent::default()),
            BlockType::Accordion => BlockData::Accordion(AccordionContent {
                items: vec![AccordionItem {
                    title: "Section".to_string(),
                    body: String::new(),
                }],
            }),
            BlockType::Table => BlockData::Table(TableContent {
                header: vec!["Column 1".to_string(), "Column 2".to_string()],
                rows: vec![vec![String::new(), String::new()]],
            }),
            BlockType::Toc => BlockData::Toc(TocContent { max_level: 3 }),
        }
    }
}

/// Variant-agnostic bag of presentational options (alignment, colors,
/// spacing, `hidden`, ...). Kept schemaless so the canvas and the public
/// renderer can evolve options without a model migration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub(crate) struct BlockSettings {
    #[serde(flatten)]
    pub values: serde_json::Map<String, serde_json::Value>,
}

impl BlockSettings {
    pub fn hidden(&self) -> bool {
        self.values
            .get("hidden")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Shallow merge: top-level keys of `patch` overwrite, `null` deletes.
    pub fn merge(&mut self, patch: &serde_json::Value) {
        let Some(obj) = patch.as_object() else {
            return;
        };
        for (k, v) in obj {
            if v.is_null() {
                self.values.remove(k);
            } else {
                self.values.insert(k.clone(), v.clone());
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Block {
    pub id: String,
    #[serde(flatten)]
    pub data: BlockData,
    #[serde(default)]
    pub settings: BlockSettings,
}

impl Block {
    pub fn new(kind: BlockType) -> Self {
        Self {
            id: new_block_id(),
            data: BlockData::default_for(kind),
            settings: BlockSettings::default(),
        }
    }

    pub fn kind(&self) -> BlockType {
        self.data.kind()
    }

    pub fn is_columns(&self) -> bool {
        matches!(self.data, BlockData::Columns(_))
    }
}

/// Page-level metadata persisted alongside the block tree.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "kebab-case", default)]
pub(crate) struct PageMeta {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub meta_title: String,
    pub og_image: String,
    pub noindex: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct PageSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_json_shape_is_adjacently_tagged() {
        let b = Block::new(BlockType::Heading);
        let v = serde_json::to_value(&b).expect("block should serialize");
        assert_eq!(v["type"], "heading");
        assert_eq!(v["content"]["text"], "New heading");
        assert_eq!(v["content"]["level"], 2);
        assert!(v["settings"].is_object());
    }

    #[test]
    fn test_block_roundtrip_with_settings_bag() {
        let mut b = Block::new(BlockType::Button);
        b.settings
            .merge(&serde_json::json!({"align": "center", "hidden": true}));

        let json = serde_json::to_string(&b).expect("serialize");
        let back: Block = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, b);
        assert!(back.settings.hidden());
    }

    #[test]
    fn test_block_deserializes_without_settings() {
        let json = r#"{"id":"blk-1","type":"divider","content":{}}"#;
        let b: Block = serde_json::from_str(json).expect("should parse");
        assert_eq!(b.kind(), BlockType::Divider);
        assert!(b.settings.values.is_empty());
    }

    #[test]
    fn test_settings_merge_null_deletes() {
        let mut s = BlockSettings::default();
        s.merge(&serde_json::json!({"align": "left"}));
        s.merge(&serde_json::json!({"align": null, "pad": 8}));
        assert!(s.values.get("align").is_none());
        assert_eq!(s.values.get("pad").and_then(|v| v.as_i64()), Some(8));
    }

    #[test]
    fn test_default_columns_has_two_empty_slots() {
        let b = Block::new(BlockType::Columns);
        let BlockData::Columns(c) = &b.data else {
            panic!("expected columns content");
        };
        assert_eq!(c.columns.len(), 2);
        assert!(c.columns.iter().all(|s| s.blocks.is_empty()));
        assert!(c.column_widths.is_none());
    }
}
