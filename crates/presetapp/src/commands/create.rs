use crate::commands::helpers::{next_sort_in, require_folder};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::PresetRecord;
use crate::store::RecordStore;
use crate::tags::normalize_tags;
use serde_json::Value;

/// Everything needed to capture a preset from placeables.
#[derive(Debug, Clone, Default)]
pub struct NewPreset {
    pub name: String,
    pub document_name: String,
    pub data: Vec<Value>,
    pub img: Option<String>,
    pub folder: Option<String>,
    pub tags: Vec<String>,
}

impl NewPreset {
    pub fn new(name: impl Into<String>, document_name: impl Into<String>, data: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            document_name: document_name.into(),
            data,
            ..Default::default()
        }
    }

    pub fn in_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Creates a preset at the end of its destination folder.
pub fn run<S: RecordStore>(
    store: &mut S,
    collection: &str,
    preset: NewPreset,
    stride: i64,
) -> Result<CmdResult> {
    let mut record = PresetRecord::new(preset.name, preset.document_name, preset.data)?;
    record.img = preset.img;
    record.tags = normalize_tags(&preset.tags)?;

    require_folder(store, collection, preset.folder.as_deref())?;
    record.sort = next_sort_in(store, collection, preset.folder.as_deref(), stride)?;
    record.folder = preset.folder;

    store.create_record(collection, &record)?;
    tracing::debug!(%collection, preset = %record.id, "preset created");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Preset created: {}",
        record.name
    )));
    result.affected_presets.push(record);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PresetError;
    use crate::store::memory::fixtures::StoreFixture;
    use serde_json::json;

    #[test]
    fn test_create_appends_to_folder() {
        let mut fixture = StoreFixture::default()
            .with_folder("f1", "Forest", None)
            .with_presets(2, "Tile");

        let result = run(
            &mut fixture.store,
            "presets",
            NewPreset::new("Oak", "Tile", vec![json!({"x": 0, "y": 0})]).in_folder("f1"),
            10,
        )
        .unwrap();
        assert_eq!(result.affected_presets[0].sort, 10);
        assert_eq!(result.affected_presets[0].folder.as_deref(), Some("f1"));

        let result = run(
            &mut fixture.store,
            "presets",
            NewPreset::new("Pine", "Tile", vec![json!({"x": 0, "y": 0})]),
            10,
        )
        .unwrap();
        assert_eq!(result.affected_presets[0].sort, 30);

        let entries = fixture.store.list_index_entries("presets").unwrap();
        assert_eq!(entries.len(), 4);
    }

    #[test]
    fn test_create_normalizes_tags() {
        let mut fixture = StoreFixture::default();
        let result = run(
            &mut fixture.store,
            "presets",
            NewPreset::new("Torch", "AmbientLight", vec![json!({})]).with_tags(["#Fire", "light"]),
            10,
        )
        .unwrap();
        let tags: Vec<&str> = result.affected_presets[0]
            .tags
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(tags, vec!["fire", "light"]);
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let mut fixture = StoreFixture::default();

        let empty = run(
            &mut fixture.store,
            "presets",
            NewPreset::new("Nothing", "Tile", vec![]),
            10,
        );
        assert!(matches!(empty, Err(PresetError::Validation(_))));

        let bad_tag = run(
            &mut fixture.store,
            "presets",
            NewPreset::new("Rock", "Tile", vec![json!({})]).with_tags(["two words"]),
            10,
        );
        assert!(matches!(bad_tag, Err(PresetError::Validation(_))));

        let missing_folder = run(
            &mut fixture.store,
            "presets",
            NewPreset::new("Rock", "Tile", vec![json!({})]).in_folder("nope"),
            10,
        );
        assert!(matches!(missing_folder, Err(PresetError::FolderNotFound(_))));

        assert!(fixture.store.list_index_entries("presets").unwrap().is_empty());
    }
}
