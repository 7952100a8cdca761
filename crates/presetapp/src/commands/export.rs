use crate::commands::helpers::subtree;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{FolderDescriptor, PresetRecord};
use crate::progress::ProgressTracker;
use crate::store::RecordStore;
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One JSON file per preset plus `folders.json`, in a `.tar.gz`.
    Archive,
    /// A single JSON array of presets, importable again as is.
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Archive => "tar.gz",
            ExportFormat::Json => "json",
        }
    }
}

/// Exports a folder subtree, or the whole collection for `None`, into `out_dir`.
///
/// Records are loaded one at a time. Unreadable records are skipped with a
/// warning. A cancelled export writes no file.
pub fn run<S: RecordStore>(
    store: &S,
    collection: &str,
    folder: Option<&str>,
    format: ExportFormat,
    out_dir: &Path,
    tracker: &mut ProgressTracker,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let (folders, records) = collect(store, collection, folder, tracker, &mut result)?;

    if tracker.is_cancelled() {
        result.add_message(CmdMessage::warning("Export cancelled, nothing written"));
        return Ok(result);
    }
    tracker.finish();

    if records.is_empty() {
        result.add_message(CmdMessage::info("No presets to export."));
        return Ok(result);
    }

    let path = output_path(out_dir, collection, format);
    let file = File::create(&path)?;
    match format {
        ExportFormat::Archive => write_archive(file, collection, &folders, &records)?,
        ExportFormat::Json => write_json(file, &records)?,
    }

    tracing::info!(%collection, presets = records.len(), path = %path.display(), "export written");
    result.add_message(CmdMessage::success(format!(
        "Exported {} presets to {}",
        records.len(),
        path.display()
    )));
    result.affected_presets = records;
    result.affected_folders = folders;
    Ok(result)
}

/// Exported presets as a JSON array string.
pub fn to_json(records: &[PresetRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

fn collect<S: RecordStore>(
    store: &S,
    collection: &str,
    folder: Option<&str>,
    tracker: &mut ProgressTracker,
    result: &mut CmdResult,
) -> Result<(Vec<FolderDescriptor>, Vec<PresetRecord>)> {
    let (folders, mut entries) = subtree(store, collection, folder)?;
    entries.sort_by(|a, b| a.folder.cmp(&b.folder).then(a.sort.cmp(&b.sort)));
    tracker.set_total(entries.len());

    let mut records = Vec::with_capacity(entries.len());
    for entry in &entries {
        if tracker.is_cancelled() {
            break;
        }
        match store.get_full_record(collection, &entry.id) {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::warn!(%collection, preset = %entry.id, error = %err, "skipping unreadable preset");
                result.add_message(CmdMessage::warning(format!(
                    "Skipped '{}': {}",
                    entry.name, err
                )));
            }
        }
        tracker.step();
    }
    Ok((folders, records))
}

fn output_path(out_dir: &Path, collection: &str, format: ExportFormat) -> PathBuf {
    let now = Utc::now();
    out_dir.join(format!(
        "presets-{}-{}.{}",
        sanitize_filename(collection),
        now.format("%Y-%m-%d_%H-%M-%S"),
        format.extension()
    ))
}

fn write_archive<W: Write>(
    writer: W,
    collection: &str,
    folders: &[FolderDescriptor],
    records: &[PresetRecord],
) -> Result<()> {
    let enc = GzEncoder::new(writer, Compression::default());
    let mut tar = tar::Builder::new(enc);
    let root = sanitize_filename(collection);

    let folders_json = serde_json::to_vec_pretty(folders)?;
    append(&mut tar, format!("{}/folders.json", root), &folders_json)?;

    for record in records {
        let short_id: String = record.id.chars().take(8).collect();
        let entry_name = format!(
            "{}/presets/{}-{}.json",
            root,
            sanitize_filename(&record.name),
            short_id
        );
        let content = serde_json::to_vec_pretty(record)?;
        append(&mut tar, entry_name, &content)?;
    }

    tar.into_inner()?.finish()?;
    Ok(())
}

fn append<W: Write>(tar: &mut tar::Builder<W>, name: String, content: &[u8]) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    tar.append_data(&mut header, name, content)?;
    Ok(())
}

fn write_json<W: Write>(mut writer: W, records: &[PresetRecord]) -> Result<()> {
    writer.write_all(to_json(records)?.as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn sanitize_filename(name: &str) -> String {
    let cleaned = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .to_string();
    if cleaned.is_empty() {
        "preset".to_string()
    } else {
        cleaned
    }
}

/// Removes exports older than the newest `keep` files in `out_dir`.
pub fn prune_exports(out_dir: &Path, keep: usize) -> Result<usize> {
    let mut exports: Vec<PathBuf> = fs::read_dir(out_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("presets-"))
        })
        .collect();
    exports.sort();
    let excess = exports.len().saturating_sub(keep);
    for path in &exports[..excess] {
        fs::remove_file(path)?;
    }
    Ok(excess)
}
