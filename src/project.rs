use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ConvertError, Result};

pub const PROJECT_FILE_NAME: &str = "default.project.json";
pub const SOURCE_DIR_NAME: &str = "src";

/// Contents of a `<name>.meta.json` or `init.meta.json` sidecar.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub ignore_unknown_instances: bool,
}

impl MetaFile {
    pub fn ignore_unknown() -> Self {
        Self {
            class_name: None,
            ignore_unknown_instances: true,
        }
    }

    pub fn with_class(class_name: &str) -> Self {
        Self {
            class_name: Some(class_name.to_string()),
            ignore_unknown_instances: true,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}

/// The `default.project.json` document.
#[derive(Debug, Serialize)]
pub struct ProjectFile {
    pub name: String,
    pub tree: ProjectTree,
}

#[derive(Debug, Serialize)]
pub struct ProjectTree {
    #[serde(rename = "$className")]
    pub class_name: String,
    #[serde(flatten)]
    pub children: BTreeMap<String, PathNode>,
}

#[derive(Debug, Serialize)]
pub struct PathNode {
    #[serde(rename = "$path")]
    pub path: String,
}

impl ProjectFile {
    /// Builds the descriptor from the directories currently under `src_dir`.
    ///
    /// Loose script files directly in `src_dir` are not listed, nor are
    /// directories whose names start with `$`.
    pub fn scan(name: &str, src_dir: &Path) -> Result<Self> {
        let mut children = BTreeMap::new();

        if src_dir.exists() {
            let entries = std::fs::read_dir(src_dir).map_err(|e| ConvertError::fs(src_dir, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| ConvertError::fs(src_dir, e))?;
                if !entry.path().is_dir() {
                    continue;
                }
                let dir_name = entry.file_name().to_string_lossy().to_string();
                if dir_name.starts_with('$') {
                    tracing::warn!("Not listing {dir_name}: name clashes with Rojo project keys");
                    continue;
                }
                let path = format!("{SOURCE_DIR_NAME}/{dir_name}");
                children.insert(dir_name, PathNode { path });
            }
        }

        Ok(Self {
            name: name.to_string(),
            tree: ProjectTree {
                class_name: "DataModel".into(),
                children,
            },
        })
    }
}

/// Scans `<output>/src` and writes `<output>/default.project.json`.
///
/// The project is named after the output directory.
pub fn write_project_file(output_dir: &Path) -> Result<PathBuf> {
    let name = project_name(output_dir);
    let project = ProjectFile::scan(&name, &output_dir.join(SOURCE_DIR_NAME))?;
    let path = output_dir.join(PROJECT_FILE_NAME);
    write_json(&path, &project)?;
    tracing::debug!(
        "Wrote {} with {} top-level entries",
        path.display(),
        project.tree.children.len()
    );
    Ok(path)
}

pub fn project_name(output_dir: &Path) -> String {
    output_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|e| ConvertError::fs(path, e))
}
