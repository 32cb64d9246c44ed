//! Maps an instance tree onto Rojo's filesystem conventions.
//!
//! Scripts become `<name><suffix>.<ext>` files, or directories holding an
//! `init<suffix>.<ext>` when their children have to live next to them. Folders
//! and every other class become directories with an `init.meta.json`. Subtrees
//! without a single script are skipped entirely.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classify::{ClassKind, ScriptKind, ScriptPresence};
use crate::error::{ConvertError, Result};
use crate::instance::{InstanceId, InstanceTree};
use crate::project::{MetaFile, SOURCE_DIR_NAME};
use crate::util::sanitize_file_name;

/// File extension used for script sources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptExtension {
    #[default]
    Lua,
    Luau,
}

impl ScriptExtension {
    pub fn as_str(self) -> &'static str {
        match self {
            ScriptExtension::Lua => "lua",
            ScriptExtension::Luau => "luau",
        }
    }
}

/// Where an instance ended up, in project-file notation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeDescriptor {
    #[serde(rename = "$className", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(rename = "$path")]
    pub path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapStats {
    pub scripts_written: usize,
    pub meta_files_written: usize,
    pub directories_created: usize,
}

pub struct ProjectMapper<'a> {
    tree: &'a InstanceTree,
    presence: ScriptPresence,
    src_dir: PathBuf,
    extension: ScriptExtension,
    stats: MapStats,
}

impl<'a> ProjectMapper<'a> {
    /// `src_dir` is the directory descriptor paths are made relative to.
    pub fn new(tree: &'a InstanceTree, src_dir: &Path, extension: ScriptExtension) -> Self {
        Self {
            tree,
            presence: ScriptPresence::new(tree),
            src_dir: src_dir.to_path_buf(),
            extension,
            stats: MapStats::default(),
        }
    }

    pub fn has_scripts(&self, id: InstanceId) -> bool {
        self.presence.has_scripts(id)
    }

    pub fn stats(&self) -> &MapStats {
        &self.stats
    }

    /// Writes `root` and its script-bearing descendants under `base`.
    ///
    /// Returns `None` when the subtree holds no script and nothing was written.
    pub fn map(&mut self, root: InstanceId, base: &Path) -> Result<Option<NodeDescriptor>> {
        let mut root_descriptor = None;
        let mut stack = vec![(root, base.to_path_buf())];

        while let Some((id, base)) = stack.pop() {
            if !self.has_scripts(id) {
                continue;
            }

            let (descriptor, children_dir) = self.materialize(id, &base)?;
            if id == root {
                root_descriptor = Some(descriptor);
            }

            if let Some(dir) = children_dir {
                let children = &self.tree.get(id).children;
                stack.extend(children.iter().rev().map(|child| (*child, dir.clone())));
            }
        }

        Ok(root_descriptor)
    }

    /// Writes the artifacts for a single instance.
    ///
    /// Also returns the directory its children belong in, or `None` when the
    /// children are dropped.
    fn materialize(&mut self, id: InstanceId, base: &Path) -> Result<(NodeDescriptor, Option<PathBuf>)> {
        let tree = self.tree;
        let instance = tree.get(id);
        let name = sanitize_file_name(&instance.name);

        match ClassKind::of(&instance.class_name) {
            ClassKind::Script(kind) => {
                let total = instance.children.len();
                let with_scripts = instance
                    .children
                    .iter()
                    .filter(|child| self.has_scripts(**child))
                    .count();
                let source = instance.source();

                if total > 0 && with_scripts == total {
                    let dir = base.join(&name);
                    self.create_dir(&dir)?;
                    self.write_script(&dir.join(self.script_file_name("init", kind)), source)?;
                    Ok((self.descriptor(&dir, None), Some(dir)))
                } else if with_scripts == 0 {
                    let file = base.join(self.script_file_name(&name, kind));
                    self.write_script(&file, source)?;
                    if total > 0 {
                        self.write_meta(&base.join(format!("{name}.meta.json")), &MetaFile::ignore_unknown())?;
                    }
                    Ok((self.descriptor(&file, None), None))
                } else {
                    let dir = base.join(&name);
                    self.create_dir(&dir)?;
                    self.write_script(&dir.join(self.script_file_name("init", kind)), source)?;
                    self.write_meta(&dir.join("init.meta.json"), &MetaFile::ignore_unknown())?;
                    Ok((self.descriptor(&dir, None), Some(dir)))
                }
            }
            ClassKind::Folder => {
                let dir = base.join(&name);
                self.create_dir(&dir)?;
                self.write_meta(&dir.join("init.meta.json"), &MetaFile::ignore_unknown())?;
                Ok((self.descriptor(&dir, None), Some(dir)))
            }
            ClassKind::Container => {
                let class_name = instance.class_name.clone();
                let dir = base.join(&name);
                self.create_dir(&dir)?;
                self.write_meta(&dir.join("init.meta.json"), &MetaFile::with_class(&class_name))?;
                Ok((self.descriptor(&dir, Some(class_name)), Some(dir)))
            }
        }
    }

    fn script_file_name(&self, stem: &str, kind: ScriptKind) -> String {
        format!("{stem}{}.{}", kind.suffix(), self.extension.as_str())
    }

    fn descriptor(&self, path: &Path, class_name: Option<String>) -> NodeDescriptor {
        let relative = path.strip_prefix(&self.src_dir).unwrap_or(path);
        let mut joined = String::from(SOURCE_DIR_NAME);
        for component in relative.components() {
            joined.push('/');
            joined.push_str(&component.as_os_str().to_string_lossy());
        }
        NodeDescriptor {
            class_name,
            path: joined,
        }
    }

    fn create_dir(&mut self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir).map_err(|e| ConvertError::fs(dir, e))?;
        self.stats.directories_created += 1;
        tracing::debug!("Created {}", dir.display());
        Ok(())
    }

    fn write_script(&mut self, path: &Path, source: &str) -> Result<()> {
        std::fs::write(path, source).map_err(|e| ConvertError::fs(path, e))?;
        self.stats.scripts_written += 1;
        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }

    fn write_meta(&mut self, path: &Path, meta: &MetaFile) -> Result<()> {
        meta.write(path)?;
        self.stats.meta_files_written += 1;
        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }
}
