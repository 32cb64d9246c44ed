use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ConvertError, Result};
use crate::instance::InstanceTree;
use crate::mapper::{MapStats, NodeDescriptor, ProjectMapper, ScriptExtension};
use crate::parser::{self, BinaryDecoder, SceneFormat, UnavailableDecoder};
use crate::project::{self, SOURCE_DIR_NAME};

#[derive(Clone, Copy, Debug, Default)]
pub struct ConvertOptions {
    pub script_extension: ScriptExtension,
}

/// Summary of a finished conversion.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport {
    pub project_name: String,
    pub project_file: String,
    pub format: SceneFormat,
    pub roots: usize,
    pub root_descriptors: Vec<NodeDescriptor>,
    /// Names of roots dropped because nothing below them is a script.
    pub skipped_roots: Vec<String>,
    #[serde(flatten)]
    pub stats: MapStats,
}

/// Converts scenes into a Rojo project rooted at one output directory.
///
/// Conversions into the same output directory must not run concurrently.
pub struct Converter {
    output_dir: PathBuf,
    options: ConvertOptions,
    decoder: Box<dyn BinaryDecoder>,
}

impl Converter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            options: ConvertOptions::default(),
            decoder: Box::new(UnavailableDecoder),
        }
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// Plugs in a decoder for binary `.rbxm`/`.rbxl` files.
    pub fn with_decoder(mut self, decoder: Box<dyn BinaryDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn src_dir(&self) -> PathBuf {
        self.output_dir.join(SOURCE_DIR_NAME)
    }

    /// Checks that `input` can be parsed without writing anything.
    pub fn probe(&self, input: &Path) -> Result<SceneFormat> {
        parser::probe(input, self.decoder.as_ref())
    }

    pub fn convert_file(&self, input: &Path) -> Result<ConversionReport> {
        let (format, tree) = parser::load_scene(input, self.decoder.as_ref())?;
        self.convert_tree(&tree, format)
    }

    pub fn convert_str(&self, xml: &str) -> Result<ConversionReport> {
        let tree = parser::parse_xml(xml)?;
        self.convert_tree(&tree, SceneFormat::Xml)
    }

    /// Writes every root of `tree` under `src/` and regenerates the project file.
    ///
    /// Artifacts written before a failure stay on disk.
    pub fn convert_tree(&self, tree: &InstanceTree, format: SceneFormat) -> Result<ConversionReport> {
        let src_dir = self.src_dir();
        std::fs::create_dir_all(&src_dir).map_err(|e| ConvertError::fs(&src_dir, e))?;

        let mut mapper = ProjectMapper::new(tree, &src_dir, self.options.script_extension);
        let mut root_descriptors = Vec::new();
        let mut skipped_roots = Vec::new();

        for root in tree.roots() {
            match mapper.map(*root, &src_dir)? {
                Some(descriptor) => root_descriptors.push(descriptor),
                None => {
                    let name = tree.get(*root).name.clone();
                    tracing::info!("Skipping {name}: contains no scripts");
                    skipped_roots.push(name);
                }
            }
        }

        let project_file = project::write_project_file(&self.output_dir)?;
        let stats = mapper.stats().clone();
        tracing::info!(
            "Converted {} root(s) into {}: {} script(s), {} meta file(s)",
            tree.roots().len(),
            self.output_dir.display(),
            stats.scripts_written,
            stats.meta_files_written
        );

        Ok(ConversionReport {
            project_name: project::project_name(&self.output_dir),
            project_file: project_file.to_string_lossy().to_string(),
            format,
            roots: tree.roots().len(),
            root_descriptors,
            skipped_roots,
            stats,
        })
    }
}

/// Runs a file conversion on a blocking worker so async callers stay responsive.
///
/// The conversion cannot be interrupted once started; dropping the future only
/// discards the result.
pub async fn convert_in_background(converter: Converter, input: PathBuf) -> Result<ConversionReport> {
    tokio::task::spawn_blocking(move || converter.convert_file(&input))
        .await
        .map_err(|e| ConvertError::Custom(format!("Conversion worker failed: {e}")))?
}
