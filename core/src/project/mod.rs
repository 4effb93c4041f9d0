//! The project: one type arena, one global table and every asset and file analysed
//! against them.
//!
//! All mutation happens through `&mut Project` on one thread. File I/O is the only
//! async part ([`Project::load_dir`]); analysis itself always runs to completion.

mod asset;
mod diagnose;
mod file;
mod query;
mod reload;

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rustc_hash::FxHashMap;
use tracing::info;

pub use asset::{Asset, AssetKind, AssetSpec};
pub use file::{ArgRange, CallRecord, FileState, GmlFile, Reference};
pub use query::{ArgumentHelp, Location};

use crate::config::AnalysisConfig;
use crate::diagnostics::DiagnosticsListener;
use crate::native::{self, NativeLibrary, NativeTargets};
use crate::types::{FileId, PrimitiveKind, Type, TypeId, TypeRegistry};

pub struct Project {
    pub(crate) reg: TypeRegistry,
    pub(crate) global: TypeId,
    pub(crate) instance_base: TypeId,
    pub(crate) object_base: TypeId,
    pub(crate) files: Vec<GmlFile>,
    pub(crate) assets: Vec<Asset>,
    asset_index: FxHashMap<String, usize>,
    file_index: FxHashMap<String, FileId>,
    pub(crate) dirty: BTreeSet<FileId>,
    config: AnalysisConfig,
    listener: Option<Box<dyn DiagnosticsListener>>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("assets", &self.assets.len())
            .field("files", &self.files.len())
            .field("types", &self.reg.type_count())
            .field("signifiers", &self.reg.signifier_count())
            .finish()
    }
}

impl Project {
    /// Project with the configured native libraries, or the bundled one when none
    /// are configured.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let libraries = if config.native_libraries.is_empty() {
            vec![NativeLibrary::bundled()?]
        } else {
            config
                .native_libraries
                .iter()
                .map(|path| {
                    let text = std::fs::read_to_string(path)
                        .with_context(|| format!("failed to read native library {}", path.display()))?;
                    NativeLibrary::from_json(&text).with_context(|| format!("in {}", path.display()))
                })
                .collect::<Result<Vec<_>>>()?
        };
        Self::with_libraries(config, libraries)
    }

    pub fn with_libraries(config: AnalysisConfig, libraries: Vec<NativeLibrary>) -> Result<Self> {
        let mut reg = TypeRegistry::new();
        let global = reg.alloc(Type::new(PrimitiveKind::Struct).named("global"));
        let instance_base = reg.alloc(Type::new(PrimitiveKind::IdInstance).named("Instance"));
        reg.register_known("Id.Instance", instance_base);
        let mut object = Type::new(PrimitiveKind::AssetGMObject);
        object.parent = Some(instance_base);
        let object_base = reg.alloc(object);
        reg.register_known("Asset.GMObject", object_base);

        let count = native::install(&mut reg, NativeTargets { global, instance_base }, libraries)?;
        info!(symbols = count, "native libraries installed");

        Ok(Self {
            reg,
            global,
            instance_base,
            object_base,
            files: Vec::new(),
            assets: Vec::new(),
            asset_index: FxHashMap::default(),
            file_index: FxHashMap::default(),
            dirty: BTreeSet::new(),
            config,
            listener: None,
        })
    }

    /// Load every asset under `root`, with `gml.toml` from `root` if present.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let config = AnalysisConfig::discover(root)?;
        Self::load_dir(root, config).await
    }

    pub fn set_listener(&mut self, listener: Box<dyn DiagnosticsListener>) {
        self.listener = Some(listener);
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.reg
    }

    /// The global table, the self of every script file.
    pub fn global(&self) -> TypeId {
        self.global
    }

    /// The struct every object instance derives from.
    pub fn instance_base(&self) -> TypeId {
        self.instance_base
    }

    pub fn file(&self, id: FileId) -> Option<&GmlFile> {
        self.files.get(id.index()).filter(|f| !f.removed)
    }

    pub fn files(&self) -> impl Iterator<Item = &GmlFile> {
        self.files.iter().filter(|f| !f.removed)
    }

    pub fn asset(&self, name: &str) -> Option<&Asset> {
        self.asset_index.get(name).map(|idx| &self.assets[*idx])
    }

    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter().filter(|a| !a.removed)
    }

    pub fn file_id(&self, path: &str) -> Option<FileId> {
        self.file_index.get(path).copied()
    }

    pub(crate) fn live_file(&self, id: FileId) -> Result<&GmlFile> {
        self.file(id).ok_or_else(|| anyhow!("file {} does not belong to this project", id.index()))
    }
}
