use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::{AssetKind, AssetSpec, FileState, Project};
use crate::config::AnalysisConfig;
use crate::native::NativeLibrary;
use crate::types::FileId;
use crate::visit::{GlobalsVisitor, LocalsVisitor};

/// Directory whose subdirectories are objects.
const OBJECTS_DIR: &str = "objects";
/// File inside an object directory naming its parent object.
const PARENT_FILE: &str = "parent.txt";

impl Project {
    /// Add `specs` and analyse them: pass 1 over every file with parents before
    /// children, then pass 2 over every file in the same order, then diagnostics.
    pub fn initialize(&mut self, specs: Vec<AssetSpec>) -> Result<()> {
        let started = Instant::now();
        let ordered = self.topological_order(specs)?;
        let mut assets = Vec::with_capacity(ordered.len());
        for spec in ordered {
            assets.push(self.add_asset(spec)?);
        }
        let files: Vec<FileId> = assets
            .iter()
            .flat_map(|a| self.assets[*a].files.clone())
            .collect();

        for id in &files {
            self.files[id.index()].parse();
        }
        for id in &files {
            self.register_globals(*id)?;
        }
        for asset in &assets {
            self.relink_inheritance(*asset);
        }
        let registered = started.elapsed();
        for id in &files {
            self.resolve_locals(*id)?;
        }
        for id in &files {
            self.diagnose(*id);
        }
        info!(
            assets = assets.len(),
            files = files.len(),
            pass1_ms = registered.as_millis() as u64,
            total_ms = started.elapsed().as_millis() as u64,
            "project initialized"
        );
        self.collect_garbage();
        Ok(())
    }

    /// Parents first; among unrelated assets the given order is kept.
    fn topological_order(&self, specs: Vec<AssetSpec>) -> Result<Vec<AssetSpec>> {
        let index: rustc_hash::FxHashMap<&str, usize> =
            specs.iter().enumerate().map(|(i, s)| (s.name.as_str(), i)).collect();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); specs.len()];
        let mut pending = vec![0usize; specs.len()];
        for (i, spec) in specs.iter().enumerate() {
            let Some(parent) = spec.parent.as_deref() else {
                continue;
            };
            match index.get(parent) {
                Some(p) if *p == i => bail!("object `{}` is its own parent", spec.name),
                Some(p) => {
                    children[*p].push(i);
                    pending[i] += 1;
                }
                None if self.asset(parent).is_some() => {}
                None => warn!(object = %spec.name, missing_parent = parent, "parent object not found, ignoring"),
            }
        }

        let mut ready: VecDeque<usize> = (0..specs.len()).filter(|i| pending[*i] == 0).collect();
        let mut order = Vec::with_capacity(specs.len());
        while let Some(i) = ready.pop_front() {
            order.push(i);
            for child in &children[i] {
                pending[*child] -= 1;
                if pending[*child] == 0 {
                    ready.push_back(*child);
                }
            }
        }
        if order.len() < specs.len() {
            let cycle: Vec<&str> = (0..specs.len())
                .filter(|i| pending[*i] > 0)
                .map(|i| specs[i].name.as_str())
                .collect();
            bail!("cycle in object parents: {}", cycle.join(", "));
        }

        let mut slots: Vec<Option<AssetSpec>> = specs.into_iter().map(Some).collect();
        Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
    }

    fn register_globals(&mut self, id: FileId) -> Result<()> {
        let file = &self.files[id.index()];
        let registers_functions = self.assets[file.asset].kind == AssetKind::Script;
        let parsed = file
            .parsed
            .as_ref()
            .ok_or_else(|| anyhow!("{} has not been parsed", file.path))?;
        let out = GlobalsVisitor::new(&mut self.reg, self.global, id, registers_functions).run(&parsed.file)?;
        let file = &mut self.files[id.index()];
        file.refs = out.refs;
        file.global_diagnostics = out.diagnostics;
        file.calls_super = out.calls_super;
        file.state = FileState::GloballyRegistered;
        Ok(())
    }

    fn resolve_locals(&mut self, id: FileId) -> Result<()> {
        let self_ty = self.self_of(self.files[id.index()].asset);
        let file = &self.files[id.index()];
        let parsed = file
            .parsed
            .as_ref()
            .ok_or_else(|| anyhow!("{} has not been parsed", file.path))?;
        let out = LocalsVisitor::new(&mut self.reg, id, self.global, self_ty).run(&parsed.file)?;
        let file = &mut self.files[id.index()];
        file.refs.extend(out.refs);
        file.scopes = out.scopes;
        file.calls = out.calls;
        file.local_diagnostics = out.diagnostics;
        file.state = FileState::LocallyResolved;
        Ok(())
    }

    /// Re-analyse one file with new text, then recompute diagnostics of every file
    /// whose references the edit may have invalidated.
    pub fn reload_file(&mut self, id: FileId, content: impl Into<String>) -> Result<()> {
        self.live_file(id)?;
        let file = &mut self.files[id.index()];
        let dirty = file.reset(&mut self.reg);
        file.content = content.into();
        file.parse();
        let asset = file.asset;
        self.dirty.extend(dirty);

        self.register_globals(id)?;
        if self.files[id.index()].is_create_event() {
            self.relink_inheritance(asset);
        }
        self.resolve_locals(id)?;
        self.mark_definition_users(id);
        self.diagnose(id);
        self.dirty.remove(&id);
        self.drain_dirty();
        self.collect_garbage();
        Ok(())
    }

    /// Queue every file referencing a symbol `id` now defines, so warnings about it
    /// being undeclared go away.
    fn mark_definition_users(&mut self, id: FileId) {
        for r in self.files[id.index()].refs.iter().filter(|r| r.is_def) {
            self.dirty.extend(self.reg.sig(r.item).ref_files().filter(|f| *f != id));
        }
    }

    /// Drop an asset: its files are reset and its symbol detached from the global table.
    pub fn remove_asset(&mut self, name: &str) -> Result<()> {
        let idx = *self
            .asset_index
            .get(name)
            .ok_or_else(|| anyhow!("asset `{name}` does not exist"))?;
        let files = self.assets[idx].files.clone();
        for id in &files {
            let file = &mut self.files[id.index()];
            let dirty = file.reset(&mut self.reg);
            file.removed = true;
            self.file_index.remove(&file.path);
            self.dirty.extend(dirty);
        }
        for id in &files {
            self.dirty.remove(id);
        }

        let asset = &mut self.assets[idx];
        asset.removed = true;
        if let Some(symbol) = asset.symbol {
            self.reg.remove_member(self.global, name);
            self.dirty.extend(self.reg.sig(symbol).ref_files());
            self.reg.sig_mut(symbol).unset_def();
        }
        self.asset_index.remove(name);
        info!(asset = name, files = files.len(), "removed asset");
        self.drain_dirty();
        self.collect_garbage();
        Ok(())
    }

    /// Recompute diagnostics of every queued file.
    pub(crate) fn drain_dirty(&mut self) {
        let mut drained = 0usize;
        while let Some(id) = self.dirty.pop_first() {
            if self.file(id).is_none() {
                continue;
            }
            self.diagnose(id);
            drained += 1;
        }
        if drained > 0 {
            debug!(files = drained, "drained dirty files");
        }
    }

    /// Release arena slots nothing in the project reaches any more. Roots are the
    /// global tables, every asset and the references, scopes and calls of live files.
    pub(crate) fn collect_garbage(&mut self) {
        let mut types = vec![self.global, self.instance_base, self.object_base];
        let mut sigs = Vec::new();
        for asset in self.assets.iter().filter(|a| !a.removed) {
            types.extend(asset.instance);
            sigs.extend(asset.symbol);
        }
        for file in self.files.iter().filter(|f| !f.removed) {
            sigs.extend(file.refs.iter().map(|r| r.item));
            for scope in file.scopes.records() {
                types.push(scope.local);
                types.push(scope.self_ty);
            }
            for call in &file.calls {
                types.push(call.function);
                types.extend(call.args.iter().map(|a| a.function));
            }
        }
        let (released_types, released_signifiers) = self.reg.collect(types, sigs);
        if released_types + released_signifiers > 0 {
            debug!(
                types = released_types,
                signifiers = released_signifiers,
                live_types = self.reg.type_count(),
                "released unreachable arena slots"
            );
        }
    }

    /// Read a project tree. Every directory holding source files is an asset;
    /// directories under `objects/` are objects, everything else is a script.
    pub async fn load_dir(root: impl AsRef<Path>, config: AnalysisConfig) -> Result<Self> {
        let root = root.as_ref();
        let libraries = if config.native_libraries.is_empty() {
            vec![NativeLibrary::bundled()?]
        } else {
            join_all(config.native_libraries.iter().map(|p| NativeLibrary::read(p)))
                .await
                .into_iter()
                .collect::<Result<Vec<_>>>()?
        };

        let dirs = asset_dirs(root, &config).await?;
        let specs = join_all(dirs.into_iter().map(|(dir, files)| read_asset(dir, files)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        info!(root = %root.display(), assets = specs.len(), "loaded project tree");

        let mut project = Self::with_libraries(config, libraries)?;
        project.initialize(specs)?;
        Ok(project)
    }
}

/// Directories under `root` holding at least one source file, with those files, sorted.
async fn asset_dirs(root: &Path, config: &AnalysisConfig) -> Result<Vec<(PathBuf, Vec<PathBuf>)>> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("failed to read directory {}", dir.display()))?;
        let mut sources = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                stack.push(path);
            } else if config.includes(&path) {
                sources.push(path);
            }
        }
        if !sources.is_empty() {
            sources.sort();
            out.push((dir, sources));
        }
    }
    out.sort();
    Ok(out)
}

async fn read_asset(dir: PathBuf, files: Vec<PathBuf>) -> Result<AssetSpec> {
    let name = file_name(&dir)?;
    let is_object = dir
        .parent()
        .and_then(|p| p.file_name())
        .is_some_and(|p| p == OBJECTS_DIR);
    let parent = if is_object {
        match tokio::fs::read_to_string(dir.join(PARENT_FILE)).await {
            Ok(text) => Some(text.trim().to_string()).filter(|p| !p.is_empty()),
            Err(_) => None,
        }
    } else {
        None
    };

    let contents = join_all(files.iter().map(tokio::fs::read_to_string)).await;
    let mut spec_files = Vec::with_capacity(files.len());
    for (path, content) in files.iter().zip(contents) {
        let content = content.with_context(|| format!("failed to read {}", path.display()))?;
        spec_files.push((file_name(path)?, content));
    }
    Ok(AssetSpec {
        name,
        kind: if is_object { AssetKind::Object } else { AssetKind::Script },
        parent,
        files: spec_files,
    })
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("invalid path {}", path.display()))
}
