use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{GmlFile, Project};
use crate::types::{Def, FileId, Flags, PrimitiveKind, SignifierId, Type, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Script,
    Object,
    Other,
}

/// An asset as handed to the project: its files and, for objects, the parent name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSpec {
    pub name: String,
    pub kind: AssetKind,
    pub parent: Option<String>,
    /// `(file name, content)` pairs.
    pub files: Vec<(String, String)>,
}

impl AssetSpec {
    pub fn script(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        let file = format!("{name}.gml");
        Self {
            name,
            kind: AssetKind::Script,
            parent: None,
            files: vec![(file, content.into())],
        }
    }

    pub fn object(name: impl Into<String>, parent: Option<&str>, events: Vec<(&str, &str)>) -> Self {
        Self {
            name: name.into(),
            kind: AssetKind::Object,
            parent: parent.map(str::to_string),
            files: events
                .into_iter()
                .map(|(file, content)| (file.to_string(), content.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub name: String,
    pub kind: AssetKind,
    pub parent: Option<String>,
    pub files: Vec<FileId>,
    /// Global symbol naming the asset.
    pub symbol: Option<SignifierId>,
    /// `Id.Instance.<Name>`, for objects.
    pub instance: Option<TypeId>,
    pub(crate) removed: bool,
}

impl Project {
    /// Create the asset's symbols and types and its unparsed files.
    pub(crate) fn add_asset(&mut self, spec: AssetSpec) -> Result<usize> {
        if self.asset_index.contains_key(&spec.name) {
            bail!("asset `{}` already exists", spec.name);
        }
        let idx = self.assets.len();
        let (symbol, instance) = match spec.kind {
            AssetKind::Object => {
                let (symbol, instance) = self.object_symbol(&spec)?;
                (Some(symbol), Some(instance))
            }
            AssetKind::Script => (Some(self.script_symbol(&spec.name)), None),
            AssetKind::Other => (None, None),
        };

        let mut files = Vec::with_capacity(spec.files.len());
        for (name, content) in spec.files {
            let id = FileId(self.files.len() as u32);
            let file = GmlFile::new(id, idx, &spec.name, &name, content);
            self.file_index.insert(file.path.clone(), id);
            self.files.push(file);
            files.push(id);
        }
        debug!(asset = %spec.name, kind = ?spec.kind, files = files.len(), "added asset");

        self.asset_index.insert(spec.name.clone(), idx);
        self.assets.push(Asset {
            name: spec.name,
            kind: spec.kind,
            parent: spec.parent,
            files,
            symbol,
            instance,
            removed: false,
        });
        Ok(idx)
    }

    /// Scripts are reached through the functions they declare, so their symbol is
    /// not a member of the global table.
    fn script_symbol(&mut self, name: &str) -> SignifierId {
        let ty = self.reg.alloc(Type::new(PrimitiveKind::AssetGMScript).named(name));
        self.reg.register_known(format!("Asset.GMScript.{name}"), ty);
        let sig = self.reg.new_signifier(self.global, name, ty);
        self.reg.ty_mut(ty).signifier = Some(sig);
        let s = self.reg.sig_mut(sig);
        s.flags = Flags::ASSET;
        s.def = Some(Def { file: None, span: None });
        sig
    }

    fn object_symbol(&mut self, spec: &AssetSpec) -> Result<(SignifierId, TypeId)> {
        let name = spec.name.as_str();
        let parent_instance = match &spec.parent {
            Some(parent) => match self.asset(parent).and_then(|a| a.instance) {
                Some(instance) => instance,
                None => {
                    warn!(object = name, missing_parent = %parent, "parent object not found");
                    self.instance_base
                }
            },
            None => self.instance_base,
        };

        let instance = self.reg.derive(parent_instance);
        self.reg.ty_mut(instance).name = Some(name.to_string());
        self.reg.register_known(format!("Id.Instance.{name}"), instance);
        let id = self.reg.add_member(instance, "id", Some(instance))?;
        let id = self.reg.sig_mut(id);
        id.flags = Flags::INSTANCE;
        id.def = Some(Def { file: None, span: None });

        let asset_ty = self.reg.derive(self.object_base);
        let node = self.reg.ty_mut(asset_ty);
        node.name = Some(name.to_string());
        node.parent = Some(instance);
        self.reg.register_known(format!("Asset.GMObject.{name}"), asset_ty);

        let sig = self.reg.add_member(self.global, name, Some(asset_ty))?;
        self.reg.ty_mut(asset_ty).signifier = Some(sig);
        self.reg.ty_mut(instance).signifier = Some(sig);
        let s = self.reg.sig_mut(sig);
        s.flags = Flags::ASSET | Flags::GLOBAL;
        s.def = Some(Def { file: None, span: None });
        Ok((sig, instance))
    }

    /// Self a file of `asset` starts in.
    pub(crate) fn self_of(&self, asset: usize) -> TypeId {
        self.assets
            .get(asset)
            .and_then(|a| a.instance)
            .unwrap_or(self.global)
    }

    /// Point an object's instance struct at its parent's, or cut it loose when its
    /// create event does not call `event_inherited()`.
    pub(crate) fn relink_inheritance(&mut self, asset: usize) {
        let Some(a) = self.assets.get(asset) else {
            return;
        };
        let (Some(instance), Some(parent)) = (a.instance, a.parent.as_deref()) else {
            return;
        };
        let Some(parent_instance) = self.asset(parent).and_then(|p| p.instance) else {
            return;
        };
        let create = a
            .files
            .iter()
            .map(|id| &self.files[id.index()])
            .find(|f| !f.removed && f.is_create_event());
        let target = match create {
            Some(file) if !file.calls_super => self.instance_base,
            _ => parent_instance,
        };
        self.reg.ty_mut(instance).parent = Some(target);
    }
}
