//! Built-in functions, variables, constants and types, loaded from JSON descriptions
//! into the global table before any user file is registered.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::types::{Def, Flags, GENERIC_PLACEHOLDER, PrimitiveKind, Type, TypeId, TypeRegistry};

const BUNDLED: &str = include_str!("base.json");

/// Module name that is always loaded first.
pub const BASE_MODULE: &str = "Base";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NativeLibrary {
    #[serde(default = "default_module")]
    pub module: String,
    #[serde(default)]
    pub functions: Vec<NativeFunction>,
    #[serde(default)]
    pub variables: Vec<NativeVariable>,
    #[serde(default)]
    pub constants: Vec<NativeConstant>,
    #[serde(default)]
    pub structures: Vec<NativeStructure>,
    #[serde(default)]
    pub enumerations: Vec<NativeEnumeration>,
}

fn default_module() -> String {
    BASE_MODULE.to_string()
}

fn default_any() -> String {
    "Any".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeFunction {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<NativeParameter>,
    #[serde(default = "default_any")]
    pub return_type: String,
    #[serde(default)]
    pub deprecated: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeParameter {
    pub name: String,
    #[serde(default = "default_any", rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeVariable {
    pub name: String,
    #[serde(default = "default_any", rename = "type")]
    pub ty: String,
    #[serde(default = "default_true")]
    pub writable: bool,
    #[serde(default)]
    pub instance: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeConstant {
    pub name: String,
    #[serde(default = "default_any", rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeStructure {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<NativeProperty>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeProperty {
    pub name: String,
    #[serde(default = "default_any", rename = "type")]
    pub ty: String,
    #[serde(default = "default_true")]
    pub writable: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeEnumeration {
    pub name: String,
    #[serde(default)]
    pub members: Vec<NativeEnumMember>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeEnumMember {
    pub name: String,
}

impl NativeLibrary {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid native library JSON")
    }

    /// The minimal library shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED)
    }

    pub async fn read(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read native library {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }
}

/// Where native symbols land.
#[derive(Debug, Clone, Copy)]
pub struct NativeTargets {
    pub global: TypeId,
    pub instance_base: TypeId,
}

fn native_def() -> Option<Def> {
    Some(Def { file: None, span: None })
}

/// Merge `libraries` into the registry, `Base` first. Returns the number of symbols added.
pub fn install(reg: &mut TypeRegistry, targets: NativeTargets, mut libraries: Vec<NativeLibrary>) -> Result<usize> {
    libraries.sort_by_key(|lib| lib.module != BASE_MODULE);
    let before = reg.signifier_count();
    for lib in &libraries {
        info!(module = %lib.module, functions = lib.functions.len(), "loading native library");
        install_constants(reg, targets, lib)?;
        install_variables(reg, targets, lib)?;
        install_structures(reg, lib)?;
        install_enumerations(reg, targets, lib)?;
        install_functions(reg, targets, lib)?;
    }
    Ok(reg.signifier_count() - before)
}

fn install_constants(reg: &mut TypeRegistry, targets: NativeTargets, lib: &NativeLibrary) -> Result<()> {
    for constant in &lib.constants {
        let ty = match &constant.class {
            Some(class) => {
                let key = format!("Constant.{class}");
                match reg.known(&key) {
                    Some(ty) => ty,
                    None => {
                        let base = reg.parse_feather_type_string(&constant.ty);
                        let named = reg.derive(base);
                        reg.ty_mut(named).name = Some(class.clone());
                        reg.register_known(key, named);
                        named
                    }
                }
            }
            None => reg.parse_feather_type_string(&constant.ty),
        };
        let sig = reg.add_member(targets.global, &constant.name, None)?;
        let sig = reg.sig_mut(sig);
        sig.ty = ty;
        sig.flags = Flags::GLOBAL | Flags::NATIVE;
        sig.def = native_def();
        sig.module = Some(lib.module.clone());
        sig.description = constant.description.clone();
    }
    Ok(())
}

fn install_variables(reg: &mut TypeRegistry, targets: NativeTargets, lib: &NativeLibrary) -> Result<()> {
    for variable in &lib.variables {
        let ty = reg.parse_feather_type_string(&variable.ty);
        let (container, scope) = if variable.instance {
            (targets.instance_base, Flags::INSTANCE)
        } else {
            (targets.global, Flags::GLOBAL)
        };
        let sig = reg.add_member(container, &variable.name, None)?;
        let sig = reg.sig_mut(sig);
        sig.ty = ty;
        sig.flags = scope | Flags::NATIVE;
        sig.flags.set(Flags::WRITABLE, variable.writable);
        sig.def = native_def();
        sig.deprecated = variable.deprecated;
        sig.module = Some(lib.module.clone());
        sig.description = variable.description.clone();
    }
    Ok(())
}

fn install_structures(reg: &mut TypeRegistry, lib: &NativeLibrary) -> Result<()> {
    for structure in &lib.structures {
        let key = format!("Struct.{}", structure.name);
        let ty = match reg.known(&key) {
            Some(ty) => ty,
            None => {
                let ty = reg.alloc(Type::new(PrimitiveKind::Struct).named(structure.name.clone()));
                reg.register_known(key, ty);
                ty
            }
        };
        for prop in &structure.properties {
            if reg.own_member(ty, &prop.name).is_some() {
                continue;
            }
            let prop_ty = reg.parse_feather_type_string(&prop.ty);
            let sig = reg.add_member(ty, &prop.name, None)?;
            let sig = reg.sig_mut(sig);
            sig.ty = prop_ty;
            sig.flags = Flags::INSTANCE | Flags::NATIVE;
            sig.flags.set(Flags::WRITABLE, prop.writable);
            sig.def = native_def();
            sig.description = prop.description.clone();
        }
    }
    Ok(())
}

fn install_enumerations(reg: &mut TypeRegistry, targets: NativeTargets, lib: &NativeLibrary) -> Result<()> {
    for enumeration in &lib.enumerations {
        let ty = reg.alloc(Type::new(PrimitiveKind::Enum).named(enumeration.name.clone()));
        reg.register_known(format!("Enum.{}", enumeration.name), ty);
        for member in &enumeration.members {
            let member_ty = reg.alloc(Type::new(PrimitiveKind::EnumMember).named(member.name.clone()));
            let sig = reg.add_member(ty, &member.name, Some(member_ty))?;
            let sig = reg.sig_mut(sig);
            sig.flags = Flags::ENUM_MEMBER | Flags::NATIVE;
            sig.def = native_def();
        }
        let sig = reg.add_member(targets.global, &enumeration.name, Some(ty))?;
        reg.ty_mut(ty).signifier = Some(sig);
        let sig = reg.sig_mut(sig);
        sig.flags = Flags::GLOBAL | Flags::ENUM | Flags::NATIVE;
        sig.def = native_def();
        sig.module = Some(lib.module.clone());
    }
    Ok(())
}

fn install_functions(reg: &mut TypeRegistry, targets: NativeTargets, lib: &NativeLibrary) -> Result<()> {
    for func in &lib.functions {
        if reg.own_member(targets.global, &func.name).is_some() {
            warn!(name = %func.name, "native function already exists, skipping");
            continue;
        }
        let mut node = Type::new(PrimitiveKind::Function).named(func.name.clone());
        node.description = func.description.clone();
        let ty = reg.alloc(node);
        reg.register_known(format!("Function.{}", func.name), ty);

        let uses_generic = func.return_type.contains(GENERIC_PLACEHOLDER)
            || func.parameters.iter().any(|p| p.ty.contains(GENERIC_PLACEHOLDER));
        let generic = if uses_generic {
            let mut placeholder = Type::new(PrimitiveKind::Any).named(GENERIC_PLACEHOLDER);
            placeholder.is_generic = true;
            let g = reg.alloc(placeholder);
            reg.ty_mut(ty).generic = Some(g);
            Some(g)
        } else {
            None
        };

        for (idx, param) in func.parameters.iter().enumerate() {
            let param_ty = reg.parse_feather_with_generic(&param.ty, generic);
            let sig = reg.set_param(ty, idx, &param.name, param_ty)?;
            let sig = reg.sig_mut(sig);
            sig.flags.set(Flags::OPTIONAL, param.optional);
            sig.flags.insert(Flags::NATIVE);
            sig.def = native_def();
            sig.description = param.description.clone();
        }
        let returns = reg.parse_feather_with_generic(&func.return_type, generic);
        reg.ty_mut(ty).returns = Some(returns);

        let sig = reg.add_member(targets.global, &func.name, Some(ty))?;
        reg.ty_mut(ty).signifier = Some(sig);
        let sig = reg.sig_mut(sig);
        sig.flags = Flags::GLOBAL | Flags::NATIVE;
        sig.def = native_def();
        sig.deprecated = func.deprecated;
        sig.description = func.description.clone();
        sig.module = Some(lib.module.clone());
        debug!(name = %func.name, "registered native function");
    }
    Ok(())
}
