use serde::Serialize;

/// Every kind a [`super::Type`] node can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PrimitiveKind {
    Any,
    Mixed,
    Unknown,
    Array,
    Bool,
    Function,
    Pointer,
    Real,
    String,
    Struct,
    Undefined,
    Enum,
    EnumMember,
    Union,
    // Assets
    AssetGMObject,
    AssetGMScript,
    AssetGMSprite,
    AssetGMRoom,
    AssetGMSound,
    AssetGMFont,
    AssetGMPath,
    AssetGMSequence,
    AssetGMShader,
    AssetGMTileSet,
    AssetGMTimeline,
    AssetGMAnimCurve,
    AssetGMAudioGroup,
    AssetGMParticleSystem,
    AssetScript,
    // Runtime handles
    IdInstance,
    IdDsList,
    IdDsMap,
    IdDsGrid,
    IdDsStack,
    IdDsQueue,
    IdDsPriority,
    IdBuffer,
    IdSurface,
    IdCamera,
    IdTimeSource,
    IdSound,
    IdVertexBuffer,
}

const NAMES: &[(PrimitiveKind, &str)] = &[
    (PrimitiveKind::Any, "Any"),
    (PrimitiveKind::Mixed, "Mixed"),
    (PrimitiveKind::Unknown, "Unknown"),
    (PrimitiveKind::Array, "Array"),
    (PrimitiveKind::Bool, "Bool"),
    (PrimitiveKind::Function, "Function"),
    (PrimitiveKind::Pointer, "Pointer"),
    (PrimitiveKind::Real, "Real"),
    (PrimitiveKind::String, "String"),
    (PrimitiveKind::Struct, "Struct"),
    (PrimitiveKind::Undefined, "Undefined"),
    (PrimitiveKind::Enum, "Enum"),
    (PrimitiveKind::EnumMember, "EnumMember"),
    (PrimitiveKind::Union, "Union"),
    (PrimitiveKind::AssetGMObject, "Asset.GMObject"),
    (PrimitiveKind::AssetGMScript, "Asset.GMScript"),
    (PrimitiveKind::AssetGMSprite, "Asset.GMSprite"),
    (PrimitiveKind::AssetGMRoom, "Asset.GMRoom"),
    (PrimitiveKind::AssetGMSound, "Asset.GMSound"),
    (PrimitiveKind::AssetGMFont, "Asset.GMFont"),
    (PrimitiveKind::AssetGMPath, "Asset.GMPath"),
    (PrimitiveKind::AssetGMSequence, "Asset.GMSequence"),
    (PrimitiveKind::AssetGMShader, "Asset.GMShader"),
    (PrimitiveKind::AssetGMTileSet, "Asset.GMTileSet"),
    (PrimitiveKind::AssetGMTimeline, "Asset.GMTimeline"),
    (PrimitiveKind::AssetGMAnimCurve, "Asset.GMAnimCurve"),
    (PrimitiveKind::AssetGMAudioGroup, "Asset.GMAudioGroup"),
    (PrimitiveKind::AssetGMParticleSystem, "Asset.GMParticleSystem"),
    (PrimitiveKind::AssetScript, "Asset.Script"),
    (PrimitiveKind::IdInstance, "Id.Instance"),
    (PrimitiveKind::IdDsList, "Id.DsList"),
    (PrimitiveKind::IdDsMap, "Id.DsMap"),
    (PrimitiveKind::IdDsGrid, "Id.DsGrid"),
    (PrimitiveKind::IdDsStack, "Id.DsStack"),
    (PrimitiveKind::IdDsQueue, "Id.DsQueue"),
    (PrimitiveKind::IdDsPriority, "Id.DsPriority"),
    (PrimitiveKind::IdBuffer, "Id.Buffer"),
    (PrimitiveKind::IdSurface, "Id.Surface"),
    (PrimitiveKind::IdCamera, "Id.Camera"),
    (PrimitiveKind::IdTimeSource, "Id.TimeSource"),
    (PrimitiveKind::IdSound, "Id.Sound"),
    (PrimitiveKind::IdVertexBuffer, "Id.VertexBuffer"),
];

impl PrimitiveKind {
    pub fn as_str(self) -> &'static str {
        NAMES
            .iter()
            .find(|(k, _)| *k == self)
            .map(|(_, n)| *n)
            .unwrap_or("Unknown")
    }

    /// Case-insensitive lookup of a primitive name such as `real` or `id.dslist`.
    pub fn from_name(name: &str) -> Option<Self> {
        NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(k, _)| *k)
            .or_else(|| match name.to_ascii_lowercase().as_str() {
                "int" | "int64" | "number" | "double" => Some(PrimitiveKind::Real),
                "boolean" => Some(PrimitiveKind::Bool),
                "void" => Some(PrimitiveKind::Undefined),
                "method" => Some(PrimitiveKind::Function),
                _ => None,
            })
    }

    /// Kinds that accept members.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Struct | PrimitiveKind::Enum | PrimitiveKind::IdInstance | PrimitiveKind::AssetGMObject
        )
    }

    /// Kinds that carry an item type (`Array<Real>`, `Id.DsMap<String>`).
    pub fn has_items(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Array
                | PrimitiveKind::Struct
                | PrimitiveKind::IdDsList
                | PrimitiveKind::IdDsMap
                | PrimitiveKind::IdDsGrid
                | PrimitiveKind::IdDsStack
                | PrimitiveKind::IdDsQueue
                | PrimitiveKind::IdDsPriority
        )
    }

    /// Kinds usable as the target of `with`.
    pub fn is_withable(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Any | PrimitiveKind::IdInstance | PrimitiveKind::AssetGMObject | PrimitiveKind::Struct
        )
    }

    /// Kinds that render as `Kind.Name` when named.
    pub fn renders_name(self) -> bool {
        matches!(self, PrimitiveKind::Function | PrimitiveKind::Struct | PrimitiveKind::Enum)
            || self.as_str().starts_with("Asset.")
            || self == PrimitiveKind::IdInstance
    }

    /// Kinds with no internal structure; two of them with the same kind are interchangeable.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Bool
                | PrimitiveKind::Pointer
                | PrimitiveKind::Real
                | PrimitiveKind::String
                | PrimitiveKind::Undefined
        )
    }
}
