use std::collections::BTreeMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::Serialize;

use super::TypeId;
use crate::token::Span;

/// Index of a source file inside a project. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(pub(crate) u32);

impl FileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Slot of a [`Signifier`] in the arena, tagged with the slot's generation like
/// [`TypeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SignifierId {
    slot: u32,
    generation: u32,
}

impl SignifierId {
    pub(crate) fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    pub fn index(self) -> usize {
        self.slot as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Symbol flags, combinable with `|`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);
    pub const GLOBAL: Flags = Flags(1);
    pub const LOCAL: Flags = Flags(1 << 1);
    pub const INSTANCE: Flags = Flags(1 << 2);
    pub const STATIC: Flags = Flags(1 << 3);
    pub const NATIVE: Flags = Flags(1 << 4);
    pub const WRITABLE: Flags = Flags(1 << 5);
    pub const MACRO: Flags = Flags(1 << 6);
    pub const ASSET: Flags = Flags(1 << 7);
    pub const PARAMETER: Flags = Flags(1 << 8);
    pub const OPTIONAL: Flags = Flags(1 << 9);
    pub const ENUM: Flags = Flags(1 << 10);
    pub const ENUM_MEMBER: Flags = Flags(1 << 11);
    pub const MIXIN: Flags = Flags(1 << 12);

    const NAMES: [(Flags, &'static str); 13] = [
        (Flags::GLOBAL, "global"),
        (Flags::LOCAL, "local"),
        (Flags::INSTANCE, "instance"),
        (Flags::STATIC, "static"),
        (Flags::NATIVE, "native"),
        (Flags::WRITABLE, "writable"),
        (Flags::MACRO, "macro"),
        (Flags::ASSET, "asset"),
        (Flags::PARAMETER, "parameter"),
        (Flags::OPTIONAL, "optional"),
        (Flags::ENUM, "enum"),
        (Flags::ENUM_MEMBER, "enum_member"),
        (Flags::MIXIN, "mixin"),
    ];

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: Flags, on: bool) {
        if on {
            self.insert(other)
        } else {
            self.remove(other)
        }
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Flags::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "Flags({})", names.join(" | "))
    }
}

/// Where a symbol is declared. Natives have neither file nor span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Def {
    pub file: Option<FileId>,
    pub span: Option<Span>,
}

/// One occurrence of a symbol, as indexed on the symbol itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefRecord {
    pub span: Span,
    pub is_def: bool,
}

/// A named symbol: a global, a local, a struct member or a function parameter.
#[derive(Debug, Clone)]
pub struct Signifier {
    pub name: String,
    /// The container this symbol is a member or parameter of.
    pub parent: TypeId,
    pub ty: TypeId,
    pub flags: Flags,
    pub def: Option<Def>,
    /// Parameter position, for parameters.
    pub idx: Option<usize>,
    pub description: Option<String>,
    pub deprecated: bool,
    /// Native module the symbol was loaded from.
    pub module: Option<String>,
    refs: BTreeMap<FileId, Vec<RefRecord>>,
}

impl Signifier {
    pub(crate) fn new(name: impl Into<String>, parent: TypeId, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            parent,
            ty,
            flags: Flags::WRITABLE,
            def: None,
            idx: None,
            description: None,
            deprecated: false,
            module: None,
            refs: BTreeMap::new(),
        }
    }

    pub fn is(&self, flag: Flags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_native(&self) -> bool {
        self.is(Flags::NATIVE)
    }

    /// Declared symbols have a definition or come from a native library.
    pub fn is_declared(&self) -> bool {
        self.def.is_some() || self.is_native()
    }

    pub fn is_optional(&self) -> bool {
        self.is(Flags::OPTIONAL)
    }

    pub fn def_file(&self) -> Option<FileId> {
        self.def.and_then(|d| d.file)
    }

    pub fn set_def(&mut self, file: FileId, span: Span) {
        self.def = Some(Def {
            file: Some(file),
            span: Some(span),
        });
    }

    pub fn unset_def(&mut self) {
        self.def = None;
    }

    pub fn add_ref(&mut self, file: FileId, span: Span, is_def: bool) {
        self.refs.entry(file).or_default().push(RefRecord { span, is_def });
    }

    /// Drop every reference located in `file`.
    pub fn remove_refs_in(&mut self, file: FileId) {
        self.refs.remove(&file);
    }

    pub fn ref_files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.refs.keys().copied()
    }

    pub fn refs(&self) -> impl Iterator<Item = (FileId, &RefRecord)> + '_ {
        self.refs
            .iter()
            .flat_map(|(file, records)| records.iter().map(move |r| (*file, r)))
    }

    pub fn ref_count(&self) -> usize {
        self.refs.values().map(Vec::len).sum()
    }
}
