use anyhow::{Result, anyhow};
use rustc_hash::FxHashMap;
use serde::Serialize;

use super::{PrimitiveKind, Signifier, SignifierId};

/// Slot of a [`Type`] in the arena. A slot is reused once nothing reaches it, under
/// a new generation, so ids kept from before never alias the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId {
    slot: u32,
    generation: u32,
}

impl TypeId {
    pub fn index(self) -> usize {
        self.slot as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// A node of the structural type graph.
#[derive(Debug, Clone)]
pub struct Type {
    pub kind: PrimitiveKind,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Type this one was derived from. Members resolve through the chain.
    pub parent: Option<TypeId>,
    members: Vec<SignifierId>,
    member_index: FxHashMap<String, SignifierId>,
    pub params: Vec<SignifierId>,
    pub returns: Option<TypeId>,
    /// Struct produced by calling a constructor with `new`.
    pub constructs: Option<TypeId>,
    /// Self context a function runs in.
    pub context: Option<TypeId>,
    pub items: Option<TypeId>,
    /// Variants of a union.
    pub variants: Vec<TypeId>,
    /// Symbol this type was declared by.
    pub signifier: Option<SignifierId>,
    /// Generic placeholder a native function binds at each call.
    pub generic: Option<TypeId>,
    pub is_generic: bool,
}

impl Type {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            name: None,
            description: None,
            parent: None,
            members: Vec::new(),
            member_index: FxHashMap::default(),
            params: Vec::new(),
            returns: None,
            constructs: None,
            context: None,
            items: None,
            variants: Vec::new(),
            signifier: None,
            generic: None,
            is_generic: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn own_members(&self) -> &[SignifierId] {
        &self.members
    }
}

/// Arena owning every type and symbol of a project, plus the table of named types
/// used to resolve type identifiers such as `Struct.Point`.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: Vec<Type>,
    signifiers: Vec<Signifier>,
    type_slots: Slots,
    signifier_slots: Slots,
    known: FxHashMap<String, TypeId>,
    scalars: FxHashMap<PrimitiveKind, TypeId>,
}

/// Generation per slot plus the slots released by the last collection.
#[derive(Debug, Clone, Default)]
struct Slots {
    generations: Vec<u32>,
    free: Vec<u32>,
}

impl Slots {
    /// A free slot to overwrite, or `None` to push a new one.
    fn take(&mut self) -> Option<(u32, u32)> {
        let slot = self.free.pop()?;
        Some((slot, self.generations[slot as usize]))
    }

    fn push(&mut self) -> (u32, u32) {
        self.generations.push(0);
        ((self.generations.len() - 1) as u32, 0)
    }

    fn is_current(&self, slot: usize, generation: u32) -> bool {
        self.generations.get(slot) == Some(&generation)
    }

    fn release(&mut self, slot: usize) {
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push(slot as u32);
    }

    fn free_mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.generations.len()];
        for slot in &self.free {
            mask[*slot as usize] = true;
        }
        mask
    }

    fn live(&self) -> usize {
        self.generations.len() - self.free.len()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

const MAX_PARENT_DEPTH: usize = 64;

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            signifiers: Vec::new(),
            type_slots: Slots::default(),
            signifier_slots: Slots::default(),
            known: FxHashMap::default(),
            scalars: FxHashMap::default(),
        }
    }

    pub fn alloc(&mut self, ty: Type) -> TypeId {
        match self.type_slots.take() {
            Some((slot, generation)) => {
                self.types[slot as usize] = ty;
                TypeId { slot, generation }
            }
            None => {
                let (slot, generation) = self.type_slots.push();
                self.types.push(ty);
                TypeId { slot, generation }
            }
        }
    }

    pub fn new_type(&mut self, kind: PrimitiveKind) -> TypeId {
        self.alloc(Type::new(kind))
    }

    /// Shared node for a kind with no inner structure. Never mutate the result.
    pub fn scalar(&mut self, kind: PrimitiveKind) -> TypeId {
        if let Some(id) = self.scalars.get(&kind) {
            return *id;
        }
        let id = self.new_type(kind);
        self.scalars.insert(kind, id);
        id
    }

    pub fn unknown(&mut self) -> TypeId {
        self.scalar(PrimitiveKind::Unknown)
    }

    pub fn any(&mut self) -> TypeId {
        self.scalar(PrimitiveKind::Any)
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub fn ty_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.index()]
    }

    pub fn kind(&self, id: TypeId) -> PrimitiveKind {
        self.ty(id).kind
    }

    pub fn sig(&self, id: SignifierId) -> &Signifier {
        &self.signifiers[id.index()]
    }

    pub fn sig_mut(&mut self, id: SignifierId) -> &mut Signifier {
        &mut self.signifiers[id.index()]
    }

    /// Types currently alive.
    pub fn type_count(&self) -> usize {
        self.type_slots.live()
    }

    /// Signifiers currently alive.
    pub fn signifier_count(&self) -> usize {
        self.signifier_slots.live()
    }

    /// Slots held for types, alive or free.
    pub fn type_capacity(&self) -> usize {
        self.types.len()
    }

    pub fn signifier_capacity(&self) -> usize {
        self.signifiers.len()
    }

    /// False once the slot behind `id` has been released.
    pub fn contains_type(&self, id: TypeId) -> bool {
        self.type_slots.is_current(id.index(), id.generation)
    }

    pub fn contains_signifier(&self, id: SignifierId) -> bool {
        self.signifier_slots.is_current(id.index(), id.generation())
    }

    /// A symbol not attached to any member table (locals, parameters).
    pub fn new_signifier(&mut self, parent: TypeId, name: impl Into<String>, ty: TypeId) -> SignifierId {
        let sig = Signifier::new(name, parent, ty);
        match self.signifier_slots.take() {
            Some((slot, generation)) => {
                self.signifiers[slot as usize] = sig;
                SignifierId::new(slot, generation)
            }
            None => {
                let (slot, generation) = self.signifier_slots.push();
                self.signifiers.push(sig);
                SignifierId::new(slot, generation)
            }
        }
    }

    /// Release every type and symbol not reachable from `type_roots`, `sig_roots`,
    /// the named-type table or the shared scalars. Returns the number of types and
    /// symbols released.
    pub fn collect(
        &mut self,
        type_roots: impl IntoIterator<Item = TypeId>,
        sig_roots: impl IntoIterator<Item = SignifierId>,
    ) -> (usize, usize) {
        let placeholder = self.unknown();
        let mut type_marks = self.type_slots.free_mask();
        let mut sig_marks = self.signifier_slots.free_mask();
        let type_free = type_marks.clone();
        let sig_free = sig_marks.clone();

        let mut types: Vec<TypeId> = type_roots.into_iter().collect();
        types.extend(self.known.values().copied());
        types.extend(self.scalars.values().copied());
        let mut sigs: Vec<SignifierId> = sig_roots.into_iter().collect();

        loop {
            if let Some(id) = types.pop() {
                if !self.contains_type(id) || type_marks[id.index()] {
                    continue;
                }
                type_marks[id.index()] = true;
                let ty = &self.types[id.index()];
                types.extend(ty.parent);
                types.extend(ty.returns);
                types.extend(ty.constructs);
                types.extend(ty.context);
                types.extend(ty.items);
                types.extend(ty.generic);
                types.extend(ty.variants.iter().copied());
                sigs.extend(ty.signifier);
                sigs.extend(ty.members.iter().copied());
                sigs.extend(ty.params.iter().copied());
            } else if let Some(id) = sigs.pop() {
                if !self.contains_signifier(id) || sig_marks[id.index()] {
                    continue;
                }
                sig_marks[id.index()] = true;
                let sig = &self.signifiers[id.index()];
                types.push(sig.parent);
                types.push(sig.ty);
            } else {
                break;
            }
        }

        let mut released = (0, 0);
        for slot in 0..self.types.len() {
            if !type_marks[slot] && !type_free[slot] {
                self.types[slot] = Type::new(PrimitiveKind::Unknown);
                self.type_slots.release(slot);
                released.0 += 1;
            }
        }
        for slot in 0..self.signifiers.len() {
            if !sig_marks[slot] && !sig_free[slot] {
                self.signifiers[slot] = Signifier::new(String::new(), placeholder, placeholder);
                self.signifier_slots.release(slot);
                released.1 += 1;
            }
        }
        released
    }

    /// Register `id` under `name` so type identifiers can find it.
    pub fn register_known(&mut self, name: impl Into<String>, id: TypeId) {
        self.known.insert(name.into(), id);
    }

    pub fn known(&self, name: &str) -> Option<TypeId> {
        self.known.get(name).copied()
    }

    /// New type of the same kind whose parent is `base`. `base` is left untouched.
    pub fn derive(&mut self, base: TypeId) -> TypeId {
        let source = self.ty(base);
        let mut ty = Type::new(source.kind);
        ty.name = source.name.clone();
        ty.items = source.items;
        ty.returns = source.returns;
        ty.context = source.context;
        ty.parent = Some(base);
        self.alloc(ty)
    }

    /// Resolve a dotted type identifier. Unknown suffixes become named types derived
    /// from the longest known prefix and are remembered for later lookups.
    pub fn from_identifier(&mut self, identifier: &str) -> TypeId {
        if let Some(id) = self.known(identifier) {
            return id;
        }
        if let Some(kind) = PrimitiveKind::from_name(identifier) {
            return self.fresh_of_kind(kind);
        }

        let parts: Vec<&str> = identifier.split('.').collect();
        for cut in (1..parts.len()).rev() {
            let prefix = parts[..cut].join(".");
            let base = if let Some(id) = self.known(&prefix) {
                id
            } else if let Some(kind) = PrimitiveKind::from_name(&prefix) {
                self.scalar(kind)
            } else {
                continue;
            };
            let mut current = base;
            let mut path = prefix;
            for part in &parts[cut..] {
                path = format!("{path}.{part}");
                let derived = self.derive(current);
                self.ty_mut(derived).name = Some((*part).to_string());
                self.register_known(path.clone(), derived);
                current = derived;
            }
            return current;
        }
        self.unknown()
    }

    fn fresh_of_kind(&mut self, kind: PrimitiveKind) -> TypeId {
        if kind.is_scalar() || matches!(kind, PrimitiveKind::Any | PrimitiveKind::Unknown | PrimitiveKind::Mixed) {
            self.scalar(kind)
        } else {
            self.new_type(kind)
        }
    }

    /// Walk `id` and its parents, nearest first.
    pub fn lineage(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = vec![id];
        let mut current = self.ty(id).parent;
        while let Some(parent) = current {
            if chain.contains(&parent) || chain.len() >= MAX_PARENT_DEPTH {
                break;
            }
            chain.push(parent);
            current = self.ty(parent).parent;
        }
        chain
    }

    pub fn own_member(&self, container: TypeId, name: &str) -> Option<SignifierId> {
        self.ty(container).member_index.get(name).copied()
    }

    /// Member lookup through the parent chain.
    pub fn get_member(&self, container: TypeId, name: &str) -> Option<SignifierId> {
        self.lineage(container)
            .into_iter()
            .find_map(|ty| self.own_member(ty, name))
    }

    /// Every visible member, nearest declaration first, in insertion order.
    pub fn list_members(&self, container: TypeId) -> Vec<SignifierId> {
        let mut seen: FxHashMap<&str, ()> = FxHashMap::default();
        let mut out = Vec::new();
        for ty in self.lineage(container) {
            for member in &self.ty(ty).members {
                let name = self.sig(*member).name.as_str();
                if seen.insert(name, ()).is_none() {
                    out.push(*member);
                }
            }
        }
        out
    }

    /// Return the member `name` of `container`, creating it with an `Unknown` type if
    /// absent, then merge `ty` into it. Only containers accept members.
    pub fn add_member(&mut self, container: TypeId, name: &str, ty: Option<TypeId>) -> Result<SignifierId> {
        let kind = self.kind(container);
        if !kind.is_container() {
            return Err(anyhow!(
                "cannot add member `{}` to non-container type `{}`",
                name,
                self.to_feather_string(container)
            ));
        }
        let id = match self.own_member(container, name) {
            Some(id) => id,
            None => {
                let unknown = self.unknown();
                let id = self.new_signifier(container, name, unknown);
                let target = self.ty_mut(container);
                target.members.push(id);
                target.member_index.insert(name.to_string(), id);
                id
            }
        };
        if let Some(ty) = ty {
            self.add_type_to(id, ty);
        }
        Ok(id)
    }

    /// Detach `name` from `container`. The signifier itself stays in the arena.
    pub fn remove_member(&mut self, container: TypeId, name: &str) -> Option<SignifierId> {
        let target = self.ty_mut(container);
        let id = target.member_index.remove(name)?;
        target.members.retain(|m| *m != id);
        Some(id)
    }

    /// Append a parameter slot to a function type, or reuse the one at `idx`.
    pub fn set_param(&mut self, function: TypeId, idx: usize, name: &str, ty: TypeId) -> Result<SignifierId> {
        if self.kind(function) != PrimitiveKind::Function {
            return Err(anyhow!("cannot add parameter `{}` to a non-function type", name));
        }
        let existing = self.ty(function).params.get(idx).copied();
        let id = match existing {
            Some(id) => {
                let sig = self.sig_mut(id);
                sig.name = name.to_string();
                sig.ty = ty;
                id
            }
            None => {
                let id = self.new_signifier(function, name, ty);
                self.ty_mut(function).params.push(id);
                id
            }
        };
        let sig = self.sig_mut(id);
        sig.idx = Some(idx);
        sig.flags.insert(super::Flags::PARAMETER);
        Ok(id)
    }

    /// Point parameter slot `idx` at an existing symbol (a function-local variable).
    pub fn bind_param(&mut self, function: TypeId, idx: usize, sig: SignifierId) -> Result<()> {
        if self.kind(function) != PrimitiveKind::Function {
            return Err(anyhow!("cannot bind parameter {} of a non-function type", idx));
        }
        let params = &mut self.ty_mut(function).params;
        match idx.cmp(&params.len()) {
            std::cmp::Ordering::Less => params[idx] = sig,
            std::cmp::Ordering::Equal => params.push(sig),
            std::cmp::Ordering::Greater => {
                return Err(anyhow!("parameter {} bound before parameter {}", idx, params.len()));
            }
        }
        let sig = self.sig_mut(sig);
        sig.idx = Some(idx);
        sig.flags.insert(super::Flags::PARAMETER);
        Ok(())
    }

    pub fn truncate_params(&mut self, function: TypeId, len: usize) {
        self.ty_mut(function).params.truncate(len);
    }

    /// Parameters of a function, falling back to the type it was derived from.
    pub fn params(&self, function: TypeId) -> &[SignifierId] {
        for ty in self.lineage(function) {
            if !self.ty(ty).params.is_empty() {
                return &self.ty(ty).params;
            }
        }
        &[]
    }

    /// Flattened union variants, or `id` itself for any other kind.
    pub fn variants(&self, id: TypeId) -> Vec<TypeId> {
        let ty = self.ty(id);
        if ty.kind != PrimitiveKind::Union {
            return vec![id];
        }
        let mut out = Vec::new();
        for v in &ty.variants {
            for inner in self.variants(*v) {
                if !out.contains(&inner) {
                    out.push(inner);
                }
            }
        }
        out
    }

    fn same_shape(&self, a: TypeId, b: TypeId) -> bool {
        a == b || (self.kind(a) == self.kind(b) && self.kind(a).is_scalar())
    }

    fn merge_variants(&self, mut into: Vec<TypeId>, incoming: &[TypeId]) -> Vec<TypeId> {
        for v in incoming {
            if !into.iter().any(|e| self.same_shape(*e, *v)) {
                into.push(*v);
            }
        }
        into
    }

    fn union_from(&mut self, variants: Vec<TypeId>) -> TypeId {
        match variants.as_slice() {
            [] => self.unknown(),
            [single] => *single,
            _ => {
                let mut ty = Type::new(PrimitiveKind::Union);
                ty.variants = variants;
                self.alloc(ty)
            }
        }
    }

    /// One type covering all of `types`; `Unknown` entries are dropped.
    pub fn union_of(&mut self, types: &[TypeId]) -> TypeId {
        let mut variants = Vec::new();
        for ty in types {
            let flat: Vec<TypeId> = self
                .variants(*ty)
                .into_iter()
                .filter(|v| self.kind(*v) != PrimitiveKind::Unknown)
                .collect();
            if let Some(absorbing) = flat
                .iter()
                .find(|v| matches!(self.kind(**v), PrimitiveKind::Any | PrimitiveKind::Mixed))
            {
                return *absorbing;
            }
            variants = self.merge_variants(variants, &flat);
        }
        self.union_from(variants)
    }

    /// Merge `incoming` into the type of `sig`. The result does not depend on the
    /// order in which types arrive.
    pub fn add_type_to(&mut self, sig: SignifierId, incoming: TypeId) {
        let current = self.sig(sig).ty;
        if matches!(self.kind(current), PrimitiveKind::Any | PrimitiveKind::Mixed) {
            return;
        }
        let merged = self.union_of(&[current, incoming]);
        if merged == current {
            return;
        }
        let unchanged = self.kind(current) == PrimitiveKind::Union
            && self.kind(merged) == PrimitiveKind::Union
            && self.ty(merged).variants.len() == self.variants(current).len();
        if !unchanged {
            self.sig_mut(sig).ty = merged;
        }
    }

    /// Replace the type of `sig` outright.
    pub fn set_type(&mut self, sig: SignifierId, ty: TypeId) {
        self.sig_mut(sig).ty = ty;
    }

    pub fn array_of(&mut self, item: TypeId) -> TypeId {
        let mut ty = Type::new(PrimitiveKind::Array);
        ty.items = Some(item);
        self.alloc(ty)
    }

    /// True when `ty` is the generic placeholder or a container of it.
    pub fn mentions_generic(&self, ty: TypeId, generic: TypeId) -> bool {
        if ty == generic {
            return true;
        }
        let node = self.ty(ty);
        node.items.is_some_and(|item| self.mentions_generic(item, generic))
            || node.variants.iter().any(|v| self.mentions_generic(*v, generic))
    }

    /// Copy of `ty` with the generic placeholder replaced by `bound`.
    pub fn substitute(&mut self, ty: TypeId, generic: TypeId, bound: TypeId) -> TypeId {
        if ty == generic {
            return bound;
        }
        if !self.mentions_generic(ty, generic) {
            return ty;
        }
        let node = self.ty(ty).clone();
        if node.kind == PrimitiveKind::Union {
            let variants: Vec<TypeId> = node
                .variants
                .iter()
                .map(|v| self.substitute(*v, generic, bound))
                .collect();
            return self.union_of(&variants);
        }
        let mut copy = Type::new(node.kind);
        copy.name = node.name;
        copy.items = node.items.map(|item| self.substitute(item, generic, bound));
        self.alloc(copy)
    }
}
