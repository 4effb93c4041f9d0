use std::collections::BTreeSet;

use super::*;
use crate::token::{Position, Span};

fn variant_names(reg: &TypeRegistry, id: TypeId) -> BTreeSet<String> {
    reg.variants(id).into_iter().map(|v| reg.to_feather_string(v)).collect()
}

fn holder(reg: &mut TypeRegistry) -> (TypeId, SignifierId) {
    let container = reg.new_type(PrimitiveKind::Struct);
    let member = reg.add_member(container, "value", None).unwrap();
    (container, member)
}

#[test]
fn test_merge_is_symmetric() {
    let mut reg = TypeRegistry::new();
    let real = reg.scalar(PrimitiveKind::Real);
    let string = reg.scalar(PrimitiveKind::String);

    let (_, a) = holder(&mut reg);
    reg.add_type_to(a, real);
    reg.add_type_to(a, string);

    let (_, b) = holder(&mut reg);
    reg.add_type_to(b, string);
    reg.add_type_to(b, real);

    let ta = reg.sig(a).ty;
    let tb = reg.sig(b).ty;
    assert_eq!(reg.kind(ta), PrimitiveKind::Union);
    assert_eq!(variant_names(&reg, ta), variant_names(&reg, tb));
}

#[test]
fn test_merge_any_absorbs_in_both_orders() {
    let mut reg = TypeRegistry::new();
    let real = reg.scalar(PrimitiveKind::Real);
    let any = reg.any();

    let (_, a) = holder(&mut reg);
    reg.add_type_to(a, any);
    reg.add_type_to(a, real);

    let (_, b) = holder(&mut reg);
    reg.add_type_to(b, real);
    reg.add_type_to(b, any);

    assert_eq!(reg.kind(reg.sig(a).ty), PrimitiveKind::Any);
    assert_eq!(reg.kind(reg.sig(b).ty), PrimitiveKind::Any);
}

#[test]
fn test_merge_dedupes_scalars_and_skips_unknown() {
    let mut reg = TypeRegistry::new();
    let (_, a) = holder(&mut reg);
    let real = reg.scalar(PrimitiveKind::Real);
    let other_real = reg.new_type(PrimitiveKind::Real);
    let unknown = reg.unknown();
    reg.add_type_to(a, real);
    reg.add_type_to(a, other_real);
    reg.add_type_to(a, unknown);
    assert_eq!(reg.to_feather_string(reg.sig(a).ty), "Real");
}

#[test]
fn test_union_owned_by_each_signifier() {
    let mut reg = TypeRegistry::new();
    let real = reg.scalar(PrimitiveKind::Real);
    let string = reg.scalar(PrimitiveKind::String);
    let union = reg.union_of(&[real, string]);

    let (_, a) = holder(&mut reg);
    reg.add_type_to(a, union);
    let bool_ty = reg.scalar(PrimitiveKind::Bool);
    reg.add_type_to(a, bool_ty);

    assert_eq!(reg.variants(union).len(), 2);
    assert_eq!(reg.variants(reg.sig(a).ty).len(), 3);
}

#[test]
fn test_add_member_is_idempotent() {
    let mut reg = TypeRegistry::new();
    let container = reg.new_type(PrimitiveKind::Struct);
    let real = reg.scalar(PrimitiveKind::Real);
    let first = reg.add_member(container, "x", Some(real)).unwrap();
    let second = reg.add_member(container, "x", Some(real)).unwrap();
    assert_eq!(first, second);
    assert_eq!(reg.list_members(container).len(), 1);
    assert_eq!(reg.to_feather_string(reg.sig(first).ty), "Real");
}

#[test]
fn test_add_member_rejects_non_container() {
    let mut reg = TypeRegistry::new();
    let real = reg.scalar(PrimitiveKind::Real);
    let err = reg.add_member(real, "x", None).unwrap_err();
    assert!(err.to_string().contains("non-container"));
}

#[test]
fn test_derive_does_not_mutate_base() {
    let mut reg = TypeRegistry::new();
    let base = reg.new_type(PrimitiveKind::Struct);
    reg.add_member(base, "shared", None).unwrap();
    let child = reg.derive(base);
    reg.add_member(child, "own", None).unwrap();

    assert!(reg.get_member(child, "shared").is_some());
    assert!(reg.get_member(child, "own").is_some());
    assert!(reg.get_member(base, "own").is_none());
    assert_eq!(reg.list_members(base).len(), 1);
    assert_eq!(reg.list_members(child).len(), 2);
}

#[test]
fn test_from_identifier_falls_back_to_prefix() {
    let mut reg = TypeRegistry::new();
    let foo = reg.from_identifier("Id.Instance.Foo");
    assert_eq!(reg.kind(foo), PrimitiveKind::IdInstance);
    assert_eq!(reg.to_feather_string(foo), "Id.Instance.Foo");
    assert_eq!(reg.from_identifier("Id.Instance.Foo"), foo);

    let nested = reg.from_identifier("Struct.Outer.Inner");
    assert_eq!(reg.kind(nested), PrimitiveKind::Struct);
    let outer = reg.known("Struct.Outer").unwrap();
    assert_eq!(reg.ty(nested).parent, Some(outer));

    let nothing = reg.from_identifier("Nope");
    assert_eq!(reg.kind(nothing), PrimitiveKind::Unknown);
}

#[test]
fn test_feather_strings() {
    let mut reg = TypeRegistry::new();
    let cases = [
        ("Real", "Real"),
        ("real", "Real"),
        ("Array<String>", "Array<String>"),
        ("Array<Real|String>", "Array<Real | String>"),
        ("Id.DsMap<Bool>", "Id.DsMap<Bool>"),
        ("Struct.Point", "Struct.Point"),
        ("Real,Undefined", "Real | Undefined"),
        ("Asset.GMObject", "Asset.GMObject"),
        ("String OR Real", "String | Real"),
        ("Array[Real]", "Array<Real>"),
        ("", "Any"),
    ];
    for (input, expected) in cases {
        let ty = reg.parse_feather_type_string(input);
        assert_eq!(reg.to_feather_string(ty), expected, "input {input}");
    }
}

#[test]
fn test_empty_union_renders_mixed() {
    let mut reg = TypeRegistry::new();
    let union = reg.new_type(PrimitiveKind::Union);
    assert_eq!(reg.to_feather_string(union), "Mixed");
}

#[test]
fn test_function_code() {
    let mut reg = TypeRegistry::new();
    let func = reg.alloc(Type::new(PrimitiveKind::Function).named("lerp_to"));
    let real = reg.scalar(PrimitiveKind::Real);
    reg.set_param(func, 0, "from", real).unwrap();
    let to = reg.set_param(func, 1, "to", real).unwrap();
    reg.sig_mut(to).flags.insert(Flags::OPTIONAL);
    reg.ty_mut(func).returns = Some(real);
    assert_eq!(reg.code(func), "function lerp_to(from: Real, to?: Real): Real");
    assert_eq!(reg.to_feather_string(func), "Function.lerp_to");
}

#[test]
fn test_generic_substitution() {
    let mut reg = TypeRegistry::new();
    let generic = reg.alloc(Type::new(PrimitiveKind::Any).named(GENERIC_PLACEHOLDER));
    reg.ty_mut(generic).is_generic = true;
    let arr = reg.parse_feather_with_generic("Array<ArgumentIdentity>", Some(generic));
    assert!(reg.mentions_generic(arr, generic));

    let string = reg.scalar(PrimitiveKind::String);
    let bound = reg.substitute(arr, generic, string);
    assert_eq!(reg.to_feather_string(bound), "Array<String>");
    assert_eq!(reg.to_feather_string(arr), "Array<ArgumentIdentity>");
}

#[test]
fn test_signifier_refs_per_file() {
    let mut reg = TypeRegistry::new();
    let (_, sig) = holder(&mut reg);
    let span = Span::single(Position::start());
    reg.sig_mut(sig).add_ref(FileId(0), span, true);
    reg.sig_mut(sig).add_ref(FileId(1), span, false);
    reg.sig_mut(sig).add_ref(FileId(1), span, false);
    assert_eq!(reg.sig(sig).ref_count(), 3);
    reg.sig_mut(sig).remove_refs_in(FileId(1));
    assert_eq!(reg.sig(sig).ref_files().collect::<Vec<_>>(), vec![FileId(0)]);
}

#[test]
fn test_flags() {
    let mut flags = Flags::GLOBAL | Flags::NATIVE;
    assert!(flags.contains(Flags::GLOBAL));
    flags.remove(Flags::GLOBAL);
    assert!(!flags.contains(Flags::GLOBAL));
    assert_eq!(format!("{:?}", flags), "Flags(native)");
}

#[test]
fn test_collect_reuses_unreachable_slots() {
    let mut reg = TypeRegistry::new();
    let (kept, member) = holder(&mut reg);
    let real = reg.scalar(PrimitiveKind::Real);
    reg.add_type_to(member, real);
    let (dropped, dropped_member) = holder(&mut reg);
    let live = (reg.type_count(), reg.signifier_count());

    let released = reg.collect([kept], Vec::<SignifierId>::new());
    assert_eq!(released, (1, 1));
    assert_eq!(reg.type_count(), live.0 - 1);
    assert_eq!(reg.signifier_count(), live.1 - 1);
    assert!(!reg.contains_type(dropped));
    assert!(!reg.contains_signifier(dropped_member));
    assert!(reg.contains_type(kept));
    assert!(reg.contains_signifier(member));
    assert_eq!(reg.kind(reg.sig(member).ty), PrimitiveKind::Real);

    let capacity = reg.type_capacity();
    let fresh = reg.new_type(PrimitiveKind::Struct);
    assert_eq!(fresh.index(), dropped.index());
    assert_ne!(fresh, dropped);
    assert_eq!(reg.type_capacity(), capacity);
    assert!(reg.contains_type(fresh));
    assert!(!reg.contains_type(dropped));

    // Named types survive without any root.
    reg.register_known("Kept", fresh);
    assert_eq!(reg.collect(Vec::<TypeId>::new(), Vec::<SignifierId>::new()), (1, 1));
    assert!(reg.contains_type(fresh));
}
