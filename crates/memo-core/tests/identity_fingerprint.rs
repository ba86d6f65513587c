use std::collections::HashSet;
use std::sync::Arc;

use memo_core::{ArgValue, CoreCacheError, DescriptorArg, Identity, IdentityDescriptor};
use serde_json::json;

fn no_kwargs() -> Vec<(String, ArgValue)> {
    vec![]
}

#[test]
fn structurally_equal_identities_share_a_fingerprint() {
    let a = Identity::new("proc",
                          vec![ArgValue::Literal(json!(1)), ArgValue::Literal(json!("x"))],
                          vec![("alpha", ArgValue::Literal(json!(true))), ("beta", ArgValue::Literal(json!(2.5)))]).unwrap();
    // Mismos campos, kwargs declarados en otro orden: el orden de kwargs no
    // es semántico.
    let b = Identity::new("proc",
                          vec![ArgValue::Literal(json!(1)), ArgValue::Literal(json!("x"))],
                          vec![("beta", ArgValue::Literal(json!(2.5))), ("alpha", ArgValue::Literal(json!(true)))]).unwrap();
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn any_single_field_change_changes_the_fingerprint() {
    let base = Identity::new("proc",
                             vec![ArgValue::Literal(json!(1)), ArgValue::Literal(json!(2))],
                             vec![("k", ArgValue::Literal(json!("v")))]).unwrap();

    let renamed = Identity::new("proc_b",
                                vec![ArgValue::Literal(json!(1)), ArgValue::Literal(json!(2))],
                                vec![("k", ArgValue::Literal(json!("v")))]).unwrap();
    let arg_changed = Identity::new("proc",
                                    vec![ArgValue::Literal(json!(1)), ArgValue::Literal(json!(3))],
                                    vec![("k", ArgValue::Literal(json!("v")))]).unwrap();
    let kwarg_changed = Identity::new("proc",
                                      vec![ArgValue::Literal(json!(1)), ArgValue::Literal(json!(2))],
                                      vec![("k", ArgValue::Literal(json!("w")))]).unwrap();
    // El orden posicional sí es semántico.
    let args_swapped = Identity::new("proc",
                                     vec![ArgValue::Literal(json!(2)), ArgValue::Literal(json!(1))],
                                     vec![("k", ArgValue::Literal(json!("v")))]).unwrap();

    for other in [&renamed, &arg_changed, &kwarg_changed, &args_swapped] {
        assert_ne!(base.fingerprint(), other.fingerprint());
    }
}

#[test]
fn many_mutations_never_collide() {
    let mut seen = HashSet::new();
    for i in 0..256u32 {
        let id = Identity::new("sweep",
                               vec![ArgValue::Literal(json!(i))],
                               vec![("num_mul", ArgValue::Literal(json!(i * 7)))]).unwrap();
        assert!(seen.insert(id.fingerprint().to_string()), "collision at i={i}");
    }
}

#[test]
fn zero_argument_identity_is_addressable_by_name() {
    let a = Identity::nullary("source").unwrap();
    let b = Identity::nullary("other_source").unwrap();
    assert_eq!(a.fingerprint().len(), 64);
    assert_ne!(a.fingerprint(), b.fingerprint());
}

#[test]
fn nested_identity_contributes_through_its_fingerprint() {
    let leaf_a = Arc::new(Identity::new("leaf", vec![ArgValue::Literal(json!(1))], no_kwargs()).unwrap());
    let leaf_b = Arc::new(Identity::new("leaf", vec![ArgValue::Literal(json!(2))], no_kwargs()).unwrap());

    let parent_a = Identity::new("parent", vec![ArgValue::identity(&leaf_a)], no_kwargs()).unwrap();
    let parent_a2 = Identity::new("parent", vec![ArgValue::identity(&leaf_a)], no_kwargs()).unwrap();
    let parent_b = Identity::new("parent", vec![ArgValue::identity(&leaf_b)], no_kwargs()).unwrap();

    assert_eq!(parent_a.fingerprint(), parent_a2.fingerprint());
    // Cambiar la hoja cambia el fingerprint del padre.
    assert_ne!(parent_a.fingerprint(), parent_b.fingerprint());
}

#[test]
fn a_literal_fingerprint_string_is_not_a_reference() {
    let leaf = Arc::new(Identity::nullary("leaf").unwrap());
    let with_ref = Identity::new("parent", vec![ArgValue::identity(&leaf)], no_kwargs()).unwrap();
    // Mismo texto, pero como literal: el tag lit/ref los separa en el hash.
    let with_lit = Identity::new("parent",
                                 vec![ArgValue::Literal(json!(leaf.fingerprint()))],
                                 no_kwargs()).unwrap();
    assert_ne!(with_ref.fingerprint(), with_lit.fingerprint());
}

#[test]
fn duplicate_kwarg_key_is_rejected_before_hashing() {
    let err = Identity::new("proc",
                            vec![],
                            vec![("k", ArgValue::Literal(json!(1))), ("k", ArgValue::Literal(json!(2)))]).unwrap_err();
    assert!(matches!(err, CoreCacheError::MalformedIdentity(_)));
}

#[test]
fn unserializable_literal_is_rejected() {
    // Claves no-string no tienen representación JSON.
    let mut weird = std::collections::HashMap::new();
    weird.insert((1u8, 2u8), 3);
    let err = ArgValue::literal(weird).unwrap_err();
    assert!(matches!(err, CoreCacheError::MalformedIdentity(_)));
}

#[test]
fn descriptor_round_trips_and_rederives_the_fingerprint() {
    let upstream = Arc::new(Identity::new("source", vec![ArgValue::Literal(json!("s3://raw"))], no_kwargs()).unwrap());
    let id = Identity::new("proc1",
                           vec![ArgValue::identity(&upstream)],
                           vec![("num_mul", ArgValue::Literal(json!(50)))]).unwrap();

    let descriptor = id.descriptor();
    // La sub-identidad se guarda como referencia, no inline.
    assert_eq!(descriptor.args[0], DescriptorArg::Ref(upstream.fingerprint().to_string()));

    let persisted = serde_json::to_string(&descriptor).unwrap();
    let recovered: IdentityDescriptor = serde_json::from_str(&persisted).unwrap();
    assert_eq!(recovered, descriptor);
    assert_eq!(recovered.fingerprint(), id.fingerprint());
}

#[test]
fn float_literals_hash_by_canonical_text() {
    let a = Identity::new("f", vec![ArgValue::Literal(json!(0.1))], no_kwargs()).unwrap();
    let b = Identity::new("f", vec![ArgValue::literal(0.1f64).unwrap()], no_kwargs()).unwrap();
    assert_eq!(a.fingerprint(), b.fingerprint());
}
