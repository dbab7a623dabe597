//! Conformance suite for `Object.entries`.
//!
//! Ported case-for-case from test262's `built-ins/Object/entries` tests:
//! identity metadata, getter-error propagation, null/undefined rejection,
//! iteration-time mutation isolation, prototype exclusion, primitive
//! coercion, and symbol-key exclusion. Tests gated on a capability flag
//! return early (skip) when the flag is off.

use entries_runtime::capabilities::Capabilities;
use entries_runtime::object_model::{
    EngineError, JsValue, ObjectHandle, PropertyDescriptor, PropertyKey,
};
use entries_runtime::realm::{Realm, OBJECT_ENTRIES};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn str_key(s: &str) -> PropertyKey {
    PropertyKey::String(s.to_string())
}

fn str_val(s: &str) -> JsValue {
    JsValue::Str(s.to_string())
}

fn entry(k: &str, v: JsValue) -> (String, JsValue) {
    (k.to_string(), v)
}

fn caps(realm: &mut Realm) -> Capabilities {
    Capabilities::probe(realm)
}

// ===========================================================================
// Identity metadata
// ===========================================================================

#[test]
fn has_name_entries() {
    let mut realm = Realm::new();
    if !caps(&mut realm).functions_have_names {
        return; // skip
    }
    assert_eq!(OBJECT_ENTRIES.name, "entries");
}

#[test]
fn has_length_1() {
    assert_eq!(OBJECT_ENTRIES.length, 1);
}

// ===========================================================================
// Exception propagation
// ===========================================================================

#[test]
fn terminates_if_getting_a_value_throws() {
    let mut realm = Realm::new();
    let obj = realm.heap.alloc_plain();
    realm
        .define_getter(obj, "a", |_realm, _this| {
            Err(EngineError::thrown("This is the thrown error"))
        })
        .unwrap();
    realm
        .define_getter(obj, "b", |_realm, _this| Err(EngineError::thrown("")))
        .unwrap();

    let err = realm.entries(&JsValue::Object(obj)).unwrap_err();
    // The first getter's error surfaces, unmodified; "b" is never reached.
    assert_eq!(err, EngineError::thrown("This is the thrown error"));
    assert_eq!(err.to_string(), "This is the thrown error");
}

#[test]
fn second_getter_never_runs_after_first_throws() {
    let mut realm = Realm::new();
    let obj = realm.heap.alloc_plain();
    let sentinel = realm.heap.alloc_plain();
    realm
        .define_getter(obj, "a", |_realm, _this| Err(EngineError::thrown("stop")))
        .unwrap();
    realm
        .define_getter(obj, "b", move |realm, _this| {
            realm
                .heap
                .set_property(sentinel, "ran".into(), JsValue::Bool(true))?;
            Ok(str_val("B"))
        })
        .unwrap();

    assert!(realm.entries(&JsValue::Object(obj)).is_err());
    assert!(!realm
        .heap
        .has_own_property(sentinel, &str_key("ran"))
        .unwrap());
}

// ===========================================================================
// Null/undefined rejection
// ===========================================================================

#[test]
fn throws_type_error_when_called_with_null() {
    let mut realm = Realm::new();
    let err = realm.entries(&JsValue::Null).unwrap_err();
    assert!(matches!(err, EngineError::TypeError(_)));
}

#[test]
fn throws_type_error_when_called_with_undefined() {
    let mut realm = Realm::new();
    let err = realm.entries(&JsValue::Undefined).unwrap_err();
    assert!(matches!(err, EngineError::TypeError(_)));
}

// ===========================================================================
// Iteration-time mutation isolation
// ===========================================================================

#[test]
fn does_not_see_a_new_element_added_by_a_getter_hit_during_iteration() {
    // { a: 'A', get b() { this.c = 'C'; return 'B'; } }
    let mut realm = Realm::new();
    let obj = realm.heap.alloc_plain();
    realm.heap.set_property(obj, "a".into(), str_val("A")).unwrap();
    realm
        .define_getter(obj, "b", |realm, this| {
            realm.heap.set_property(this, "c".into(), str_val("C"))?;
            Ok(str_val("B"))
        })
        .unwrap();

    let result = realm.entries(&JsValue::Object(obj)).unwrap();

    assert_eq!(result.len(), 2, "result has 2 items");
    assert_eq!(
        result,
        vec![entry("a", str_val("A")), entry("b", str_val("B"))]
    );
    // The getter did run: "c" is an own property now, just not in the result.
    assert!(realm.heap.has_own_property(obj, &str_key("c")).unwrap());
}

#[test]
fn does_not_see_an_element_made_non_enumerable_by_a_getter_hit_during_iteration() {
    let mut realm = Realm::new();
    if !caps(&mut realm).supports_descriptors {
        return; // skip
    }

    // { a: 'A', get b() { defineProperty(this, 'c', {enumerable: false}); return 'B'; }, c: 'C' }
    let obj = realm.heap.alloc_plain();
    realm.heap.set_property(obj, "a".into(), str_val("A")).unwrap();
    realm
        .define_getter(obj, "b", |realm, this| {
            let mut desc = realm
                .heap
                .get_own_property_descriptor(this, &str_key("c"))?
                .expect("c is an own property");
            desc.set_non_enumerable();
            realm.heap.define_property(this, "c".into(), desc)?;
            Ok(str_val("B"))
        })
        .unwrap();
    realm.heap.set_property(obj, "c".into(), str_val("C")).unwrap();

    let result = realm.entries(&JsValue::Object(obj)).unwrap();

    assert_eq!(result.len(), 2, "result has 2 items");
    assert_eq!(
        result,
        vec![entry("a", str_val("A")), entry("b", str_val("B"))]
    );
}

#[test]
fn does_not_see_an_element_removed_by_a_getter_hit_during_iteration() {
    // { a: 'A', get b() { delete this.c; return 'B'; }, c: 'C' }
    let mut realm = Realm::new();
    let obj = realm.heap.alloc_plain();
    realm.heap.set_property(obj, "a".into(), str_val("A")).unwrap();
    realm
        .define_getter(obj, "b", |realm, this| {
            realm.heap.delete_property(this, &str_key("c"))?;
            Ok(str_val("B"))
        })
        .unwrap();
    realm.heap.set_property(obj, "c".into(), str_val("C")).unwrap();

    let result = realm.entries(&JsValue::Object(obj)).unwrap();

    assert_eq!(result.len(), 2, "result has 2 items");
    assert_eq!(
        result,
        vec![entry("a", str_val("A")), entry("b", str_val("B"))]
    );
}

// ===========================================================================
// Prototype exclusion
// ===========================================================================

#[test]
fn does_not_see_inherited_properties() {
    let mut realm = Realm::new();

    // F.prototype.a = {}; F.prototype.b = {};
    let proto = realm.heap.alloc_plain();
    let proto_a = realm.heap.alloc_plain();
    let proto_b = realm.heap.alloc_plain();
    realm
        .heap
        .set_property(proto, "a".into(), JsValue::Object(proto_a))
        .unwrap();
    realm
        .heap
        .set_property(proto, "b".into(), JsValue::Object(proto_b))
        .unwrap();

    // f.b = {} shadows the prototype; f.c = {} is solely an own property.
    let f = realm.heap.alloc(Some(proto));
    let own_b = realm.heap.alloc_plain();
    let own_c = realm.heap.alloc_plain();
    realm
        .heap
        .set_property(f, "b".into(), JsValue::Object(own_b))
        .unwrap();
    realm
        .heap
        .set_property(f, "c".into(), JsValue::Object(own_c))
        .unwrap();

    let result = realm.entries(&JsValue::Object(f)).unwrap();

    assert_eq!(result.len(), 2, "result has 2 items");
    assert_eq!(
        result,
        vec![
            entry("b", JsValue::Object(own_b)),
            entry("c", JsValue::Object(own_c)),
        ]
    );
}

// ===========================================================================
// Primitive coercion
// ===========================================================================

#[test]
fn accepts_boolean_primitives() {
    let mut realm = Realm::new();
    if !caps(&mut realm).keys_accepts_primitives {
        return; // skip
    }

    let true_result = realm.entries(&JsValue::Bool(true)).unwrap();
    assert_eq!(true_result.len(), 0, "true has 0 entries");

    let false_result = realm.entries(&JsValue::Bool(false)).unwrap();
    assert_eq!(false_result.len(), 0, "false has 0 entries");
}

#[test]
fn accepts_number_primitives() {
    let mut realm = Realm::new();
    if !caps(&mut realm).keys_accepts_primitives {
        return; // skip
    }

    for (n, label) in [
        (0.0, "0"),
        (-0.0, "-0"),
        (f64::INFINITY, "Infinity"),
        (f64::NEG_INFINITY, "-Infinity"),
        (f64::NAN, "NaN"),
        (std::f64::consts::PI, "Math.PI"),
    ] {
        let result = realm.entries(&JsValue::Num(n)).unwrap();
        assert_eq!(result.len(), 0, "{label} has zero entries");
    }
}

#[test]
fn accepts_string_primitives() {
    let mut realm = Realm::new();
    if !caps(&mut realm).keys_accepts_primitives {
        return; // skip
    }

    let result = realm.entries(&str_val("abc")).unwrap();

    assert_eq!(result.len(), 3, "result has 3 items");
    assert_eq!(
        result,
        vec![
            entry("0", str_val("a")),
            entry("1", str_val("b")),
            entry("2", str_val("c")),
        ]
    );
}

#[test]
fn accepts_symbol_primitives() {
    let mut realm = Realm::new();
    let caps = caps(&mut realm);
    if !caps.has_symbols || !caps.keys_accepts_primitives {
        return; // skip
    }

    let sym = realm.heap.alloc_symbol(None);
    let result = realm.entries(&JsValue::Symbol(sym)).unwrap();
    assert_eq!(result.len(), 0, "result has 0 items");
}

// ===========================================================================
// Symbol-key exclusion
// ===========================================================================

#[test]
fn does_not_include_symbol_keys() {
    let mut realm = Realm::new();
    if !caps(&mut realm).has_symbols {
        return; // skip
    }

    let value = realm.heap.alloc_plain();
    let enum_sym = realm.heap.alloc_symbol(Some("enum"));
    let non_enum_sym = realm.heap.alloc_symbol(Some("nonenum"));
    let sym_value = realm.heap.alloc_symbol(Some("value"));

    // { key: symValue, [enumSym]: value, [nonEnumSym (non-enumerable)]: value }
    let obj = realm.heap.alloc_plain();
    realm
        .heap
        .set_property(obj, "key".into(), JsValue::Symbol(sym_value))
        .unwrap();
    realm
        .heap
        .set_property(obj, enum_sym.into(), JsValue::Object(value))
        .unwrap();
    realm
        .heap
        .define_property(
            obj,
            non_enum_sym.into(),
            PropertyDescriptor::Data {
                value: JsValue::Object(value),
                writable: true,
                enumerable: false,
                configurable: true,
            },
        )
        .unwrap();

    let result = realm.entries(&JsValue::Object(obj)).unwrap();

    assert_eq!(result.len(), 1, "result has 1 item");
    assert_eq!(result, vec![entry("key", JsValue::Symbol(sym_value))]);
}

// ===========================================================================
// Ordering policy
// ===========================================================================

#[test]
fn integer_like_keys_come_first_in_numeric_order() {
    let mut realm = Realm::new();
    let obj = realm.heap.alloc_plain();
    for (k, v) in [("b", "B"), ("10", "ten"), ("a", "A"), ("2", "two")] {
        realm.heap.set_property(obj, k.into(), str_val(v)).unwrap();
    }

    let result = realm.entries(&JsValue::Object(obj)).unwrap();
    assert_eq!(
        result,
        vec![
            entry("2", str_val("two")),
            entry("10", str_val("ten")),
            entry("b", str_val("B")),
            entry("a", str_val("A")),
        ]
    );
}

#[test]
fn handle_stays_valid_across_calls() {
    // A getter mutation is visible to a later, separate call.
    let mut realm = Realm::new();
    let obj = realm.heap.alloc_plain();
    realm.heap.set_property(obj, "a".into(), str_val("A")).unwrap();
    realm
        .define_getter(obj, "b", |realm, this| {
            realm.heap.set_property(this, "c".into(), str_val("C"))?;
            Ok(str_val("B"))
        })
        .unwrap();

    let first = realm.entries(&JsValue::Object(obj)).unwrap();
    assert_eq!(first.len(), 2);

    let second = realm.entries(&JsValue::Object(obj)).unwrap();
    assert_eq!(
        second,
        vec![
            entry("a", str_val("A")),
            entry("b", str_val("B")),
            entry("c", str_val("C")),
        ]
    );
}

#[test]
fn invalid_handle_is_not_a_type_error() {
    let mut realm = Realm::new();
    let err = realm
        .entries(&JsValue::Object(ObjectHandle(999)))
        .unwrap_err();
    assert_eq!(err, EngineError::ObjectNotFound(ObjectHandle(999)));
}
