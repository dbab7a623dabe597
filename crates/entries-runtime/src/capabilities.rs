//! Runtime capability flags for the conformance suite.
//!
//! Each flag is computed once before any test runs and is read-only
//! afterwards; a test that depends on a missing capability skips instead
//! of failing, so the suite stays valid across heterogeneous runtimes.

use serde::Serialize;

use crate::object_model::{JsValue, PropertyDescriptor};
use crate::realm::{Realm, OBJECT_ENTRIES};

/// Process-wide capability flags, probed once at suite load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// Property-descriptor configuration works: a property defined
    /// non-enumerable is hidden from key enumeration but still readable.
    pub supports_descriptors: bool,
    /// Built-ins expose a discoverable name.
    pub functions_have_names: bool,
    /// A unique-symbol primitive type exists.
    pub has_symbols: bool,
    /// Key enumeration accepts non-object primitives without raising.
    pub keys_accepts_primitives: bool,
}

impl Capabilities {
    /// Probe the realm for every capability.
    pub fn probe(realm: &mut Realm) -> Self {
        Self {
            supports_descriptors: probe_descriptors(realm),
            functions_have_names: !OBJECT_ENTRIES.name.is_empty(),
            has_symbols: probe_symbols(realm),
            keys_accepts_primitives: realm.keys(&JsValue::Num(2.0)).is_ok(),
        }
    }

    /// Do all probed capabilities hold?
    pub fn all(&self) -> bool {
        self.supports_descriptors
            && self.functions_have_names
            && self.has_symbols
            && self.keys_accepts_primitives
    }
}

fn probe_descriptors(realm: &mut Realm) -> bool {
    let h = realm.heap.alloc_plain();
    let defined = realm.heap.define_property(
        h,
        "x".into(),
        PropertyDescriptor::Data {
            value: JsValue::Object(h),
            writable: true,
            enumerable: false,
            configurable: true,
        },
    );
    if !matches!(defined, Ok(true)) {
        return false;
    }
    let hidden = matches!(realm.keys(&JsValue::Object(h)), Ok(keys) if keys.is_empty());
    let readable = realm.get_property(h, &"x".into()) == Ok(JsValue::Object(h));
    hidden && readable
}

fn probe_symbols(realm: &mut Realm) -> bool {
    let a = realm.heap.alloc_symbol(None);
    let b = realm.heap.alloc_symbol(None);
    a != b && JsValue::Symbol(a).type_name() == "symbol"
}
