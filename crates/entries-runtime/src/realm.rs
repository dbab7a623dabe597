//! The realm: object heap plus native-function table, and the
//! `Object.keys` / `Object.values` / `Object.entries` built-ins.
//!
//! Enumeration follows the ES2020 `EnumerableOwnPropertyNames` algorithm:
//! the own-key list is snapshotted BEFORE any getter runs, then values are
//! read lazily key by key. A getter that adds a property during iteration
//! cannot grow the result; a getter that deletes or un-enumerates a
//! not-yet-visited property excludes it. A getter error aborts the call and
//! propagates to the caller verbatim, with no partial result.

use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::object_model::{
    EngineError, JsValue, NativeFnId, ObjectHandle, ObjectHeap, PropertyDescriptor, PropertyKey,
};

/// A native function invoked with the realm and the `this` object.
///
/// Getters receive `&mut Realm` so they can mutate the heap mid-enumeration,
/// which is exactly what the mutation-isolation contract exercises.
pub type NativeFn = Rc<dyn Fn(&mut Realm, ObjectHandle) -> Result<JsValue, EngineError>>;

// ---------------------------------------------------------------------------
// BuiltinFn — identity metadata for built-ins
// ---------------------------------------------------------------------------

/// Identity metadata of a built-in function: its declared name and declared
/// parameter count (the `length` property of the JS function object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuiltinFn {
    pub name: &'static str,
    pub length: u32,
}

/// `Object.entries` — the function under test.
pub const OBJECT_ENTRIES: BuiltinFn = BuiltinFn {
    name: "entries",
    length: 1,
};

/// `Object.keys`.
pub const OBJECT_KEYS: BuiltinFn = BuiltinFn {
    name: "keys",
    length: 1,
};

/// `Object.values`.
pub const OBJECT_VALUES: BuiltinFn = BuiltinFn {
    name: "values",
    length: 1,
};

// ---------------------------------------------------------------------------
// Realm
// ---------------------------------------------------------------------------

/// Object heap plus the native-function table accessor descriptors index into.
#[derive(Default)]
pub struct Realm {
    pub heap: ObjectHeap,
    native_fns: Vec<NativeFn>,
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("heap", &self.heap)
            .field("native_fns", &self.native_fns.len())
            .finish()
    }
}

impl Realm {
    /// Create a new empty realm.
    pub fn new() -> Self {
        Self::default()
    }

    // -- Native functions ---------------------------------------------------

    /// Register a native function and return its id.
    pub fn register_native<F>(&mut self, f: F) -> NativeFnId
    where
        F: Fn(&mut Realm, ObjectHandle) -> Result<JsValue, EngineError> + 'static,
    {
        let id = NativeFnId(self.native_fns.len() as u32);
        self.native_fns.push(Rc::new(f));
        id
    }

    /// Invoke a registered native function with `this`.
    pub fn call_native(
        &mut self,
        id: NativeFnId,
        this: ObjectHandle,
    ) -> Result<JsValue, EngineError> {
        let f = self
            .native_fns
            .get(id.0 as usize)
            .cloned()
            .ok_or(EngineError::NativeFnNotFound(id))?;
        f(self, this)
    }

    /// Define an enumerable, configurable getter-only accessor property.
    pub fn define_getter<F>(
        &mut self,
        handle: ObjectHandle,
        key: impl Into<PropertyKey>,
        getter: F,
    ) -> Result<bool, EngineError>
    where
        F: Fn(&mut Realm, ObjectHandle) -> Result<JsValue, EngineError> + 'static,
    {
        let id = self.register_native(getter);
        self.heap
            .define_property(handle, key.into(), PropertyDescriptor::getter(id))
    }

    /// `[[Get]](O, P)` — walk the prototype chain and resolve the property,
    /// invoking the getter for accessor properties.
    pub fn get_property(
        &mut self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<JsValue, EngineError> {
        match self.heap.lookup(handle, key)? {
            Some((_, PropertyDescriptor::Data { value, .. })) => Ok(value),
            Some((_, PropertyDescriptor::Accessor { get: Some(g), .. })) => {
                self.call_native(g, handle)
            }
            Some((_, PropertyDescriptor::Accessor { get: None, .. })) => Ok(JsValue::Undefined),
            None => Ok(JsValue::Undefined),
        }
    }

    // -- ToObject (§7.1.18) -------------------------------------------------

    /// Coerce a value to an object, allocating a wrapper for primitives.
    ///
    /// `null` and `undefined` raise a `TypeError`. A string wrapper gets one
    /// own enumerable property per character at its ascending numeric index
    /// plus a non-enumerable `length`; boolean, number, and symbol wrappers
    /// have zero own enumerable properties.
    pub fn to_object(&mut self, value: &JsValue) -> Result<ObjectHandle, EngineError> {
        match value {
            JsValue::Object(h) => Ok(*h),
            JsValue::Null | JsValue::Undefined => Err(EngineError::TypeError(
                "Cannot convert undefined or null to object".to_string(),
            )),
            JsValue::Str(s) => {
                let h = self.heap.alloc_plain();
                let chars: Vec<char> = s.chars().collect();
                for (i, ch) in chars.iter().enumerate() {
                    self.heap.define_property(
                        h,
                        PropertyKey::String(i.to_string()),
                        PropertyDescriptor::Data {
                            value: JsValue::Str(ch.to_string()),
                            writable: false,
                            enumerable: true,
                            configurable: false,
                        },
                    )?;
                }
                self.heap.define_property(
                    h,
                    "length".into(),
                    PropertyDescriptor::Data {
                        value: JsValue::Num(chars.len() as f64),
                        writable: false,
                        enumerable: false,
                        configurable: false,
                    },
                )?;
                self.heap.get_mut(h)?.class_tag = Some("String".to_string());
                Ok(h)
            }
            JsValue::Bool(_) => self.alloc_empty_wrapper("Boolean"),
            JsValue::Num(_) => self.alloc_empty_wrapper("Number"),
            JsValue::Symbol(_) => self.alloc_empty_wrapper("Symbol"),
        }
    }

    fn alloc_empty_wrapper(&mut self, tag: &str) -> Result<ObjectHandle, EngineError> {
        let h = self.heap.alloc_plain();
        self.heap.get_mut(h)?.class_tag = Some(tag.to_string());
        Ok(h)
    }

    // -- Enumeration built-ins ---------------------------------------------

    /// `Object.keys(O)` — own enumerable string keys in ES order.
    ///
    /// Does not invoke getters: an accessor property contributes its key
    /// without running its `get`.
    pub fn keys(&mut self, value: &JsValue) -> Result<Vec<String>, EngineError> {
        let handle = self.to_object(value)?;
        let obj = self.heap.get(handle)?;
        let mut out = Vec::new();
        for key in obj.own_property_keys() {
            if let PropertyKey::String(s) = &key {
                if obj.get_own_property(&key).is_some_and(|d| d.is_enumerable()) {
                    out.push(s.clone());
                }
            }
        }
        Ok(out)
    }

    /// `Object.entries(O)` — own enumerable `[key, value]` pairs in ES order.
    pub fn entries(&mut self, value: &JsValue) -> Result<Vec<(String, JsValue)>, EngineError> {
        let handle = self.to_object(value)?;
        self.own_entries(handle)
    }

    /// `Object.values(O)` — own enumerable values in ES order.
    pub fn values(&mut self, value: &JsValue) -> Result<Vec<JsValue>, EngineError> {
        let handle = self.to_object(value)?;
        Ok(self.own_entries(handle)?.into_iter().map(|(_, v)| v).collect())
    }

    /// `EnumerableOwnPropertyNames(O, key+value)` (§7.3.23).
    ///
    /// The key list is fixed before the first getter runs. Each key's
    /// descriptor is re-read at its own turn, so a property deleted or made
    /// non-enumerable by an earlier getter is skipped; a property added by a
    /// getter is not in the snapshot and never appears.
    fn own_entries(&mut self, handle: ObjectHandle) -> Result<Vec<(String, JsValue)>, EngineError> {
        let snapshot = self.heap.own_property_keys(handle)?;
        let mut out = Vec::new();
        for key in snapshot {
            let name = match &key {
                PropertyKey::String(s) => s.clone(),
                PropertyKey::Symbol(_) => continue,
            };
            let desc = match self.heap.get(handle)?.get_own_property(&key) {
                Some(d) => d.clone(),
                // Removed by an earlier getter.
                None => continue,
            };
            if !desc.is_enumerable() {
                continue;
            }
            let value = match desc {
                PropertyDescriptor::Data { value, .. } => value,
                PropertyDescriptor::Accessor { get: Some(g), .. } => self.call_native(g, handle)?,
                PropertyDescriptor::Accessor { get: None, .. } => JsValue::Undefined,
            };
            out.push((name, value));
        }
        Ok(out)
    }
}
