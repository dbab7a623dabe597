//! ECMAScript-style object model: property descriptors, prototype chains,
//! and ordered own-key enumeration.
//!
//! Key features:
//!
//! - **Property descriptors**: data vs accessor, configurable/enumerable/writable
//! - **Prototype chains**: `[[Prototype]]` internal slot with chain traversal
//! - **Own-key ordering**: integer-like string keys ascending numerically,
//!   then remaining string keys in insertion order, then symbol keys
//! - **Symbol keys**: property keys that are either strings or symbols
//!
//! Accessor descriptors reference native functions by [`NativeFnId`]; the
//! function table lives in [`crate::realm::Realm`] so the heap itself stays
//! serializable.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PropertyKey — string or symbol
// ---------------------------------------------------------------------------

/// Unique symbol identifier, allocated by the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A property key: either a string or a symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropertyKey {
    /// String key.
    String(String),
    /// Symbol key.
    Symbol(SymbolId),
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::Symbol(id) => write!(f, "Symbol({id})"),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<SymbolId> for PropertyKey {
    fn from(id: SymbolId) -> Self {
        Self::Symbol(id)
    }
}

// ---------------------------------------------------------------------------
// ObjectHandle / NativeFnId — typed references
// ---------------------------------------------------------------------------

/// Opaque handle referencing an object on the managed heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(pub u32);

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into the realm's native-function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NativeFnId(pub u32);

impl fmt::Display for NativeFnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// JsValue — runtime value
// ---------------------------------------------------------------------------

/// Runtime value for the object model.
///
/// Numbers are IEEE `f64` so `-0`, `Infinity`, and `NaN` are expressible;
/// use [`JsValue::same_value`] for SameValue comparison rather than `==`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JsValue {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Symbol(SymbolId),
    Object(ObjectHandle),
}

impl JsValue {
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Is this a primitive (anything but an object)?
    pub fn is_primitive(&self) -> bool {
        !self.is_object()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Num(_) => "number",
            Self::Str(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Object(_) => "object",
        }
    }

    /// SameValue comparison (ES2020 §7.2.10): `NaN` is SameValue to itself,
    /// `+0` and `-0` are distinct.
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Num(a), Self::Num(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Symbol(id) => write!(f, "Symbol({id})"),
            Self::Object(h) => write!(f, "[object#{h}]"),
        }
    }
}

// ---------------------------------------------------------------------------
// PropertyDescriptor
// ---------------------------------------------------------------------------

/// ES2020 property descriptor (§6.2.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyDescriptor {
    /// Data descriptor: has `value` and `writable`.
    Data {
        value: JsValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    /// Accessor descriptor: has `get` and/or `set` native functions.
    Accessor {
        get: Option<NativeFnId>,
        set: Option<NativeFnId>,
        enumerable: bool,
        configurable: bool,
    },
}

impl PropertyDescriptor {
    /// Create a default data descriptor (writable, enumerable, configurable).
    pub fn data(value: JsValue) -> Self {
        Self::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Create an enumerable, configurable getter-only accessor descriptor.
    pub fn getter(get: NativeFnId) -> Self {
        Self::Accessor {
            get: Some(get),
            set: None,
            enumerable: true,
            configurable: true,
        }
    }

    /// Is this descriptor configurable?
    pub fn is_configurable(&self) -> bool {
        match self {
            Self::Data { configurable, .. } | Self::Accessor { configurable, .. } => *configurable,
        }
    }

    /// Is this descriptor enumerable?
    pub fn is_enumerable(&self) -> bool {
        match self {
            Self::Data { enumerable, .. } | Self::Accessor { enumerable, .. } => *enumerable,
        }
    }

    /// Is this a data descriptor?
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    /// Is this an accessor descriptor?
    pub fn is_accessor(&self) -> bool {
        matches!(self, Self::Accessor { .. })
    }

    /// Get the value if this is a data descriptor.
    pub fn value(&self) -> Option<&JsValue> {
        match self {
            Self::Data { value, .. } => Some(value),
            Self::Accessor { .. } => None,
        }
    }

    /// Is this a data descriptor with writable=true?
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Data { writable, .. } => *writable,
            Self::Accessor { .. } => false,
        }
    }

    /// Make this descriptor non-enumerable.
    pub fn set_non_enumerable(&mut self) {
        match self {
            Self::Data { enumerable, .. } | Self::Accessor { enumerable, .. } => {
                *enumerable = false;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// Errors from object model and realm operations.
///
/// Only two of these are part of the enumeration contract: `TypeError`
/// (null/undefined coercion) and `Thrown` (an error raised by a native
/// accessor, surfaced to the caller verbatim). The rest are heap-integrity
/// failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum EngineError {
    /// TypeError per ES2020 spec.
    #[error("TypeError: {0}")]
    TypeError(String),
    /// Error raised inside a native accessor during property access.
    /// Propagated to the caller with the original message, never wrapped.
    #[error("{message}")]
    Thrown { message: String },
    /// Object not found in the heap.
    #[error("object#{0} not found")]
    ObjectNotFound(ObjectHandle),
    /// Accessor references a native function that was never registered.
    #[error("native function #{0} not registered")]
    NativeFnNotFound(NativeFnId),
    /// Prototype chain cycle detected.
    #[error("TypeError: prototype chain cycle detected")]
    PrototypeCycleDetected,
    /// Maximum prototype chain depth exceeded.
    #[error("TypeError: prototype chain depth {depth} exceeds max {max}")]
    PrototypeChainTooDeep { depth: u32, max: u32 },
}

impl EngineError {
    /// Construct the error a native accessor throws.
    pub fn thrown(message: impl Into<String>) -> Self {
        Self::Thrown {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// OrdinaryObject — the core object
// ---------------------------------------------------------------------------

/// Maximum prototype chain depth to prevent infinite loops.
const MAX_PROTOTYPE_CHAIN_DEPTH: u32 = 1024;

/// An ordinary object with internal slots.
///
/// Own properties are stored in insertion order; [`Self::own_property_keys`]
/// applies the ES2020 ordering on top (integer-like indices first). A
/// property that is deleted and later re-defined moves to the end, as in ES.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdinaryObject {
    /// `[[Prototype]]` internal slot (null means end of chain).
    pub prototype: Option<ObjectHandle>,
    /// `[[Extensible]]` internal slot.
    pub extensible: bool,
    /// Own properties with descriptors, in insertion order.
    properties: Vec<(PropertyKey, PropertyDescriptor)>,
    /// `[[Class]]` tag for intrinsic identification (e.g. wrapper objects).
    pub class_tag: Option<String>,
}

impl Default for OrdinaryObject {
    fn default() -> Self {
        Self {
            prototype: None,
            extensible: true,
            properties: Vec::new(),
            class_tag: None,
        }
    }
}

impl OrdinaryObject {
    /// Create a new ordinary object with the given prototype.
    pub fn with_prototype(proto: Option<ObjectHandle>) -> Self {
        Self {
            prototype: proto,
            ..Self::default()
        }
    }

    /// Number of own properties.
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    fn position(&self, key: &PropertyKey) -> Option<usize> {
        self.properties.iter().position(|(k, _)| k == key)
    }

    // -- [[GetOwnProperty]] (§9.1.1) ---------------------------------------

    /// `[[GetOwnProperty]](P)` — return the own property descriptor for `key`.
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.position(key).map(|i| &self.properties[i].1)
    }

    /// `[[HasOwnProperty]](P)` — does this object have an own property `key`?
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.position(key).is_some()
    }

    // -- [[DefineOwnProperty]] (§9.1.6) ------------------------------------

    /// `[[DefineOwnProperty]](P, Desc)` — define or update a property.
    ///
    /// Updating an existing property keeps its insertion position. Returns
    /// `Ok(true)` if the property was defined, `Ok(false)` if rejected
    /// (non-configurable conflict or non-extensible object).
    pub fn define_own_property(
        &mut self,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<bool, EngineError> {
        if let Some(i) = self.position(&key) {
            let current = &self.properties[i].1;
            if !current.is_configurable() {
                // Non-configurable: reject any change that would alter
                // configurability, enumerability, or descriptor type.
                if desc.is_configurable() {
                    return Ok(false);
                }
                if desc.is_enumerable() != current.is_enumerable() {
                    return Ok(false);
                }
                if current.is_data() != desc.is_data() {
                    return Ok(false);
                }
                if let (
                    PropertyDescriptor::Data {
                        writable: current_w,
                        value: current_v,
                        ..
                    },
                    PropertyDescriptor::Data {
                        writable: new_w,
                        value: new_v,
                        ..
                    },
                ) = (current, &desc)
                {
                    if !current_w {
                        // Non-writable non-configurable: cannot become
                        // writable or change value.
                        if *new_w {
                            return Ok(false);
                        }
                        if !current_v.same_value(new_v) {
                            return Ok(false);
                        }
                    }
                }
                if let (
                    PropertyDescriptor::Accessor {
                        get: cur_get,
                        set: cur_set,
                        ..
                    },
                    PropertyDescriptor::Accessor {
                        get: new_get,
                        set: new_set,
                        ..
                    },
                ) = (current, &desc)
                {
                    if cur_get != new_get || cur_set != new_set {
                        return Ok(false);
                    }
                }
            }
            self.properties[i].1 = desc;
            Ok(true)
        } else {
            if !self.extensible {
                return Ok(false);
            }
            self.properties.push((key, desc));
            Ok(true)
        }
    }

    // -- [[Delete]] (§9.1.10) -----------------------------------------------

    /// `[[Delete]](P)` — delete a property. Returns `false` if non-configurable.
    pub fn delete(&mut self, key: &PropertyKey) -> bool {
        match self.position(key) {
            Some(i) => {
                if !self.properties[i].1.is_configurable() {
                    return false;
                }
                self.properties.remove(i);
                true
            }
            // Property doesn't exist — vacuously true.
            None => true,
        }
    }

    // -- [[OwnPropertyKeys]] (§9.1.11) -------------------------------------

    /// `[[OwnPropertyKeys]]()` — own keys in ES2020 order: integer-like
    /// indices sorted numerically, then string keys in insertion order,
    /// then symbol keys in insertion order.
    pub fn own_property_keys(&self) -> Vec<PropertyKey> {
        let mut int_keys: Vec<(u64, PropertyKey)> = Vec::new();
        let mut str_keys: Vec<PropertyKey> = Vec::new();
        let mut sym_keys: Vec<PropertyKey> = Vec::new();

        for (key, _) in &self.properties {
            match key {
                PropertyKey::String(s) => {
                    if let Some(n) = integer_index(s) {
                        int_keys.push((n, key.clone()));
                    } else {
                        str_keys.push(key.clone());
                    }
                }
                PropertyKey::Symbol(_) => {
                    sym_keys.push(key.clone());
                }
            }
        }

        int_keys.sort_by_key(|(n, _)| *n);
        let mut result: Vec<PropertyKey> = int_keys.into_iter().map(|(_, k)| k).collect();
        result.extend(str_keys);
        result.extend(sym_keys);
        result
    }
}

/// Canonical integer index per ES: the decimal representation must round-trip
/// (`"00"`, `"-1"`, and `""` are plain string keys).
fn integer_index(s: &str) -> Option<u64> {
    let n: u64 = s.parse().ok()?;
    if n.to_string() == s {
        Some(n)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// ObjectHeap — the managed object store
// ---------------------------------------------------------------------------

/// The object heap: arena of ordinary objects plus the symbol allocator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectHeap {
    objects: Vec<OrdinaryObject>,
    /// Symbol descriptions, indexed by `SymbolId`.
    symbols: Vec<Option<String>>,
}

impl ObjectHeap {
    /// Create a new empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new ordinary object with the given prototype.
    pub fn alloc(&mut self, proto: Option<ObjectHandle>) -> ObjectHandle {
        let handle = ObjectHandle(self.objects.len() as u32);
        self.objects.push(OrdinaryObject::with_prototype(proto));
        handle
    }

    /// Allocate a new ordinary object with no prototype.
    pub fn alloc_plain(&mut self) -> ObjectHandle {
        self.alloc(None)
    }

    /// Allocate a new unique symbol with an optional description.
    pub fn alloc_symbol(&mut self, description: Option<&str>) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(description.map(str::to_string));
        id
    }

    /// Description of a previously allocated symbol.
    pub fn symbol_description(&self, id: SymbolId) -> Option<&str> {
        self.symbols.get(id.0 as usize)?.as_deref()
    }

    /// Get a reference to an object.
    pub fn get(&self, handle: ObjectHandle) -> Result<&OrdinaryObject, EngineError> {
        self.objects
            .get(handle.0 as usize)
            .ok_or(EngineError::ObjectNotFound(handle))
    }

    /// Get a mutable reference to an object.
    pub fn get_mut(&mut self, handle: ObjectHandle) -> Result<&mut OrdinaryObject, EngineError> {
        self.objects
            .get_mut(handle.0 as usize)
            .ok_or(EngineError::ObjectNotFound(handle))
    }

    /// Number of objects allocated.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Is the heap empty?
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // -- High-level operations requiring heap access ------------------------

    /// Walk the prototype chain looking for `key`. Returns the holder and
    /// the descriptor of the first match, or `None` at the end of the chain.
    pub fn lookup(
        &self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<Option<(ObjectHandle, PropertyDescriptor)>, EngineError> {
        let mut current = Some(handle);
        let mut depth: u32 = 0;
        let mut visited = BTreeSet::new();

        while let Some(h) = current {
            if depth > MAX_PROTOTYPE_CHAIN_DEPTH {
                return Err(EngineError::PrototypeChainTooDeep {
                    depth,
                    max: MAX_PROTOTYPE_CHAIN_DEPTH,
                });
            }
            if !visited.insert(h) {
                return Err(EngineError::PrototypeCycleDetected);
            }

            let obj = self.get(h)?;
            if let Some(desc) = obj.get_own_property(key) {
                return Ok(Some((h, desc.clone())));
            }
            current = obj.prototype;
            depth += 1;
        }
        Ok(None)
    }

    /// `[[Set]](O, P, V)` — create or update an own data property.
    pub fn set_property(
        &mut self,
        handle: ObjectHandle,
        key: PropertyKey,
        value: JsValue,
    ) -> Result<bool, EngineError> {
        let obj = self.get_mut(handle)?;
        match obj.position(&key) {
            Some(i) => match &mut obj.properties[i].1 {
                PropertyDescriptor::Data {
                    value: v, writable, ..
                } => {
                    if !*writable {
                        return Ok(false);
                    }
                    *v = value;
                    Ok(true)
                }
                // Accessor set is dispatched through the realm.
                PropertyDescriptor::Accessor { .. } => Ok(false),
            },
            None => {
                if !obj.extensible {
                    return Ok(false);
                }
                obj.properties.push((key, PropertyDescriptor::data(value)));
                Ok(true)
            }
        }
    }

    /// `[[HasProperty]](O, P)` — check if property exists (walks prototype chain).
    pub fn has_property(
        &self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<bool, EngineError> {
        Ok(self.lookup(handle, key)?.is_some())
    }

    /// Does the object have an own property `key`?
    pub fn has_own_property(
        &self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<bool, EngineError> {
        Ok(self.get(handle)?.has_own_property(key))
    }

    /// `[[Delete]](O, P)` — delete a property.
    pub fn delete_property(
        &mut self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<bool, EngineError> {
        Ok(self.get_mut(handle)?.delete(key))
    }

    /// `Object.getPrototypeOf(O)`.
    pub fn get_prototype_of(
        &self,
        handle: ObjectHandle,
    ) -> Result<Option<ObjectHandle>, EngineError> {
        Ok(self.get(handle)?.prototype)
    }

    /// `Object.setPrototypeOf(O, proto)` — cycle-checked.
    pub fn set_prototype_of(
        &mut self,
        handle: ObjectHandle,
        proto: Option<ObjectHandle>,
    ) -> Result<bool, EngineError> {
        if let Some(p) = proto {
            let mut current = Some(p);
            let mut visited = BTreeSet::new();
            visited.insert(handle);
            while let Some(h) = current {
                if !visited.insert(h) {
                    return Err(EngineError::PrototypeCycleDetected);
                }
                current = self.get(h)?.prototype;
            }
        }

        let obj = self.get_mut(handle)?;
        if !obj.extensible {
            // Non-extensible: can only set prototype to current value.
            return Ok(obj.prototype == proto);
        }
        obj.prototype = proto;
        Ok(true)
    }

    /// `Object.defineProperty(O, P, Desc)`.
    pub fn define_property(
        &mut self,
        handle: ObjectHandle,
        key: PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<bool, EngineError> {
        self.get_mut(handle)?.define_own_property(key, desc)
    }

    /// `Object.getOwnPropertyDescriptor(O, P)`.
    pub fn get_own_property_descriptor(
        &self,
        handle: ObjectHandle,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, EngineError> {
        Ok(self.get(handle)?.get_own_property(key).cloned())
    }

    /// `[[OwnPropertyKeys]]` for a heap object.
    pub fn own_property_keys(&self, handle: ObjectHandle) -> Result<Vec<PropertyKey>, EngineError> {
        Ok(self.get(handle)?.own_property_keys())
    }
}
