//! Native function bridge.
//!
//! A [`NativeFunc`] wraps a host callable with a declared arity. Two calling conventions
//! are supported: [`NativeCallable::View`] returns the result value directly, while
//! [`NativeCallable::Compact`] writes it to an out slot and returns a status code, which
//! suits thin host bindings that report failure as an integer.
//!
//! Each native function has one inline userdata slot of [`USERDATA_CAPACITY`] bytes. It can
//! be set once and is read back with [`NativeFunc::get_userdata`] or, from inside the
//! callable, with [`userdata_of`].

use std::any::{TypeId, type_name};

use crate::{
    exception::{ExcType, RunResult},
    heap::{Heap, HeapData, HeapView},
    intern::StringId,
    plain::{PlainData, as_bytes, from_bytes},
    resource::ResourceTracker,
    value::Value,
};

/// Size of the inline userdata buffer.
pub const USERDATA_CAPACITY: usize = 32;

/// Arity marker for native functions that accept any number of arguments.
pub const VARIADIC: i32 = -1;

/// Host callable returning its result directly.
pub type NativeFn = fn(&mut dyn NativeHost, NativeCall<'_>) -> RunResult<Value>;

/// Host callable writing its result to `out` and returning `0` on success.
///
/// Any other status becomes a `SystemError`.
pub type CompactFn = fn(&mut dyn NativeHost, NativeCall<'_>, &mut Value) -> i32;

/// The two calling conventions.
#[derive(Debug, Clone, Copy)]
pub enum NativeCallable {
    View(NativeFn),
    Compact(CompactFn),
}

/// Arguments of one native call.
#[derive(Debug, Clone, Copy)]
pub struct NativeCall<'a> {
    /// The native function value being called.
    pub callee: Value,
    /// Arguments, receiver first for methods.
    pub args: &'a [Value],
}

/// What a native callable can do to the heap it runs against.
///
/// Object-safe, so callables are plain function pointers independent of the heap's tracker.
pub trait NativeHost: HeapView {
    /// Allocates `data` with the runtime type of its kind.
    fn alloc(&mut self, data: HeapData) -> RunResult<Value>;

    fn intern_str(&mut self, s: &str) -> StringId;

    fn store_attr(&mut self, obj: Value, name: StringId, value: Value) -> RunResult<()>;

    /// Calls another native function.
    fn call(&mut self, callee: Value, args: &[Value]) -> RunResult<Value>;
}

#[derive(Debug, Clone, Copy)]
struct Userdata {
    bytes: [u8; USERDATA_CAPACITY],
    tag: TypeId,
    type_name: &'static str,
}

/// A host callable exposed as a runtime function.
#[derive(Debug, Clone)]
pub struct NativeFunc {
    name: StringId,
    callable: NativeCallable,
    argc: i32,
    userdata: Option<Userdata>,
}

impl NativeFunc {
    /// Wraps `callable` expecting `argc` arguments, or any number with [`VARIADIC`].
    ///
    /// When `method` is true a fixed arity is raised by one to account for the receiver.
    ///
    /// # Panics
    /// Panics if `argc` is below [`VARIADIC`].
    #[must_use]
    pub fn new(name: StringId, callable: NativeCallable, argc: i32, method: bool) -> Self {
        assert!(argc >= VARIADIC, "NativeFunc: invalid arity {argc}");
        let argc = if method && argc != VARIADIC { argc + 1 } else { argc };
        Self {
            name,
            callable,
            argc,
            userdata: None,
        }
    }

    #[must_use]
    pub fn view(name: StringId, f: NativeFn, argc: i32) -> Self {
        Self::new(name, NativeCallable::View(f), argc, false)
    }

    #[must_use]
    pub fn compact(name: StringId, f: CompactFn, argc: i32) -> Self {
        Self::new(name, NativeCallable::Compact(f), argc, false)
    }

    #[must_use]
    pub fn name(&self) -> StringId {
        self.name
    }

    #[must_use]
    pub fn callable(&self) -> NativeCallable {
        self.callable
    }

    /// Declared arity, receiver included for methods; [`VARIADIC`] for any.
    #[must_use]
    pub fn argc(&self) -> i32 {
        self.argc
    }

    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.argc == VARIADIC
    }

    #[must_use]
    pub fn has_userdata(&self) -> bool {
        self.userdata.is_some()
    }

    /// Stores `value` in the userdata slot.
    ///
    /// Types larger than [`USERDATA_CAPACITY`] are rejected at compile time.
    ///
    /// # Errors
    /// Returns a `RuntimeError` if userdata was already set. Hosts should treat this as a
    /// defect in their binding code.
    pub fn set_userdata<U: PlainData>(&mut self, value: U) -> RunResult<()> {
        const {
            assert!(
                size_of::<U>() <= USERDATA_CAPACITY,
                "userdata type does not fit the inline buffer"
            );
        }
        if let Some(existing) = &self.userdata {
            return Err(ExcType::runtime_error(format_args!(
                "native function userdata already set (holds {})",
                existing.type_name
            )));
        }
        let mut bytes = [0u8; USERDATA_CAPACITY];
        bytes[..size_of::<U>()].copy_from_slice(as_bytes(&value));
        self.userdata = Some(Userdata {
            bytes,
            tag: TypeId::of::<U>(),
            type_name: type_name::<U>(),
        });
        Ok(())
    }

    /// Reads the userdata slot as a `U`.
    ///
    /// # Panics
    /// Debug builds panic if userdata was never set or was set with a different type.
    /// Release builds skip both checks: an unset slot reads as all zeros and a mismatched
    /// type reads the stored bytes reinterpreted as `U`. Both are memory-safe because
    /// `U: PlainData`, but the value is meaningless.
    #[must_use]
    pub fn get_userdata<U: PlainData>(&self) -> U {
        const {
            assert!(
                size_of::<U>() <= USERDATA_CAPACITY,
                "userdata type does not fit the inline buffer"
            );
        }
        debug_assert!(self.userdata.is_some(), "NativeFunc::get_userdata: userdata was never set");
        debug_assert!(
            self.userdata.is_none_or(|u| u.tag == TypeId::of::<U>()),
            "NativeFunc::get_userdata: userdata holds {}, read as {}",
            self.userdata.map_or("nothing", |u| u.type_name),
            type_name::<U>()
        );
        self.userdata.map_or_else(|| from_bytes(&[]), |u| from_bytes(&u.bytes))
    }
}

/// Reads the userdata of the native function being called.
///
/// # Panics
/// Panics if `call.callee` is not a native function, and in debug builds under the same
/// conditions as [`NativeFunc::get_userdata`].
#[must_use]
pub fn userdata_of<U: PlainData>(host: &dyn NativeHost, call: &NativeCall<'_>) -> U {
    let id = call.callee.as_heap().expect("userdata_of: callee is not a heap object");
    match host.object(id).data() {
        HeapData::NativeFunc(native) => native.get_userdata(),
        other => panic!("userdata_of: callee is a {}, not a native function", other.kind_name()),
    }
}

impl<T: ResourceTracker> Heap<T> {
    /// Calls the native function `callee` with `args`.
    ///
    /// The argument count is checked against the declared arity before the callable runs.
    pub fn call_native(&mut self, callee: Value, args: &[Value]) -> RunResult<Value> {
        let (name, callable, argc) = match callee.as_heap().map(|id| self.get(id)) {
            Some(HeapData::NativeFunc(native)) => (native.name(), native.callable(), native.argc()),
            _ => {
                return Err(ExcType::type_error_expected(
                    "native_function",
                    self.type_name(self.type_of(callee)),
                ));
            }
        };
        if let Ok(expected) = usize::try_from(argc)
            && expected != args.len()
        {
            return Err(ExcType::type_error_native_arity(
                self.interns().get_str(name),
                expected,
                args.len(),
            ));
        }
        let call = NativeCall { callee, args };
        match callable {
            NativeCallable::View(f) => f(self, call),
            NativeCallable::Compact(f) => {
                let mut out = Value::NONE;
                match f(self, call, &mut out) {
                    0 => Ok(out),
                    status => Err(ExcType::system_error_status(self.interns().get_str(name), status)),
                }
            }
        }
    }

    /// Sets the userdata of the native function `callee`.
    ///
    /// # Errors
    /// `TypeError` if `callee` is not a native function, `RuntimeError` if userdata was
    /// already set.
    pub fn set_native_userdata<U: PlainData>(&mut self, callee: Value, value: U) -> RunResult<()> {
        match callee.as_heap().map(|id| self.get_mut(id)) {
            Some(HeapData::NativeFunc(native)) => native.set_userdata(value),
            _ => Err(ExcType::type_error_expected(
                "native_function",
                self.type_name(self.type_of(callee)),
            )),
        }
    }
}

impl<T: ResourceTracker> NativeHost for Heap<T> {
    fn alloc(&mut self, data: HeapData) -> RunResult<Value> {
        self.allocate(data)
    }

    fn intern_str(&mut self, s: &str) -> StringId {
        self.intern(s)
    }

    fn store_attr(&mut self, obj: Value, name: StringId, value: Value) -> RunResult<()> {
        self.set_attr(obj, name, value)
    }

    fn call(&mut self, callee: Value, args: &[Value]) -> RunResult<Value> {
        self.call_native(callee, args)
    }
}
