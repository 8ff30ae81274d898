#![doc = include_str!("../../../README.md")]
#![expect(clippy::cast_possible_truncation, reason = "hashing and tag decoding narrow on purpose")]
#![expect(clippy::cast_sign_loss, reason = "tagged words reinterpret signed payloads")]
#![expect(clippy::cast_possible_wrap, reason = "int payloads are sign-extended from the word")]
// first so every payload module can name HeapId
mod heap;

mod args;
mod code;
mod exception;
pub mod extract;
mod function;
mod intern;
pub mod native;
mod namedict;
mod plain;
mod pool;
mod resource;
pub mod tracer;
pub mod types;
mod value;

pub use crate::{
    args::ArgValues,
    code::CodeObject,
    exception::{ExcType, RunError, RunResult, SimpleException},
    extract::{
        CheckPolicy, Checked, ConversionRegistry, Extract, HostClass, PointerHook, StructHook, Unchecked, extract,
        extract_unchecked,
    },
    function::{FuncDecl, FuncDeclBuilder, Function, KwArg, capture},
    heap::{GcHeader, Heap, HeapData, HeapId, HeapObject, HeapStats, HeapView},
    intern::{Interns, StaticStrings, StringId},
    namedict::{INITIAL_CAPACITY, NameDict},
    native::{
        CompactFn, NativeCall, NativeCallable, NativeFn, NativeFunc, NativeHost, USERDATA_CAPACITY, VARIADIC,
        userdata_of,
    },
    plain::PlainData,
    pool::DictPool,
    resource::{
        DEFAULT_GC_INTERVAL, HeapConfig, INSTANCE_ATTR_LOAD_FACTOR, LimitedTracker, NAMESPACE_ATTR_LOAD_FACTOR,
        NoLimitTracker, ResourceError, ResourceLimits, ResourceTracker,
    },
    tracer::{CollectStats, GcEvent, GcTracer, NoopTracer, RecordingTracer, StderrTracer},
    types::{BuiltinType, Type},
    value::{INT_MAX, INT_MIN, Immediate, Kind, Special, Value},
};
