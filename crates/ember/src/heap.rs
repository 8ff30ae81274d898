use std::collections::BTreeMap;

use strum::{IntoStaticStr, VariantArray};

use crate::{
    exception::{ExcType, RunError, RunResult},
    extract::ConversionRegistry,
    function::Function,
    intern::{Interns, StringId},
    namedict::NameDict,
    native::NativeFunc,
    plain::PlainData,
    pool::DictPool,
    resource::{HeapConfig, ResourceTracker},
    tracer::{CollectStats, GcTracer, NoopTracer},
    types::{
        BoundMethod, BuiltinType, Bytes, Dict, List, MappingProxy, Module, OpaquePtr, Packed, Property, Range, Slice,
        StarWrapper, Str, Super, Tuple, Type, TypeObject,
    },
    value::Value,
};

/// Snapshot of heap state at a point in time.
///
/// The `objects_by_kind` map uses `BTreeMap` for deterministic iteration order,
/// making snapshots suitable for display and comparison without sort overhead.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HeapStats {
    /// Total number of live objects on the heap, permanent type objects included.
    pub live_objects: usize,
    /// Number of free (recycled) slots available for reuse.
    pub free_slots: usize,
    /// Total heap capacity (live + free).
    pub total_slots: usize,
    /// Breakdown of live objects by `HeapData` variant name.
    pub objects_by_kind: BTreeMap<&'static str, usize>,
    /// Attribute dicts waiting in the pool.
    pub pooled_dicts: usize,
    /// Resource tracker allocation count, if using `LimitedTracker`.
    pub tracker_allocations: Option<usize>,
    /// Resource tracker memory usage in bytes, if using `LimitedTracker`.
    pub tracker_memory_bytes: Option<usize>,
}

/// Unique identifier for values stored inside the heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct HeapId(usize);

impl HeapId {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Pushes `value` onto a trace work list if it is a heap reference.
#[inline]
pub(crate) fn push_ref(work_list: &mut Vec<HeapId>, value: Value) {
    if let Some(id) = value.as_heap() {
        work_list.push(id);
    }
}

/// Collector bits of an object header.
///
/// `marked` is the visited-set membership test of the current cycle. Objects with
/// `enabled == false` are permanent: the sweep never frees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcHeader {
    enabled: bool,
    marked: bool,
}

impl GcHeader {
    fn collectable() -> Self {
        Self {
            enabled: true,
            marked: false,
        }
    }

    fn permanent() -> Self {
        Self {
            enabled: false,
            marked: false,
        }
    }

    #[must_use]
    pub fn is_enabled(self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn is_marked(self) -> bool {
        self.marked
    }
}

/// Which load factor an object's attribute dict is tuned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrProfile {
    Instance,
    Namespace,
}

/// Payload of a heap object. One variant per value kind.
#[derive(Debug, IntoStaticStr)]
pub enum HeapData {
    List(List),
    Tuple(Tuple),
    Dict(Dict),
    Str(Str),
    Bytes(Bytes),
    Range(Range),
    Slice(Slice),
    MappingProxy(MappingProxy),
    BoundMethod(BoundMethod),
    StarWrapper(StarWrapper),
    Property(Property),
    Function(Function),
    NativeFunc(NativeFunc),
    Super(Super),
    Type(TypeObject),
    /// A plain instance: all of its state lives in the attribute dict.
    Instance,
    Module(Module),
    Packed(Packed),
    Pointer(OpaquePtr),
}

impl HeapData {
    /// Static variant name, e.g. `"List"`.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        self.into()
    }

    /// Runtime type an object of this kind gets unless the caller names one.
    fn default_type(&self) -> Type {
        match self {
            Self::List(_) => Type::LIST,
            Self::Tuple(_) => Type::TUPLE,
            Self::Dict(_) => Type::DICT,
            Self::Str(_) => Type::STR,
            Self::Bytes(_) => Type::BYTES,
            Self::Range(_) => Type::RANGE,
            Self::Slice(_) => Type::SLICE,
            Self::MappingProxy(_) => Type::MAPPING_PROXY,
            Self::BoundMethod(_) => Type::BOUND_METHOD,
            Self::StarWrapper(_) => Type::STAR_WRAPPER,
            Self::Property(_) => Type::PROPERTY,
            Self::Function(_) => Type::FUNCTION,
            Self::NativeFunc(_) => Type::NATIVE_FUNC,
            Self::Super(_) => Type::SUPER,
            Self::Type(_) => Type::TYPE,
            Self::Instance => Type::OBJECT,
            Self::Module(_) => Type::MODULE,
            Self::Packed(_) => Type::STRUCT,
            Self::Pointer(_) => Type::POINTER,
        }
    }

    /// Kinds that own an attribute dict from construction.
    fn attr_profile(&self) -> Option<AttrProfile> {
        match self {
            Self::Function(_) | Self::NativeFunc(_) | Self::Instance => Some(AttrProfile::Instance),
            Self::Type(_) | Self::Module(_) => Some(AttrProfile::Namespace),
            _ => None,
        }
    }

    /// Kinds that get an attribute dict on first attribute write.
    fn has_lazy_attrs(&self) -> bool {
        matches!(self, Self::Packed(_))
    }

    /// Pushes every heap reference held by the payload.
    ///
    /// Attribute dicts are traced separately by the header.
    fn collect_child_ids(&self, work_list: &mut Vec<HeapId>) {
        match self {
            // Leaf kinds: no references, or only permanent metadata
            Self::Str(_)
            | Self::Bytes(_)
            | Self::Range(_)
            | Self::NativeFunc(_)
            | Self::Type(_)
            | Self::Instance
            | Self::Module(_)
            | Self::Packed(_)
            | Self::Pointer(_) => {}
            Self::List(list) => list.collect_refs(work_list),
            Self::Tuple(tuple) => tuple.collect_refs(work_list),
            Self::Dict(dict) => dict.collect_refs(work_list),
            Self::Slice(slice) => slice.collect_refs(work_list),
            Self::MappingProxy(proxy) => proxy.collect_refs(work_list),
            Self::BoundMethod(method) => method.collect_refs(work_list),
            Self::StarWrapper(star) => star.collect_refs(work_list),
            Self::Property(property) => property.collect_refs(work_list),
            Self::Function(function) => function.collect_refs(work_list),
            Self::Super(sup) => sup.collect_refs(work_list),
        }
    }

    fn estimate_size(&self) -> usize {
        match self {
            Self::List(list) => list.estimate_size(),
            Self::Tuple(tuple) => tuple.estimate_size(),
            Self::Dict(dict) => dict.estimate_size(),
            Self::Str(s) => s.as_str().len(),
            Self::Bytes(b) => b.as_slice().len(),
            Self::Packed(p) => p.bytes().len(),
            _ => 0,
        }
    }
}

/// A heap object: collector bits, runtime type, optional attribute dict, payload.
#[derive(Debug)]
pub struct HeapObject {
    gc: GcHeader,
    ty: Type,
    attrs: Option<NameDict>,
    data: HeapData,
    /// Bytes reported to the tracker at allocation; the same amount is returned on free.
    charged: usize,
}

impl HeapObject {
    #[must_use]
    pub fn gc(&self) -> GcHeader {
        self.gc
    }

    #[must_use]
    pub fn ty(&self) -> Type {
        self.ty
    }

    #[must_use]
    pub fn attrs(&self) -> Option<&NameDict> {
        self.attrs.as_ref()
    }

    /// Whether an attribute dict has been enabled for this object.
    #[must_use]
    pub fn has_attrs(&self) -> bool {
        self.attrs.is_some()
    }

    #[must_use]
    pub fn data(&self) -> &HeapData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut HeapData {
        &mut self.data
    }

    /// Draws this object's attribute dict from the pool.
    ///
    /// # Panics
    /// Panics if the dict is already enabled; each object gets exactly one.
    fn enable_instance_dict(&mut self, pool: &mut DictPool, load_factor: f32) {
        assert!(
            self.attrs.is_none(),
            "HeapObject::enable_instance_dict: attribute dict already enabled"
        );
        self.attrs = Some(pool.allocate(load_factor));
    }

    /// Payload children first, then every value of the attribute dict.
    fn trace(&self, work_list: &mut Vec<HeapId>) {
        self.data.collect_child_ids(work_list);
        if let Some(attrs) = &self.attrs {
            attrs.collect_refs(work_list);
        }
    }

    fn estimate_size(&self) -> usize {
        size_of::<Self>()
            + self.data.estimate_size()
            + self.attrs.as_ref().map_or(0, |a| a.capacity() * size_of::<(StringId, Value)>())
    }

    /// Destroys the object, returning its attribute dict to the pool.
    fn release(self, pool: &mut DictPool) {
        if let Some(attrs) = self.attrs {
            pool.deallocate(attrs);
        }
    }
}

/// Read access to a heap, independent of its resource tracker.
///
/// Object-safe so that native functions can receive `&mut dyn NativeHost`.
pub trait HeapView {
    /// Returns the live object stored at `id`.
    ///
    /// # Panics
    /// Panics if the slot is missing or has been freed.
    fn object(&self, id: HeapId) -> &HeapObject;

    fn interns(&self) -> &Interns;

    fn registry(&self) -> &ConversionRegistry;

    /// Name of a runtime type, for messages.
    fn type_name(&self, ty: Type) -> &str;

    /// Runtime type of any value.
    fn type_of(&self, value: Value) -> Type {
        match value.as_heap() {
            Some(id) => self.object(id).ty(),
            None => value.immediate_type().unwrap_or(Type::OBJECT),
        }
    }

    /// Reads an attribute from an object's attribute dict.
    fn get_attr(&self, obj: Value, name: StringId) -> Option<Value> {
        let id = obj.as_heap()?;
        self.object(id).attrs()?.get(name)
    }
}

/// Registered runtime type: its name and the permanent type object describing it.
#[derive(Debug, Clone, Copy)]
struct TypeEntry {
    name: StringId,
    object: HeapId,
}

/// Arena of every heap object, plus the services objects depend on.
///
/// Freed slots go on a free list and are reused by later allocations, so a `HeapId` stays
/// valid exactly as long as its object is alive. Generic over `T: ResourceTracker`; with
/// `NoLimitTracker` all resource checks compile away.
#[derive(Debug)]
pub struct Heap<T: ResourceTracker> {
    entries: Vec<Option<HeapObject>>,
    free_list: Vec<HeapId>,
    tracker: T,
    config: HeapConfig,
    pool: DictPool,
    interns: Interns,
    types: Vec<TypeEntry>,
    registry: ConversionRegistry,
    allocations_since_gc: usize,
}

/// Resolves `id` to its object inside a borrowed arena.
fn entry_mut<'a>(entries: &'a mut [Option<HeapObject>], id: HeapId, caller: &str) -> &'a mut HeapObject {
    entries
        .get_mut(id.index())
        .unwrap_or_else(|| panic!("Heap::{caller}: slot missing"))
        .as_mut()
        .unwrap_or_else(|| panic!("Heap::{caller}: object already freed"))
}

impl<T: ResourceTracker> Heap<T> {
    /// Creates a heap with the builtin type objects already in place.
    #[must_use]
    pub fn new(config: HeapConfig, tracker: T) -> Self {
        let mut heap = Self {
            entries: Vec::with_capacity(config.initial_capacity),
            free_list: Vec::new(),
            tracker,
            pool: DictPool::new(config.dict_pool_capacity),
            config,
            interns: Interns::new(),
            types: Vec::with_capacity(usize::from(Type::FIRST_USER) * 2),
            registry: ConversionRegistry::new(),
            allocations_since_gc: 0,
        };
        for builtin in BuiltinType::VARIANTS {
            let name = heap.interns.intern(builtin.into());
            let ty = Type::from(*builtin);
            let base = (ty != Type::OBJECT).then_some(Type::OBJECT);
            let object = heap.type_object(name, ty, base);
            let id = heap.insert(object);
            heap.types.push(TypeEntry { name, object: id });
        }
        heap
    }

    /// Creates a heap with the default [`HeapConfig`].
    #[must_use]
    pub fn with_tracker(tracker: T) -> Self {
        Self::new(HeapConfig::default(), tracker)
    }

    #[must_use]
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    #[must_use]
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    pub fn intern(&mut self, s: &str) -> StringId {
        self.interns.intern(s)
    }

    pub fn registry_mut(&mut self) -> &mut ConversionRegistry {
        &mut self.registry
    }

    fn insert(&mut self, object: HeapObject) -> HeapId {
        if let Some(id) = self.free_list.pop() {
            self.entries[id.index()] = Some(object);
            id
        } else {
            self.entries.push(Some(object));
            HeapId(self.entries.len() - 1)
        }
    }

    fn type_object(&mut self, name: StringId, defines: Type, base: Option<Type>) -> HeapObject {
        let mut object = HeapObject {
            gc: GcHeader::permanent(),
            ty: Type::TYPE,
            attrs: None,
            data: HeapData::Type(TypeObject::new(name, defines, base)),
            charged: 0,
        };
        object.enable_instance_dict(&mut self.pool, self.config.namespace_load_factor);
        object
    }

    /// Allocates an object of runtime type `ty`, enabling its attribute dict when the kind
    /// always has one.
    pub(crate) fn allocate_typed(&mut self, ty: Type, data: HeapData) -> RunResult<Value> {
        let mut object = HeapObject {
            gc: GcHeader::collectable(),
            ty,
            attrs: None,
            data,
            charged: 0,
        };
        match object.data.attr_profile() {
            Some(AttrProfile::Instance) => {
                object.enable_instance_dict(&mut self.pool, self.config.instance_load_factor);
            }
            Some(AttrProfile::Namespace) => {
                object.enable_instance_dict(&mut self.pool, self.config.namespace_load_factor);
            }
            None => {}
        }
        object.charged = object.estimate_size();
        if let Err(err) = self.tracker.on_allocate(|| object.charged) {
            object.release(&mut self.pool);
            return Err(err.into());
        }
        self.allocations_since_gc += 1;
        Ok(Value::from_id(self.insert(object)))
    }

    /// Allocates `data` with the runtime type of its kind.
    ///
    /// Type objects must be created with [`Heap::new_type`], which also registers the id.
    pub fn allocate(&mut self, data: HeapData) -> RunResult<Value> {
        if matches!(data, HeapData::Type(_)) {
            return Err(RunError::internal("type objects must be created with Heap::new_type"));
        }
        let ty = data.default_type();
        self.allocate_typed(ty, data)
    }

    // ========================================================================
    // Construction entry points
    // ========================================================================

    pub fn new_list(&mut self, items: Vec<Value>) -> RunResult<Value> {
        self.allocate(HeapData::List(List::new(items)))
    }

    pub fn new_tuple(&mut self, items: Vec<Value>) -> RunResult<Value> {
        self.allocate(HeapData::Tuple(Tuple::new(items)))
    }

    pub fn new_dict(&mut self, dict: Dict) -> RunResult<Value> {
        self.allocate(HeapData::Dict(dict))
    }

    pub fn new_str(&mut self, s: &str) -> RunResult<Value> {
        self.allocate(HeapData::Str(Str::new(s)))
    }

    pub fn new_bytes(&mut self, bytes: &[u8]) -> RunResult<Value> {
        self.allocate(HeapData::Bytes(Bytes::new(bytes)))
    }

    pub fn new_range(&mut self, range: Range) -> RunResult<Value> {
        self.allocate(HeapData::Range(range))
    }

    pub fn new_slice(&mut self, start: Value, stop: Value, step: Value) -> RunResult<Value> {
        self.allocate(HeapData::Slice(Slice::new(start, stop, step)))
    }

    pub fn new_mapping_proxy(&mut self, obj: Value) -> RunResult<Value> {
        self.allocate(HeapData::MappingProxy(MappingProxy::new(obj)))
    }

    pub fn new_bound_method(&mut self, receiver: Value, func: Value) -> RunResult<Value> {
        self.allocate(HeapData::BoundMethod(BoundMethod::new(receiver, func)))
    }

    /// Wraps `obj` for `*` (level 1) or `**` (level 2) unpacking.
    pub fn new_star_wrapper(&mut self, level: u8, obj: Value) -> RunResult<Value> {
        let star = StarWrapper::new(level, obj)?;
        self.allocate(HeapData::StarWrapper(star))
    }

    pub fn new_property(&mut self, getter: Value, setter: Value) -> RunResult<Value> {
        self.allocate(HeapData::Property(Property::new(getter, setter)))
    }

    pub fn new_function(&mut self, function: Function) -> RunResult<Value> {
        self.allocate(HeapData::Function(function))
    }

    pub fn new_native_func(&mut self, native: NativeFunc) -> RunResult<Value> {
        self.allocate(HeapData::NativeFunc(native))
    }

    pub fn new_super(&mut self, obj: Value, ty: Type) -> RunResult<Value> {
        self.allocate(HeapData::Super(Super::new(obj, ty)))
    }

    pub fn new_module(&mut self, name: &str) -> RunResult<Value> {
        let name = self.interns.intern(name);
        self.allocate(HeapData::Module(Module::new(name)))
    }

    /// Creates a plain instance of the user type `ty`.
    ///
    /// Builtin ids are rejected: their values have dedicated constructors, and an `int`
    /// or `float` on the heap would escape the immediate fast path of [`Heap::is_type`].
    pub fn new_instance(&mut self, ty: Type) -> RunResult<Value> {
        if ty.as_builtin().is_some() {
            return Err(RunError::internal("Heap::new_instance: builtin type id"));
        }
        if ty.index() >= self.types.len() {
            return Err(RunError::internal("Heap::new_instance: unknown type id"));
        }
        self.allocate_typed(ty, HeapData::Instance)
    }

    /// Stores a plain aggregate by value; read it back with `extract` after registering a
    /// struct conversion for `S`.
    pub fn new_struct<S: PlainData>(&mut self, value: &S) -> RunResult<Value> {
        self.allocate(HeapData::Packed(Packed::new(value)))
    }

    pub fn new_pointer<P: 'static>(&mut self, ptr: *const P) -> RunResult<Value> {
        self.allocate(HeapData::Pointer(OpaquePtr::new(ptr)))
    }

    /// Creates a new runtime type with its own (permanent) type object.
    pub fn new_type(&mut self, name: &str, base: Option<Type>) -> RunResult<(Type, Value)> {
        let index = u16::try_from(self.types.len()).map_err(|_| RunError::internal("type id space exhausted"))?;
        let ty = Type::from_index(index);
        let name = self.interns.intern(name);
        let mut object = self.type_object(name, ty, base.or(Some(Type::OBJECT)));
        object.charged = object.estimate_size();
        if let Err(err) = self.tracker.on_allocate(|| object.charged) {
            object.release(&mut self.pool);
            return Err(err.into());
        }
        let id = self.insert(object);
        self.types.push(TypeEntry { name, object: id });
        Ok((ty, Value::from_id(id)))
    }

    /// Returns the type object describing `ty`.
    #[must_use]
    pub fn type_object_of(&self, ty: Type) -> Option<Value> {
        self.types.get(ty.index()).map(|entry| Value::from_id(entry.object))
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Returns a mutable reference to the object stored at `id`.
    ///
    /// # Panics
    /// Panics if the slot is missing or has been freed.
    pub fn object_mut(&mut self, id: HeapId) -> &mut HeapObject {
        entry_mut(&mut self.entries, id, "object_mut")
    }

    /// Returns the object at `id` if the slot is live.
    #[must_use]
    pub fn get_if_live(&self, id: HeapId) -> Option<&HeapObject> {
        self.entries.get(id.index())?.as_ref()
    }

    /// Returns the payload stored at `id`.
    ///
    /// # Panics
    /// Panics if the slot is missing or has been freed.
    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapData {
        self.object(id).data()
    }

    /// Returns the payload stored at `id` mutably.
    ///
    /// # Panics
    /// Panics if the slot is missing or has been freed.
    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        self.object_mut(id).data_mut()
    }

    /// Tests the runtime type of `value`.
    ///
    /// `int` and `float` are answered from the tag bits without touching the heap; every
    /// other type compares the header's type id.
    #[must_use]
    pub fn is_type(&self, value: Value, ty: Type) -> bool {
        match ty {
            Type::INT => value.is_int(),
            Type::FLOAT => value.is_float(),
            _ => match value.as_heap() {
                Some(id) => self.object(id).ty() == ty,
                None => value.immediate_type() == Some(ty),
            },
        }
    }

    /// Writes an attribute.
    ///
    /// Kinds without an eager attribute dict get one on first write if they support it;
    /// immediates and other kinds raise `AttributeError`.
    pub fn set_attr(&mut self, obj: Value, name: StringId, value: Value) -> RunResult<()> {
        let writable = obj.as_heap().filter(|id| {
            let object = self.object(*id);
            object.attrs.is_some() || object.data.has_lazy_attrs()
        });
        let Some(id) = writable else {
            return Err(ExcType::attribute_error(
                self.type_name(self.type_of(obj)),
                self.interns.get_str(name),
            ));
        };
        let load_factor = self.config.instance_load_factor;
        let object = entry_mut(&mut self.entries, id, "set_attr");
        if object.attrs.is_none() {
            object.enable_instance_dict(&mut self.pool, load_factor);
        }
        if let Some(attrs) = &mut object.attrs {
            attrs.set(name, value);
        }
        Ok(())
    }

    /// Removes an attribute, returning its value.
    pub fn del_attr(&mut self, obj: Value, name: StringId) -> RunResult<Value> {
        let removed = obj
            .as_heap()
            .and_then(|id| entry_mut(&mut self.entries, id, "del_attr").attrs.as_mut()?.remove(name));
        removed.ok_or_else(|| ExcType::attribute_error(self.type_name(self.type_of(obj)), self.interns.get_str(name)))
    }

    // ========================================================================
    // Collection
    // ========================================================================

    /// Clears the mark bit of every object. Starts a collection cycle.
    pub fn reset_marks(&mut self) {
        for object in self.entries.iter_mut().flatten() {
            object.gc.marked = false;
        }
    }

    /// Marks `value` and everything reachable from it.
    ///
    /// A no-op for immediates and for objects already marked this cycle, which is what
    /// makes marking terminate on cycles. Uses an explicit work list, so depth is bounded
    /// by heap memory rather than by the native stack.
    pub fn mark(&mut self, value: Value) {
        self.mark_all([value]);
    }

    /// Marks every root in `roots`.
    pub fn mark_all(&mut self, roots: impl IntoIterator<Item = Value>) {
        let mut work_list: Vec<HeapId> = roots.into_iter().filter_map(Value::as_heap).collect();
        self.drain_marks(&mut work_list, &mut NoopTracer);
    }

    /// Returns true if `value` is a heap reference marked in the current cycle.
    #[must_use]
    pub fn is_marked(&self, value: Value) -> bool {
        value.as_heap().is_some_and(|id| self.object(id).gc.marked)
    }

    fn drain_marks<Tr: GcTracer>(&mut self, work_list: &mut Vec<HeapId>, tracer: &mut Tr) -> usize {
        let mut newly_marked = 0;
        while let Some(id) = work_list.pop() {
            let object = entry_mut(&mut self.entries, id, "mark");
            if object.gc.marked {
                continue;
            }
            object.gc.marked = true;
            newly_marked += 1;
            tracer.on_mark(id, object.data.kind_name());
            object.trace(work_list);
        }
        newly_marked
    }

    /// Frees every collectable object not marked this cycle and clears the marks of survivors.
    ///
    /// Returns the number of objects freed. Freed objects hand their attribute dict back to
    /// the pool and their slot to the free list.
    pub fn sweep(&mut self) -> usize {
        self.sweep_traced(&mut NoopTracer)
    }

    fn sweep_traced<Tr: GcTracer>(&mut self, tracer: &mut Tr) -> usize {
        let mut swept = 0;
        for (index, slot) in self.entries.iter_mut().enumerate() {
            let Some(object) = slot.as_mut() else { continue };
            if !object.gc.enabled || object.gc.marked {
                object.gc.marked = false;
                continue;
            }
            let Some(object) = slot.take() else { continue };
            tracer.on_sweep(HeapId(index), object.data.kind_name());
            self.tracker.on_free(|| object.charged);
            object.release(&mut self.pool);
            self.free_list.push(HeapId(index));
            swept += 1;
        }
        swept
    }

    /// Runs a full mark-sweep cycle.
    ///
    /// Permanent objects (type objects) are implicit roots in addition to `roots`.
    pub fn collect_garbage(&mut self, roots: impl IntoIterator<Item = Value>) -> CollectStats {
        self.collect_garbage_traced(roots, &mut NoopTracer)
    }

    /// [`Heap::collect_garbage`] reporting each phase to `tracer`.
    pub fn collect_garbage_traced<Tr: GcTracer>(
        &mut self,
        roots: impl IntoIterator<Item = Value>,
        tracer: &mut Tr,
    ) -> CollectStats {
        self.reset_marks();
        let mut work_list: Vec<HeapId> = roots.into_iter().filter_map(Value::as_heap).collect();
        tracer.on_collect_start(work_list.len());
        work_list.extend(
            self.entries
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.as_ref().is_some_and(|o| !o.gc.enabled))
                .map(|(index, _)| HeapId(index)),
        );
        let marked = self.drain_marks(&mut work_list, tracer);
        let swept = self.sweep_traced(tracer);
        self.allocations_since_gc = 0;
        let stats = CollectStats {
            marked,
            swept,
            live: self.live_objects(),
        };
        tracer.on_collect_end(&stats);
        stats
    }

    /// True once `gc_interval` allocations happened since the last collection.
    #[must_use]
    pub fn should_gc(&self) -> bool {
        self.allocations_since_gc >= self.config.gc_interval
    }

    #[must_use]
    pub fn allocations_since_gc(&self) -> usize {
        self.allocations_since_gc
    }

    #[must_use]
    pub fn live_objects(&self) -> usize {
        self.entries.len() - self.free_list.len()
    }

    /// Returns a snapshot of the current heap state.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        let mut objects_by_kind: BTreeMap<&'static str, usize> = BTreeMap::new();
        for object in self.entries.iter().flatten() {
            *objects_by_kind.entry(object.data.kind_name()).or_insert(0) += 1;
        }
        HeapStats {
            live_objects: self.live_objects(),
            free_slots: self.free_list.len(),
            total_slots: self.entries.len(),
            objects_by_kind,
            pooled_dicts: self.pool.pooled(),
            tracker_allocations: self.tracker.allocation_count(),
            tracker_memory_bytes: self.tracker.current_memory_bytes(),
        }
    }
}

impl<T: ResourceTracker> HeapView for Heap<T> {
    fn object(&self, id: HeapId) -> &HeapObject {
        self.entries
            .get(id.index())
            .expect("Heap::object: slot missing")
            .as_ref()
            .expect("Heap::object: object already freed")
    }

    fn interns(&self) -> &Interns {
        &self.interns
    }

    fn registry(&self) -> &ConversionRegistry {
        &self.registry
    }

    fn type_name(&self, ty: Type) -> &str {
        self.types
            .get(ty.index())
            .map_or("<unknown>", |entry| self.interns.get_str(entry.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::NoLimitTracker;

    fn heap() -> Heap<NoLimitTracker> {
        Heap::with_tracker(NoLimitTracker)
    }

    #[test]
    fn builtin_type_objects_are_permanent_namespaces() {
        let heap = heap();
        let list_type = heap.type_object_of(Type::LIST).unwrap();
        let object = heap.object(list_type.as_heap().unwrap());
        assert!(!object.gc().is_enabled());
        assert_eq!(object.ty(), Type::TYPE);
        let attrs = object.attrs().expect("type objects own a namespace");
        assert!((attrs.load_factor() - heap.config().namespace_load_factor).abs() < f32::EPSILON);
        assert_eq!(heap.type_name(Type::LIST), "list");
    }

    #[test]
    fn eager_dicts_follow_kind() {
        let mut heap = heap();
        let list = heap.new_list(vec![]).unwrap();
        let module = heap.new_module("m").unwrap();
        let (ty, _) = heap.new_type("Point", None).unwrap();
        let inst = heap.new_instance(ty).unwrap();

        assert!(heap.object(list.as_heap().unwrap()).attrs().is_none());
        let module_attrs = heap.object(module.as_heap().unwrap()).attrs().unwrap();
        assert!((module_attrs.load_factor() - 0.5).abs() < f32::EPSILON);
        let inst_attrs = heap.object(inst.as_heap().unwrap()).attrs().unwrap();
        assert!((inst_attrs.load_factor() - 0.67).abs() < f32::EPSILON);
    }

    #[test]
    fn is_type_fast_paths_numeric_immediates() {
        let mut heap = heap();
        let list = heap.new_list(vec![]).unwrap();
        assert!(heap.is_type(Value::int(3), Type::INT));
        assert!(!heap.is_type(Value::int(3), Type::FLOAT));
        assert!(heap.is_type(Value::float(0.5), Type::FLOAT));
        assert!(heap.is_type(list, Type::LIST));
        assert!(!heap.is_type(list, Type::INT));
        assert!(heap.is_type(Value::TRUE, Type::BOOL));
    }

    #[test]
    #[should_panic(expected = "attribute dict already enabled")]
    fn enabling_a_dict_twice_panics() {
        let mut heap = heap();
        let module = heap.new_module("m").unwrap();
        let id = module.as_heap().unwrap();
        let Heap { entries, pool, .. } = &mut heap;
        entry_mut(entries, id, "test").enable_instance_dict(pool, 0.5);
    }

    #[test]
    fn attributes_on_leaf_kinds_are_rejected() {
        let mut heap = heap();
        let name = heap.intern("x");
        let list = heap.new_list(vec![]).unwrap();
        let err = heap.set_attr(list, name, Value::NONE).unwrap_err();
        assert_eq!(err.message(), Some("'list' object has no attribute 'x'"));
        let err = heap.set_attr(Value::int(1), name, Value::NONE).unwrap_err();
        assert_eq!(err.exc_type(), Some(ExcType::AttributeError));
    }

    #[test]
    fn packed_objects_get_a_dict_lazily() {
        let mut heap = heap();
        let name = heap.intern("tag");
        let packed = heap.new_struct(&[1u8, 2, 3, 4]).unwrap();
        assert!(!heap.object(packed.as_heap().unwrap()).has_attrs());
        heap.set_attr(packed, name, Value::int(9)).unwrap();
        assert!(heap.object(packed.as_heap().unwrap()).has_attrs());
        assert_eq!(heap.get_attr(packed, name), Some(Value::int(9)));
        assert_eq!(heap.del_attr(packed, name).unwrap(), Value::int(9));
        assert!(heap.del_attr(packed, name).is_err());
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut heap = heap();
        let a = heap.new_list(vec![]).unwrap();
        let b = heap.new_list(vec![]).unwrap();
        heap.collect_garbage([b]);
        let c = heap.new_list(vec![]).unwrap();
        assert_eq!(c.as_heap(), a.as_heap(), "the freed slot is handed out again");
        assert!(heap.get_if_live(b.as_heap().unwrap()).is_some());
    }
}
