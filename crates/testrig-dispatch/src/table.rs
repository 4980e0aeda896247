//! Operation dispatch table.
//!
//! Runtime-registered types expose named operations whose implementations
//! live behind slots in this table. Callers dispatch through the slot's
//! current implementation; an interception swaps the slot to a replacement
//! while retaining the original so the replacement can forward to it.

use std::any::Any;
use std::sync::{Arc, OnceLock, RwLock};

use dashmap::DashMap;
use tracing::debug;

/// Implementation behind an operation slot.
pub type Imp = Arc<dyn Fn(&OpCall) -> OpReturn + Send + Sync>;

/// Arguments to a dispatched operation: a receiver plus at most one
/// argument, both type-erased.
#[derive(Clone)]
pub struct OpCall {
    /// The receiving instance.
    pub receiver: Arc<dyn Any + Send + Sync>,
    /// Optional single argument.
    pub argument: Option<Arc<dyn Any + Send + Sync>>,
}

impl OpCall {
    /// A call with no argument.
    pub fn on(receiver: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            receiver,
            argument: None,
        }
    }

    /// A call with a single argument.
    pub fn with_argument(
        receiver: Arc<dyn Any + Send + Sync>,
        argument: Arc<dyn Any + Send + Sync>,
    ) -> Self {
        Self {
            receiver,
            argument: Some(argument),
        }
    }
}

impl std::fmt::Debug for OpCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpCall")
            .field("has_argument", &self.argument.is_some())
            .finish()
    }
}

/// Return value of a dispatched operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpReturn {
    /// The operation returns nothing.
    Unit,
    /// The operation returns a boolean.
    Bool(bool),
}

impl OpReturn {
    /// The boolean value, if this is a boolean return.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Unit => None,
        }
    }
}

/// A slot holding the live implementation of one operation.
///
/// Publishing a new implementation is a single atomic swap; readers always
/// observe either the old or the new implementation, never a mix.
pub struct OpSlot {
    imp: RwLock<Imp>,
}

impl OpSlot {
    fn new(imp: Imp) -> Self {
        Self {
            imp: RwLock::new(imp),
        }
    }

    /// The current implementation.
    pub fn current(&self) -> Imp {
        self.imp.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn publish(&self, imp: Imp) {
        *self.imp.write().unwrap_or_else(|e| e.into_inner()) = imp;
    }
}

/// Record of one installed interception.
///
/// Retains the original implementation for the lifetime of the override so
/// the replacement can forward to it. There is no restore operation;
/// [`InterceptRecord::apply`] re-publishes the replacement after another
/// mechanism may have written the slot.
pub struct InterceptRecord {
    type_name: String,
    op_name: String,
    original: Imp,
    replacement: Imp,
    slot: Arc<OpSlot>,
}

impl InterceptRecord {
    /// The implementation that was live before the install.
    pub fn original(&self) -> &Imp {
        &self.original
    }

    /// The replacement implementation.
    pub fn replacement(&self) -> &Imp {
        &self.replacement
    }

    /// Re-publishes the replacement into the slot.
    pub fn apply(&self) {
        self.slot.publish(self.replacement.clone());
    }
}

impl std::fmt::Debug for InterceptRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptRecord")
            .field("type_name", &self.type_name)
            .field("op_name", &self.op_name)
            .finish()
    }
}

/// One registered type: a bag of named operation slots.
#[derive(Default)]
struct TypeEntry {
    ops: DashMap<String, Arc<OpSlot>>,
}

/// The process's operation dispatch table.
///
/// Types appear as the modules defining them register themselves, which is
/// what makes `contains_type` usable as a readiness probe for lazily
/// loaded modules.
pub struct DispatchTable {
    types: DashMap<String, Arc<TypeEntry>>,
}

static GLOBAL: OnceLock<Arc<DispatchTable>> = OnceLock::new();

impl DispatchTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            types: DashMap::new(),
        }
    }

    /// The process-wide table, created lazily on first access.
    pub fn global() -> &'static Arc<DispatchTable> {
        GLOBAL.get_or_init(|| Arc::new(Self::new()))
    }

    /// Registers a type with no operations yet.
    pub fn define_type(&self, type_name: &str) {
        self.types.entry(type_name.to_string()).or_default();
    }

    /// Whether `type_name` has been registered.
    pub fn contains_type(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Registers (or overwrites) an operation on a type, creating the type
    /// entry if needed.
    ///
    /// Redefinition publishes into the existing slot, so interception
    /// records taken against it stay bound to the live slot.
    pub fn define_op(&self, type_name: &str, op_name: &str, imp: Imp) {
        let entry = self.types.entry(type_name.to_string()).or_default();
        let existing = entry.ops.get(op_name).map(|slot| slot.value().clone());
        match existing {
            Some(slot) => slot.publish(imp),
            None => {
                entry
                    .ops
                    .insert(op_name.to_string(), Arc::new(OpSlot::new(imp)));
            }
        }
    }

    /// The current implementation behind an operation, if defined.
    pub fn operation(&self, type_name: &str, op_name: &str) -> Option<Imp> {
        let entry = self.types.get(type_name)?;
        let slot = entry.ops.get(op_name)?;
        Some(slot.current())
    }

    /// Dispatches a call through an operation's current implementation.
    ///
    /// Returns `None` if the type or operation is not defined.
    pub fn invoke(&self, type_name: &str, op_name: &str, call: &OpCall) -> Option<OpReturn> {
        let imp = self.operation(type_name, op_name)?;
        Some(imp.as_ref()(call))
    }

    /// Installs a replacement implementation for an operation.
    ///
    /// `factory` receives the original implementation and returns the
    /// replacement, which is published atomically. Returns `None` when the
    /// type or operation does not exist — callers treat that as "this
    /// version of the target doesn't have it" and skip.
    pub fn install(
        &self,
        type_name: &str,
        op_name: &str,
        factory: impl FnOnce(Imp) -> Imp,
    ) -> Option<InterceptRecord> {
        let entry = self.types.get(type_name)?;
        let slot = entry.ops.get(op_name)?.value().clone();
        drop(entry);

        let mut imp = slot.imp.write().unwrap_or_else(|e| e.into_inner());
        let original = imp.clone();
        let replacement = factory(original.clone());
        *imp = replacement.clone();
        drop(imp);

        debug!(type_name, op_name, "Interception installed");
        Some(InterceptRecord {
            type_name: type_name.to_string(),
            op_name: op_name.to_string(),
            original,
            replacement,
            slot,
        })
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("type_count", &self.types.len())
            .finish()
    }
}
