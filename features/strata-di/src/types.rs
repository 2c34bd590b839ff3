use std::{
    any::{Any, TypeId},
    fmt::Debug,
    rc::Rc,
};

/// Errors produced by factories
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Registries are single threaded and never locked,
/// so anything with a static lifetime can be bound - no Send or Sync required
pub trait Injectable: 'static {}
impl<T: 'static> Injectable for T {}

/// A bound value with its type erased
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    pub instance: Rc<dyn Any>,
}

impl Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Instance").field(&self.info.type_name).finish()
    }
}

impl Instance {
    pub fn new<ExistingInstance: Injectable>(instance: ExistingInstance) -> Self {
        Instance {
            info: TypeInfo::of::<ExistingInstance>(),
            instance: Rc::new(instance),
        }
    }

    /// Returns the value, or the actual type name if it isn't a `T`
    pub fn downcast<T: Injectable>(&self) -> Result<Rc<T>, &'static str> {
        match Rc::downcast::<T>(self.instance.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }

    /// True if both point at the same value
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.instance, &other.instance)
    }
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}
