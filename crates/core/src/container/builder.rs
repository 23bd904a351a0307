use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::CoreError;

use super::resolver::Resolver;
use super::scope::ServiceScope;

/// Service identifier keyed by contract type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ServiceId {
    /// Create a service ID for a contract type
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            type_name: std::any::type_name::<C>(),
        }
    }

    /// Get the contract type name
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Type-erased shared instance; concretely a `Box` holding an `Arc<C>`
pub(crate) type ErasedInstance = Box<dyn Any + Send + Sync>;

/// Factory producing a shared instance, with access to the frozen resolver
pub(crate) type ServiceFactory =
    Box<dyn Fn(&Resolver) -> Result<ErasedInstance, CoreError> + Send + Sync>;

pub(crate) enum Activation {
    Instance(ErasedInstance),
    Factory(ServiceFactory),
}

impl std::fmt::Debug for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Activation::Instance(_) => write!(f, "Instance(<instance>)"),
            Activation::Factory(_) => write!(f, "Factory(<factory_fn>)"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Registration {
    /// Process-unique registration sequence; the singleton cache key
    pub(crate) sequence: usize,
    pub(crate) lifetime: ServiceScope,
    pub(crate) activation: Activation,
}

/// Write-only accumulation of service registrations
///
/// Owned by the composition root during the configuration phase; never
/// queried before [`ContainerBuilder::build`]. Repeated registrations for
/// one contract accumulate: `resolve_one` takes the most recent,
/// `resolve_all` returns all in registration order.
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    registrations: HashMap<ServiceId, Vec<Registration>>,
    sequence: usize,
}

impl ContainerBuilder {
    /// Create a new container builder
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, id: ServiceId, lifetime: ServiceScope, activation: Activation) {
        let registration = Registration {
            sequence: self.sequence,
            lifetime,
            activation,
        };
        self.sequence += 1;
        self.registrations.entry(id).or_default().push(registration);
    }

    /// Register an existing shared instance as a singleton for contract `C`
    pub fn register_instance<C>(&mut self, instance: Arc<C>) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.push(
            ServiceId::of::<C>(),
            ServiceScope::Singleton,
            Activation::Instance(Box::new(instance)),
        );
        self
    }

    /// Register an owned value as a singleton for its own concrete type
    pub fn register_value<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.register_instance::<T>(Arc::new(value))
    }

    /// Register a singleton factory for contract `C`
    ///
    /// The factory runs at most once, on first resolution, and may resolve
    /// its own dependencies through the resolver it receives.
    pub fn register_singleton<C, F>(&mut self, factory: F) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver) -> Result<Arc<C>, CoreError> + Send + Sync + 'static,
    {
        self.push(
            ServiceId::of::<C>(),
            ServiceScope::Singleton,
            Activation::Factory(erase(factory)),
        );
        self
    }

    /// Register a per-scope factory for contract `C`
    pub fn register_scoped<C, F>(&mut self, factory: F) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver) -> Result<Arc<C>, CoreError> + Send + Sync + 'static,
    {
        self.push(
            ServiceId::of::<C>(),
            ServiceScope::Scoped,
            Activation::Factory(erase(factory)),
        );
        self
    }

    /// Register a transient factory for contract `C`
    pub fn register_transient<C, F>(&mut self, factory: F) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver) -> Result<Arc<C>, CoreError> + Send + Sync + 'static,
    {
        self.push(
            ServiceId::of::<C>(),
            ServiceScope::Transient,
            Activation::Factory(erase(factory)),
        );
        self
    }

    /// Check if a contract has at least one registration
    pub fn contains<C: ?Sized + 'static>(&self) -> bool {
        self.registrations.contains_key(&ServiceId::of::<C>())
    }

    /// Total number of registrations accumulated so far
    pub fn registration_count(&self) -> usize {
        self.sequence
    }

    /// Freeze the accumulated registrations into an immutable resolver
    pub fn build(self) -> Resolver {
        Resolver::new(self.registrations)
    }
}

fn erase<C, F>(factory: F) -> ServiceFactory
where
    C: ?Sized + Send + Sync + 'static,
    F: Fn(&Resolver) -> Result<Arc<C>, CoreError> + Send + Sync + 'static,
{
    Box::new(move |resolver| Ok(Box::new(factory(resolver)?) as ErasedInstance))
}
