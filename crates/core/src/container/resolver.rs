use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::errors::CoreError;

use super::builder::{Activation, ErasedInstance, Registration, ServiceFactory, ServiceId};
use super::scope::{ScopeId, ServiceScope};

/// The frozen, queryable projection of a built container
///
/// Exactly one resolver exists per engine; the registration table is never
/// mutated after build, so resolution of registered contracts is safe under
/// arbitrary concurrent callers. The only interior mutability is the
/// singleton-instance cache.
pub struct Resolver {
    registrations: HashMap<ServiceId, Vec<Registration>>,
    singletons: RwLock<HashMap<usize, ErasedInstance>>,
}

impl Resolver {
    pub(crate) fn new(registrations: HashMap<ServiceId, Vec<Registration>>) -> Self {
        Self {
            registrations,
            singletons: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of registrations in the frozen table
    pub fn registration_count(&self) -> usize {
        self.registrations.values().map(Vec::len).sum()
    }

    /// Check if a contract has at least one registration
    pub fn contains<C: ?Sized + 'static>(&self) -> bool {
        self.registrations.contains_key(&ServiceId::of::<C>())
    }

    /// Resolve the most recent registration for contract `C`
    pub fn resolve_one<C>(&self) -> Result<Arc<C>, CoreError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.resolve_in_scope::<C>(None)
    }

    /// Resolve a contract, returning `None` if it has no registration
    pub fn try_resolve<C>(&self) -> Option<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.resolve_one::<C>().ok()
    }

    /// Resolve every registration for contract `C`, in registration order
    ///
    /// A contract with zero registrations yields an empty vector, not an
    /// error.
    pub fn resolve_all<C>(&self) -> Result<Vec<Arc<C>>, CoreError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let id = ServiceId::of::<C>();
        let Some(registrations) = self.registrations.get(&id) else {
            return Ok(Vec::new());
        };
        registrations
            .iter()
            .map(|registration| self.activate::<C>(&id, registration, None))
            .collect()
    }

    /// Open a new resolution scope for per-scope lifetimes
    pub fn create_scope(self: &Arc<Self>) -> Scope {
        Scope {
            id: ScopeId::new(),
            resolver: Arc::clone(self),
            instances: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn resolve_in_scope<C>(&self, scope: Option<&Scope>) -> Result<Arc<C>, CoreError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let id = ServiceId::of::<C>();
        let registration = self
            .registrations
            .get(&id)
            .and_then(|registrations| registrations.last())
            .ok_or_else(|| CoreError::service_not_found(id.type_name()))?;
        self.activate::<C>(&id, registration, scope)
    }

    fn activate<C>(
        &self,
        id: &ServiceId,
        registration: &Registration,
        scope: Option<&Scope>,
    ) -> Result<Arc<C>, CoreError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        match &registration.activation {
            Activation::Instance(erased) => shared_handle::<C>(erased, id),
            Activation::Factory(factory) => match registration.lifetime {
                ServiceScope::Transient => {
                    let erased = factory(self)?;
                    shared_handle::<C>(&erased, id)
                }
                ServiceScope::Singleton => self.singleton::<C>(id, registration.sequence, factory),
                ServiceScope::Scoped => match scope {
                    Some(scope) => scope.instance::<C>(id, registration.sequence, factory),
                    None => Err(CoreError::scope_required(id.type_name())),
                },
            },
        }
    }

    fn singleton<C>(
        &self,
        id: &ServiceId,
        sequence: usize,
        factory: &ServiceFactory,
    ) -> Result<Arc<C>, CoreError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        {
            let cache = self
                .singletons
                .read()
                .map_err(|_| CoreError::lock("singleton_cache"))?;
            if let Some(existing) = cache.get(&sequence) {
                return shared_handle::<C>(existing, id);
            }
        }

        // Built outside the lock; if two callers race on the first
        // resolution, whichever instance lands in the cache wins.
        let erased = factory(self)?;
        let mut cache = self
            .singletons
            .write()
            .map_err(|_| CoreError::lock("singleton_cache"))?;
        match cache.entry(sequence) {
            Entry::Occupied(entry) => shared_handle::<C>(entry.get(), id),
            Entry::Vacant(entry) => shared_handle::<C>(entry.insert(erased), id),
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("registrations", &self.registration_count())
            .finish()
    }
}

/// A resolution scope caching one instance per scoped registration
pub struct Scope {
    id: ScopeId,
    resolver: Arc<Resolver>,
    instances: RwLock<HashMap<usize, ErasedInstance>>,
}

impl Scope {
    /// Identity of this scope
    pub fn id(&self) -> &ScopeId {
        &self.id
    }

    /// Resolve a contract within this scope
    pub fn resolve_one<C>(&self) -> Result<Arc<C>, CoreError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.resolver.resolve_in_scope::<C>(Some(self))
    }

    /// Resolve a contract within this scope, returning `None` if absent
    pub fn try_resolve<C>(&self) -> Option<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.resolve_one::<C>().ok()
    }

    fn instance<C>(
        &self,
        id: &ServiceId,
        sequence: usize,
        factory: &ServiceFactory,
    ) -> Result<Arc<C>, CoreError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        {
            let cache = self
                .instances
                .read()
                .map_err(|_| CoreError::lock("scope_instances"))?;
            if let Some(existing) = cache.get(&sequence) {
                return shared_handle::<C>(existing, id);
            }
        }

        let erased = factory(&self.resolver)?;
        let mut cache = self
            .instances
            .write()
            .map_err(|_| CoreError::lock("scope_instances"))?;
        match cache.entry(sequence) {
            Entry::Occupied(entry) => shared_handle::<C>(entry.get(), id),
            Entry::Vacant(entry) => shared_handle::<C>(entry.insert(erased), id),
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope").field("id", &self.id).finish()
    }
}

fn shared_handle<C>(erased: &ErasedInstance, id: &ServiceId) -> Result<Arc<C>, CoreError>
where
    C: ?Sized + Send + Sync + 'static,
{
    erased.downcast_ref::<Arc<C>>().cloned().ok_or_else(|| {
        CoreError::invalid_registration(format!(
            "stored instance for '{}' has a mismatched contract type",
            id.type_name()
        ))
    })
}
