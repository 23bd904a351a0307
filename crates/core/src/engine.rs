//! Composition root
//!
//! The [`Engine`] drives the two bootstrap phases: service configuration
//! (startup hooks, mapping profiles, dependency registrars, container
//! build) and pipeline configuration. Both phases run exactly once, in
//! that order, on a single thread; the frozen [`Resolver`] the first phase
//! produces is the only service-location surface for the rest of the
//! process.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::container::{Constructible, ContainerBuilder, Resolver};
use crate::contribution::{
    sort_contributions, Contribution, MappingProfile, Ordered, PipelineStartup, ServiceRegistrar,
};
use crate::discovery::{ModuleSet, TypeFinder};
use crate::errors::CoreError;
use crate::mapping::{MappingBuilder, MappingConfig};
use crate::pipeline::PipelineBuilder;

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No phase has run; no resolver exists
    Uninitialized,
    /// Services are configured and the resolver is frozen
    ServicesConfigured,
    /// The pipeline phase has also completed
    PipelineConfigured,
}

impl EngineState {
    /// Get the state name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::ServicesConfigured => "services configured",
            EngineState::PipelineConfigured => "pipeline configured",
        }
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The composition root assembling the whole process object graph
pub struct Engine {
    finder: Arc<TypeFinder>,
    state: EngineState,
    resolver: Option<Arc<Resolver>>,
    mapping: Option<Arc<MappingConfig>>,
}

impl Engine {
    /// Create an engine over a frozen module set
    pub fn new(modules: ModuleSet) -> Self {
        Self {
            finder: Arc::new(TypeFinder::new(modules)),
            state: EngineState::Uninitialized,
            resolver: None,
            mapping: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The type finder over the engine's module set
    pub fn finder(&self) -> &Arc<TypeFinder> {
        &self.finder
    }

    /// Discover, instantiate, and order every contribution of one kind
    fn instantiate_sorted<C>(&self) -> Result<Vec<Contribution<C>>, CoreError>
    where
        C: Ordered + ?Sized + 'static,
    {
        let descriptors = self.finder.find_implementations::<C>();
        let mut contributions = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            let instance = descriptor.instantiate()?;
            contributions.push(Contribution::new(
                descriptor.module(),
                descriptor.type_name(),
                instance,
            ));
        }
        sort_contributions(&mut contributions);
        Ok(contributions)
    }

    /// Run the service-configuration phase and freeze the resolver
    ///
    /// Startup hooks run first, then mapping profiles fold into the frozen
    /// mapping configuration, then dependency registrars run, and finally
    /// the container builds. Any contribution failure aborts the phase and
    /// leaves the engine uninitialized; a corrected second call may still
    /// succeed.
    pub fn configure_services(
        &mut self,
        config: EngineConfig,
    ) -> Result<Arc<Resolver>, CoreError> {
        if self.state != EngineState::Uninitialized {
            return Err(CoreError::engine_state(
                EngineState::Uninitialized.as_str(),
                self.state.as_str(),
            ));
        }

        let config = Arc::new(config);
        let mut builder = ContainerBuilder::new();

        // Startup service hooks run before any dependency registrar.
        let startups = self.instantiate_sorted::<dyn PipelineStartup>()?;
        for startup in &startups {
            tracing::info!(
                startup = startup.type_name(),
                module = startup.module(),
                order = startup.order(),
                "applying startup service configuration"
            );
            startup
                .configure_services(&mut builder, &config)
                .map_err(|e| {
                    CoreError::contribution_hook(startup.type_name(), "configure_services", e)
                })?;
        }

        let profiles = self.instantiate_sorted::<dyn MappingProfile>()?;
        let mut mapping = MappingBuilder::new();
        for profile in &profiles {
            tracing::info!(
                profile = profile.type_name(),
                module = profile.module(),
                order = profile.order(),
                "applying mapping profile"
            );
            profile.configure(&mut mapping);
        }
        let mapping = Arc::new(mapping.freeze());

        let registrars = self.instantiate_sorted::<dyn ServiceRegistrar>()?;
        for registrar in &registrars {
            tracing::info!(
                registrar = registrar.type_name(),
                module = registrar.module(),
                order = registrar.order(),
                "applying dependency registrar"
            );
            registrar
                .register(&mut builder, &self.finder, &config)
                .map_err(|e| CoreError::contribution_hook(registrar.type_name(), "register", e))?;
        }

        // Ambient services every consumer can resolve.
        builder.register_instance::<TypeFinder>(Arc::clone(&self.finder));
        builder.register_instance::<EngineConfig>(Arc::clone(&config));
        builder.register_instance::<MappingConfig>(Arc::clone(&mapping));

        let resolver = Arc::new(builder.build());
        self.mapping = Some(mapping);
        self.resolver = Some(Arc::clone(&resolver));
        self.state = EngineState::ServicesConfigured;
        tracing::info!(
            registrations = resolver.registration_count(),
            "service configuration complete"
        );
        Ok(resolver)
    }

    /// Run the pipeline-configuration phase
    ///
    /// Re-discovers startup contributions in the same deterministic order
    /// as the first phase and instantiates fresh instances; a contribution
    /// is not assumed to retain state between phases. Calling this before
    /// [`Engine::configure_services`] fails without assembling anything.
    pub fn configure_pipeline(&mut self, pipeline: &mut PipelineBuilder) -> Result<(), CoreError> {
        if self.state != EngineState::ServicesConfigured {
            return Err(CoreError::engine_state(
                EngineState::ServicesConfigured.as_str(),
                self.state.as_str(),
            ));
        }

        let startups = self.instantiate_sorted::<dyn PipelineStartup>()?;
        for startup in &startups {
            tracing::info!(
                startup = startup.type_name(),
                module = startup.module(),
                order = startup.order(),
                "applying pipeline configuration"
            );
            startup.configure_pipeline(pipeline).map_err(|e| {
                CoreError::contribution_hook(startup.type_name(), "configure_pipeline", e)
            })?;
        }

        self.state = EngineState::PipelineConfigured;
        tracing::info!(stages = pipeline.len(), "pipeline configuration complete");
        Ok(())
    }

    /// The frozen resolver, available once services are configured
    pub fn resolver(&self) -> Result<&Arc<Resolver>, CoreError> {
        self.resolver.as_ref().ok_or_else(|| {
            CoreError::engine_state(
                EngineState::ServicesConfigured.as_str(),
                self.state.as_str(),
            )
        })
    }

    /// The frozen mapping configuration, available once services are configured
    pub fn mapping(&self) -> Result<&Arc<MappingConfig>, CoreError> {
        self.mapping.as_ref().ok_or_else(|| {
            CoreError::engine_state(
                EngineState::ServicesConfigured.as_str(),
                self.state.as_str(),
            )
        })
    }

    /// Resolve the most recent registration for contract `C`
    pub fn resolve_one<C>(&self) -> Result<Arc<C>, CoreError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.resolver()?.resolve_one::<C>()
    }

    /// Resolve every registration for contract `C`
    pub fn resolve_all<C>(&self) -> Result<Vec<Arc<C>>, CoreError>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.resolver()?.resolve_all::<C>()
    }

    /// Construct an unregistered type from registered building blocks
    pub fn resolve_unregistered<T: Constructible>(&self) -> Result<T, CoreError> {
        self.resolver()?.resolve_unregistered::<T>()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("modules", &self.finder.module_set().len())
            .finish()
    }
}
