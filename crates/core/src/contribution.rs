//! Ordered contribution protocol
//!
//! Every contribution kind exposes a single relative-order number through
//! [`Ordered`]. One shared stable sort applies to all kinds; ties preserve
//! discovery order.

use crate::config::EngineConfig;
use crate::container::ContainerBuilder;
use crate::discovery::TypeFinder;
use crate::errors::CoreError;
use crate::mapping::MappingBuilder;
use crate::pipeline::PipelineBuilder;

/// Relative-order protocol shared by every contribution kind
pub trait Ordered {
    /// Relative order; lower runs first, ties keep discovery order
    fn order(&self) -> i32;
}

/// Stable ascending sort by contribution order
///
/// Shared by all contribution kinds; no kind carries its own sort logic.
pub fn sort_contributions<T: Ordered>(contributions: &mut [T]) {
    contributions.sort_by_key(|contribution| contribution.order());
}

/// A module's dependency registrations
pub trait ServiceRegistrar: Ordered + Send + Sync {
    /// Register services against the container builder
    ///
    /// Receives the type finder so a registrar can itself discover types,
    /// and the external configuration passed through unmodified.
    fn register(
        &self,
        builder: &mut ContainerBuilder,
        finder: &TypeFinder,
        config: &EngineConfig,
    ) -> Result<(), CoreError>;
}

/// A module's bootstrap hooks, invoked in both engine phases
pub trait PipelineStartup: Ordered + Send + Sync {
    /// Configure services; runs before any [`ServiceRegistrar`]
    fn configure_services(
        &self,
        builder: &mut ContainerBuilder,
        config: &EngineConfig,
    ) -> Result<(), CoreError>;

    /// Configure the request-handling pipeline
    fn configure_pipeline(&self, pipeline: &mut PipelineBuilder) -> Result<(), CoreError>;
}

/// A module's object-mapping registrations
pub trait MappingProfile: Ordered + Send + Sync {
    /// Add this profile's conversions to the shared mapping configuration
    fn configure(&self, mapping: &mut MappingBuilder);
}

/// A discovered contribution instantiated for one engine phase
pub struct Contribution<C: ?Sized> {
    module: &'static str,
    type_name: &'static str,
    instance: Box<C>,
}

impl<C: ?Sized> Contribution<C> {
    /// Pair a fresh instance with its discovery metadata
    pub fn new(module: &'static str, type_name: &'static str, instance: Box<C>) -> Self {
        Self {
            module,
            type_name,
            instance,
        }
    }

    /// Name of the module that contributed this instance
    pub fn module(&self) -> &'static str {
        self.module
    }

    /// Name of the concrete contribution type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Consume the wrapper, keeping the instance
    pub fn into_instance(self) -> Box<C> {
        self.instance
    }
}

impl<C: ?Sized> std::ops::Deref for Contribution<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.instance
    }
}

impl<C: Ordered + ?Sized> Ordered for Contribution<C> {
    fn order(&self) -> i32 {
        self.instance.order()
    }
}
