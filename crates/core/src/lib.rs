//! armature-core: the composition engine for the armature framework
//!
//! Independently-authored modules declare contributions — dependency
//! registrars, pipeline startups, mapping profiles — in static manifests.
//! The engine discovers them once, orders them deterministically, wires
//! them into a single container, and freezes the resolver the rest of the
//! process uses to obtain its dependencies.

pub mod config;
pub mod container;
pub mod contribution;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod mapping;
pub mod pipeline;

// Re-export key types for convenience
pub use config::EngineConfig;
pub use container::{
    Constructible, ConstructorFn, ContainerBuilder, Resolver, Scope, ScopeId, ServiceId,
    ServiceScope,
};
pub use contribution::{
    sort_contributions, Contribution, MappingProfile, Ordered, PipelineStartup, ServiceRegistrar,
};
pub use discovery::{
    ContributionDescriptor, DiscoveryDiagnostic, ModuleManifest, ModuleSet, TypeFinder,
};
pub use engine::{Engine, EngineState};
pub use errors::CoreError;
pub use mapping::{MappingBuilder, MappingConfig};
pub use pipeline::{PipelineBuilder, RequestStage};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}
