//! Module discovery
//!
//! Modules describe the contributions they ship in a [`ModuleManifest`]
//! built at the start of `main`. A [`ModuleSet`] collects manifests once,
//! tolerating sources that fail to load, and the [`TypeFinder`] answers
//! capability queries over the frozen set. Discovery is read-only and
//! deterministic: a fixed set always yields contributions in the same order.

use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::errors::CoreError;

type ErasedConstructor = Arc<dyn Fn() -> Box<dyn Any> + Send + Sync>;

struct ContributionEntry {
    capability: TypeId,
    capability_name: &'static str,
    type_name: &'static str,
    construct: ErasedConstructor,
}

/// Static description of the contributions one module ships
pub struct ModuleManifest {
    name: &'static str,
    entries: Vec<ContributionEntry>,
}

impl ModuleManifest {
    /// Create a new, empty manifest for a module
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    /// Module name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declare a contribution implementing capability `C`
    ///
    /// The constructor produces a fresh instance each time it is called;
    /// the engine instantiates contributions once per phase.
    pub fn contribute<C, F>(mut self, type_name: &'static str, construct: F) -> Self
    where
        C: ?Sized + 'static,
        F: Fn() -> Box<C> + Send + Sync + 'static,
    {
        self.entries.push(ContributionEntry {
            capability: TypeId::of::<C>(),
            capability_name: std::any::type_name::<C>(),
            type_name,
            construct: Arc::new(move || Box::new(construct()) as Box<dyn Any>),
        });
        self
    }

    /// Number of contributions declared by this module
    pub fn contribution_count(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for ModuleManifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleManifest")
            .field("name", &self.name)
            .field("contributions", &self.entries.len())
            .finish()
    }
}

/// Diagnostic recorded for a module that failed to load
#[derive(Debug, Clone)]
pub struct DiscoveryDiagnostic {
    /// Position of the failing source in the collection order
    pub source_index: usize,
    /// Rendered failure cause
    pub message: String,
}

/// The frozen set of modules available for discovery
///
/// Immutable after collection; collection order is the tiebreaker for
/// contributions with equal order numbers.
#[derive(Debug, Default)]
pub struct ModuleSet {
    manifests: Vec<ModuleManifest>,
    diagnostics: Vec<DiscoveryDiagnostic>,
}

impl ModuleSet {
    /// Build a module set from already-constructed manifests
    pub fn of(manifests: Vec<ModuleManifest>) -> Self {
        Self {
            manifests,
            diagnostics: Vec::new(),
        }
    }

    /// Collect manifests from fallible sources
    ///
    /// A source that fails is skipped with a recorded diagnostic; it never
    /// aborts collection for the whole set.
    pub fn collect<I, F>(sources: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Result<ModuleManifest, CoreError>,
    {
        let mut manifests = Vec::new();
        let mut diagnostics = Vec::new();

        for (source_index, source) in sources.into_iter().enumerate() {
            match source() {
                Ok(manifest) => {
                    tracing::debug!(
                        module = manifest.name,
                        contributions = manifest.entries.len(),
                        "collected module manifest"
                    );
                    manifests.push(manifest);
                }
                Err(error) => {
                    tracing::warn!(
                        source_index,
                        error = %error,
                        "skipping module that failed to load"
                    );
                    diagnostics.push(DiscoveryDiagnostic {
                        source_index,
                        message: error.to_string(),
                    });
                }
            }
        }

        Self {
            manifests,
            diagnostics,
        }
    }

    /// Diagnostics recorded for sources that failed to load
    pub fn diagnostics(&self) -> &[DiscoveryDiagnostic] {
        &self.diagnostics
    }

    /// Names of the collected modules, in collection order
    pub fn module_names(&self) -> Vec<&'static str> {
        self.manifests.iter().map(|m| m.name).collect()
    }

    /// Number of collected modules
    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    /// Check whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}

/// A discovered contribution for capability `C`, not yet instantiated
pub struct ContributionDescriptor<C: ?Sized> {
    module: &'static str,
    type_name: &'static str,
    capability_name: &'static str,
    construct: ErasedConstructor,
    _capability: PhantomData<fn() -> Box<C>>,
}

impl<C: ?Sized + 'static> ContributionDescriptor<C> {
    /// Name of the module that contributed this type
    pub fn module(&self) -> &'static str {
        self.module
    }

    /// Name of the concrete contribution type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Instantiate a fresh contribution
    pub fn instantiate(&self) -> Result<Box<C>, CoreError> {
        (self.construct)()
            .downcast::<Box<C>>()
            .map(|boxed| *boxed)
            .map_err(|_| {
                CoreError::contribution_instantiation(
                    self.capability_name,
                    self.type_name,
                    "constructor did not produce the requested capability",
                )
            })
    }
}

impl<C: ?Sized> Clone for ContributionDescriptor<C> {
    fn clone(&self) -> Self {
        Self {
            module: self.module,
            type_name: self.type_name,
            capability_name: self.capability_name,
            construct: Arc::clone(&self.construct),
            _capability: PhantomData,
        }
    }
}

impl<C: ?Sized> std::fmt::Debug for ContributionDescriptor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContributionDescriptor")
            .field("module", &self.module)
            .field("type_name", &self.type_name)
            .field("capability", &self.capability_name)
            .finish()
    }
}

/// Read-only capability queries over a frozen [`ModuleSet`]
#[derive(Debug)]
pub struct TypeFinder {
    set: ModuleSet,
}

impl TypeFinder {
    /// Create a finder over a frozen module set
    pub fn new(set: ModuleSet) -> Self {
        Self { set }
    }

    /// Find every contribution implementing capability `C`
    ///
    /// Deterministic for a fixed module set: results follow module
    /// collection order, then per-module declaration order. Safe to call
    /// repeatedly and concurrently.
    pub fn find_implementations<C: ?Sized + 'static>(&self) -> Vec<ContributionDescriptor<C>> {
        let capability = TypeId::of::<C>();
        let mut found = Vec::new();

        for manifest in &self.set.manifests {
            for entry in &manifest.entries {
                if entry.capability == capability {
                    found.push(ContributionDescriptor {
                        module: manifest.name,
                        type_name: entry.type_name,
                        capability_name: entry.capability_name,
                        construct: Arc::clone(&entry.construct),
                        _capability: PhantomData,
                    });
                }
            }
        }

        found
    }

    /// The underlying module set
    pub fn module_set(&self) -> &ModuleSet {
        &self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct English;
    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    struct French;
    impl Greeter for French {
        fn greet(&self) -> &'static str {
            "bonjour"
        }
    }

    trait Farewell: Send + Sync {
        fn part(&self) -> &'static str;
    }

    struct Wave;
    impl Farewell for Wave {
        fn part(&self) -> &'static str {
            "bye"
        }
    }

    fn greetings_manifest() -> ModuleManifest {
        ModuleManifest::new("greetings")
            .contribute::<dyn Greeter, _>("English", || Box::new(English))
            .contribute::<dyn Greeter, _>("French", || Box::new(French))
            .contribute::<dyn Farewell, _>("Wave", || Box::new(Wave))
    }

    #[test]
    fn test_find_implementations_filters_by_capability() {
        let finder = TypeFinder::new(ModuleSet::of(vec![greetings_manifest()]));

        let greeters = finder.find_implementations::<dyn Greeter>();
        assert_eq!(greeters.len(), 2);

        let farewells = finder.find_implementations::<dyn Farewell>();
        assert_eq!(farewells.len(), 1);
        assert_eq!(farewells[0].type_name(), "Wave");
    }

    #[test]
    fn test_find_implementations_is_deterministic() {
        let finder = TypeFinder::new(ModuleSet::of(vec![
            greetings_manifest(),
            ModuleManifest::new("extra").contribute::<dyn Greeter, _>("English2", || Box::new(English)),
        ]));

        let first: Vec<_> = finder
            .find_implementations::<dyn Greeter>()
            .iter()
            .map(|d| (d.module(), d.type_name()))
            .collect();
        let second: Vec<_> = finder
            .find_implementations::<dyn Greeter>()
            .iter()
            .map(|d| (d.module(), d.type_name()))
            .collect();

        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                ("greetings", "English"),
                ("greetings", "French"),
                ("extra", "English2"),
            ]
        );
    }

    #[test]
    fn test_instantiate_produces_fresh_instances() {
        let finder = TypeFinder::new(ModuleSet::of(vec![greetings_manifest()]));
        let descriptors = finder.find_implementations::<dyn Greeter>();

        let one = descriptors[0].instantiate().unwrap();
        let two = descriptors[0].instantiate().unwrap();
        assert_eq!(one.greet(), "hello");
        assert_eq!(two.greet(), "hello");
    }

    #[test]
    fn test_collect_skips_failing_sources() {
        let sources: [fn() -> Result<ModuleManifest, CoreError>; 3] = [
            || Ok(greetings_manifest()),
            || Err(CoreError::discovery_failed("broken", "manifest unavailable")),
            || Ok(ModuleManifest::new("tail")),
        ];
        let set = ModuleSet::collect(sources);

        assert_eq!(set.len(), 2);
        assert_eq!(set.module_names(), vec!["greetings", "tail"]);
        assert_eq!(set.diagnostics().len(), 1);
        assert_eq!(set.diagnostics()[0].source_index, 1);
        assert!(set.diagnostics()[0].message.contains("manifest unavailable"));
    }
}
