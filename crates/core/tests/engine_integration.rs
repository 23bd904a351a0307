//! End-to-end bootstrap scenarios across multiple modules

use std::sync::{Arc, Mutex};

use armature_core::{
    Constructible, ConstructorFn, ContainerBuilder, CoreError, Engine, EngineConfig, EngineState,
    MappingBuilder, MappingConfig, MappingProfile, ModuleManifest, ModuleSet, Ordered,
    PipelineBuilder, PipelineStartup, RequestStage, Resolver, ServiceRegistrar, TypeFinder,
};

/// Shared record of hook invocations across contributions
#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct NamedStage(&'static str);

impl RequestStage for NamedStage {
    fn name(&self) -> &'static str {
        self.0
    }
}

struct RecordingStartup {
    name: &'static str,
    order: i32,
    journal: Journal,
}

impl Ordered for RecordingStartup {
    fn order(&self) -> i32 {
        self.order
    }
}

impl PipelineStartup for RecordingStartup {
    fn configure_services(
        &self,
        _builder: &mut ContainerBuilder,
        _config: &EngineConfig,
    ) -> Result<(), CoreError> {
        self.journal.record(format!("services:{}", self.name));
        Ok(())
    }

    fn configure_pipeline(&self, pipeline: &mut PipelineBuilder) -> Result<(), CoreError> {
        self.journal.record(format!("pipeline:{}", self.name));
        pipeline.add_stage(Arc::new(NamedStage(self.name)));
        Ok(())
    }
}

trait AuditSink: Send + Sync {
    fn target(&self) -> &'static str;
}

struct NamedSink(&'static str);

impl AuditSink for NamedSink {
    fn target(&self) -> &'static str {
        self.0
    }
}

struct SinkRegistrar {
    name: &'static str,
    order: i32,
    journal: Journal,
}

impl Ordered for SinkRegistrar {
    fn order(&self) -> i32 {
        self.order
    }
}

impl ServiceRegistrar for SinkRegistrar {
    fn register(
        &self,
        builder: &mut ContainerBuilder,
        _finder: &TypeFinder,
        _config: &EngineConfig,
    ) -> Result<(), CoreError> {
        self.journal.record(format!("register:{}", self.name));
        builder.register_instance::<dyn AuditSink>(Arc::new(NamedSink(self.name)));
        Ok(())
    }
}

#[derive(Clone)]
struct Order {
    reference: String,
}

#[derive(Debug, PartialEq)]
struct OrderSummary {
    line: String,
}

struct BaseOrderProfile;

impl Ordered for BaseOrderProfile {
    fn order(&self) -> i32 {
        0
    }
}

impl MappingProfile for BaseOrderProfile {
    fn configure(&self, mapping: &mut MappingBuilder) {
        mapping.create_map(|order: &Order| OrderSummary {
            line: order.reference.clone(),
        });
    }
}

struct VerboseOrderProfile;

impl Ordered for VerboseOrderProfile {
    fn order(&self) -> i32 {
        1
    }
}

impl MappingProfile for VerboseOrderProfile {
    fn configure(&self, mapping: &mut MappingBuilder) {
        mapping.create_map(|order: &Order| OrderSummary {
            line: format!("order {}", order.reference),
        });
    }
}

/// Three modules named C, A, B with orders 2, 0, 1, discovered in that order
fn three_startup_modules(journal: &Journal) -> ModuleSet {
    let startup = |name: &'static str, order: i32, journal: Journal| {
        move || -> Box<dyn PipelineStartup> {
            Box::new(RecordingStartup {
                name,
                order,
                journal: journal.clone(),
            })
        }
    };

    ModuleSet::of(vec![
        ModuleManifest::new("module-c")
            .contribute::<dyn PipelineStartup, _>("C", startup("C", 2, journal.clone())),
        ModuleManifest::new("module-a")
            .contribute::<dyn PipelineStartup, _>("A", startup("A", 0, journal.clone())),
        ModuleManifest::new("module-b")
            .contribute::<dyn PipelineStartup, _>("B", startup("B", 1, journal.clone())),
    ])
}

#[test]
fn startup_hooks_fire_in_order_across_both_phases() {
    let journal = Journal::default();
    let mut engine = Engine::new(three_startup_modules(&journal));

    engine.configure_services(EngineConfig::new()).unwrap();
    let mut pipeline = PipelineBuilder::new();
    engine.configure_pipeline(&mut pipeline).unwrap();

    assert_eq!(
        journal.entries(),
        vec![
            "services:A",
            "services:B",
            "services:C",
            "pipeline:A",
            "pipeline:B",
            "pipeline:C",
        ]
    );
    assert_eq!(pipeline.stage_names(), vec!["A", "B", "C"]);
    assert_eq!(engine.state(), EngineState::PipelineConfigured);
}

#[test]
fn registrars_apply_ascending_with_stable_ties() {
    let journal = Journal::default();
    let registrar = |name: &'static str, order: i32, journal: Journal| {
        move || -> Box<dyn ServiceRegistrar> {
            Box::new(SinkRegistrar {
                name,
                order,
                journal: journal.clone(),
            })
        }
    };

    // Orders 3, 1, 1, 2; the two order-1 registrars keep discovery order.
    let modules = ModuleSet::of(vec![ModuleManifest::new("sinks")
        .contribute::<dyn ServiceRegistrar, _>("late", registrar("late", 3, journal.clone()))
        .contribute::<dyn ServiceRegistrar, _>("first", registrar("first", 1, journal.clone()))
        .contribute::<dyn ServiceRegistrar, _>("second", registrar("second", 1, journal.clone()))
        .contribute::<dyn ServiceRegistrar, _>("middle", registrar("middle", 2, journal.clone()))]);

    let mut engine = Engine::new(modules);
    let resolver = engine.configure_services(EngineConfig::new()).unwrap();

    assert_eq!(
        journal.entries(),
        vec![
            "register:first",
            "register:second",
            "register:middle",
            "register:late",
        ]
    );

    // resolve_all reflects application order; resolve_one takes the last.
    let sinks = resolver.resolve_all::<dyn AuditSink>().unwrap();
    let targets: Vec<_> = sinks.iter().map(|s| s.target()).collect();
    assert_eq!(targets, vec!["first", "second", "middle", "late"]);
    assert_eq!(resolver.resolve_one::<dyn AuditSink>().unwrap().target(), "late");
}

#[test]
fn mapping_profiles_merge_with_ascending_order_override() {
    let modules = ModuleSet::of(vec![
        ModuleManifest::new("orders-verbose")
            .contribute::<dyn MappingProfile, _>("VerboseOrderProfile", || {
                Box::new(VerboseOrderProfile)
            }),
        ModuleManifest::new("orders-base")
            .contribute::<dyn MappingProfile, _>("BaseOrderProfile", || Box::new(BaseOrderProfile)),
    ]);

    let mut engine = Engine::new(modules);
    let resolver = engine.configure_services(EngineConfig::new()).unwrap();

    // The order-1 profile applies after the order-0 profile and wins.
    let mapping = resolver.resolve_one::<MappingConfig>().unwrap();
    let summary: OrderSummary = mapping
        .map(&Order {
            reference: "A-17".into(),
        })
        .unwrap();
    assert_eq!(summary.line, "order A-17");
}

struct AuditController {
    sink: Arc<dyn AuditSink>,
    verbose: bool,
}

trait Tracer: Send + Sync {}

impl Constructible for AuditController {
    fn constructors() -> Vec<ConstructorFn<Self>> {
        vec![
            // Declared first: wants a tracer nothing registers.
            |resolver: &Resolver| {
                let _tracer = resolver.resolve_one::<dyn Tracer>()?;
                Ok(AuditController {
                    sink: resolver.resolve_one::<dyn AuditSink>()?,
                    verbose: true,
                })
            },
            |resolver: &Resolver| {
                Ok(AuditController {
                    sink: resolver.resolve_one::<dyn AuditSink>()?,
                    verbose: false,
                })
            },
        ]
    }
}

#[test]
fn unregistered_controller_composes_from_registered_services() {
    let journal = Journal::default();
    let modules = ModuleSet::of(vec![ModuleManifest::new("sinks")
        .contribute::<dyn ServiceRegistrar, _>("only", {
            let journal = journal.clone();
            move || -> Box<dyn ServiceRegistrar> {
                Box::new(SinkRegistrar {
                    name: "only",
                    order: 0,
                    journal: journal.clone(),
                })
            }
        })]);

    let mut engine = Engine::new(modules);
    engine.configure_services(EngineConfig::new()).unwrap();

    let controller = engine.resolve_unregistered::<AuditController>().unwrap();
    assert!(!controller.verbose);
    assert_eq!(controller.sink.target(), "only");
}

#[test]
fn discovery_survives_a_failing_module_source() {
    let journal = Journal::default();
    let good = {
        let journal = journal.clone();
        move || -> Result<ModuleManifest, CoreError> {
            Ok(ModuleManifest::new("good").contribute::<dyn PipelineStartup, _>("A", {
                let journal = journal.clone();
                move || -> Box<dyn PipelineStartup> {
                    Box::new(RecordingStartup {
                        name: "A",
                        order: 0,
                        journal: journal.clone(),
                    })
                }
            }))
        }
    };
    let sources: Vec<Box<dyn FnOnce() -> Result<ModuleManifest, CoreError>>> = vec![
        Box::new(good),
        Box::new(|| Err(CoreError::discovery_failed("bad", "corrupt manifest"))),
    ];

    let set = ModuleSet::collect(sources);
    assert_eq!(set.len(), 1);
    assert_eq!(set.diagnostics().len(), 1);

    let mut engine = Engine::new(set);
    engine.configure_services(EngineConfig::new()).unwrap();
    assert_eq!(journal.entries(), vec!["services:A"]);
}
