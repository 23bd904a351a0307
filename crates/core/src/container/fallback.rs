//! Fallback construction for unregistered types
//!
//! A type opts in by implementing [`Constructible`] and listing its
//! constructor candidates in declared order. Resolution tries each in turn
//! against the frozen resolver and keeps the first that is fully
//! satisfiable; there is no reflection and no registration-table mutation.

use crate::errors::CoreError;

use super::resolver::Resolver;

/// One constructor candidate: resolves its parameters and builds the value
pub type ConstructorFn<T> = fn(&Resolver) -> Result<T, CoreError>;

/// Types that can be composed on the fly from registered building blocks
///
/// A candidate fails exactly when a resolution inside it fails. An optional
/// dependency is expressed with [`Resolver::try_resolve`] inside the
/// candidate, making "intentionally absent" an explicit per-declaration
/// choice.
pub trait Constructible: Sized + Send + Sync + 'static {
    /// Constructor candidates, in declared order
    fn constructors() -> Vec<ConstructorFn<Self>>;
}

impl Resolver {
    /// Construct an instance of a type that was never explicitly registered
    ///
    /// Tries each constructor candidate in declared order and returns the
    /// first fully-satisfiable one; an earlier candidate's failure never
    /// propagates past a later success. If every candidate fails, the error
    /// carries the last failure seen for diagnostics.
    pub fn resolve_unregistered<T: Constructible>(&self) -> Result<T, CoreError> {
        let candidates = T::constructors();
        let mut last_failure: Option<CoreError> = None;

        for (index, constructor) in candidates.iter().enumerate() {
            match constructor(self) {
                Ok(instance) => {
                    if index > 0 {
                        tracing::debug!(
                            target_type = std::any::type_name::<T>(),
                            candidate = index,
                            "fallback construction succeeded after earlier candidates failed"
                        );
                    }
                    return Ok(instance);
                }
                Err(error) => {
                    tracing::debug!(
                        target_type = std::any::type_name::<T>(),
                        candidate = index,
                        error = %error,
                        "constructor candidate failed"
                    );
                    last_failure = Some(error);
                }
            }
        }

        Err(CoreError::no_satisfiable_constructor(
            std::any::type_name::<T>(),
            candidates.len(),
            last_failure,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::builder::ContainerBuilder;
    use super::*;
    use std::sync::Arc;

    trait Logger: Send + Sync {
        fn tag(&self) -> &'static str;
    }

    struct StdoutLogger;
    impl Logger for StdoutLogger {
        fn tag(&self) -> &'static str {
            "stdout"
        }
    }

    trait Mailer: Send + Sync {}

    struct ReportController {
        logger: Arc<dyn Logger>,
        with_mailer: bool,
    }

    impl Constructible for ReportController {
        fn constructors() -> Vec<ConstructorFn<Self>> {
            vec![
                // Declared first: needs a mailer, which tests leave unregistered.
                |resolver| {
                    let _mailer = resolver.resolve_one::<dyn Mailer>()?;
                    Ok(ReportController {
                        logger: resolver.resolve_one::<dyn Logger>()?,
                        with_mailer: true,
                    })
                },
                |resolver| {
                    Ok(ReportController {
                        logger: resolver.resolve_one::<dyn Logger>()?,
                        with_mailer: false,
                    })
                },
            ]
        }
    }

    #[derive(Debug)]
    struct Orphan;

    impl Constructible for Orphan {
        fn constructors() -> Vec<ConstructorFn<Self>> {
            vec![|resolver| {
                let _logger = resolver.resolve_one::<dyn Logger>()?;
                Ok(Orphan)
            }]
        }
    }

    fn resolver_with_logger() -> Resolver {
        let mut builder = ContainerBuilder::new();
        builder.register_instance::<dyn Logger>(Arc::new(StdoutLogger));
        builder.build()
    }

    #[test]
    fn test_first_satisfiable_constructor_wins() {
        let resolver = resolver_with_logger();

        // First candidate needs an unregistered mailer; the second, declared
        // later, must be chosen and the earlier failure must not propagate.
        let controller = resolver.resolve_unregistered::<ReportController>().unwrap();
        assert!(!controller.with_mailer);
        assert_eq!(controller.logger.tag(), "stdout");
    }

    #[test]
    fn test_all_candidates_failing_reports_last_failure() {
        let resolver = ContainerBuilder::new().build();

        let error = resolver.resolve_unregistered::<Orphan>().unwrap_err();
        assert!(matches!(
            error,
            CoreError::NoSatisfiableConstructor { attempts: 1, .. }
        ));
        let last = error.last_constructor_failure().unwrap();
        assert!(last.is_service_not_found());
    }

    #[test]
    fn test_fallback_does_not_mutate_the_registration_table() {
        let resolver = resolver_with_logger();
        let before = resolver.registration_count();

        let _ = resolver.resolve_unregistered::<ReportController>().unwrap();

        assert_eq!(resolver.registration_count(), before);
        assert!(!resolver.contains::<ReportController>());
    }
}
