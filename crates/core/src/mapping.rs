//! Object-mapping configuration
//!
//! Mapping profiles contributed by modules fold into one process-wide
//! [`MappingConfig`], built once during service configuration and frozen.
//! Profiles apply in ascending order; a later profile overrides an earlier
//! one for the same source/destination pair.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::errors::CoreError;

type ErasedConvert = Box<dyn Fn(&dyn Any) -> Option<Box<dyn Any>> + Send + Sync>;

struct MapEntry {
    source_type: &'static str,
    dest_type: &'static str,
    convert: ErasedConvert,
}

/// Mutable accumulation of type conversions, confined to bootstrap
#[derive(Default)]
pub struct MappingBuilder {
    maps: HashMap<(TypeId, TypeId), MapEntry>,
}

impl MappingBuilder {
    /// Create a new mapping builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversion from `S` to `D`
    ///
    /// A conversion registered later for the same pair replaces the
    /// earlier one.
    pub fn create_map<S, D, F>(&mut self, convert: F) -> &mut Self
    where
        S: 'static,
        D: 'static,
        F: Fn(&S) -> D + Send + Sync + 'static,
    {
        let erased: ErasedConvert = Box::new(move |source| {
            source
                .downcast_ref::<S>()
                .map(|source| Box::new(convert(source)) as Box<dyn Any>)
        });
        self.maps.insert(
            (TypeId::of::<S>(), TypeId::of::<D>()),
            MapEntry {
                source_type: std::any::type_name::<S>(),
                dest_type: std::any::type_name::<D>(),
                convert: erased,
            },
        );
        self
    }

    /// Number of registered conversions
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Check whether no conversions are registered
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Freeze the accumulated conversions into an immutable configuration
    pub fn freeze(self) -> MappingConfig {
        MappingConfig { maps: self.maps }
    }
}

impl std::fmt::Debug for MappingBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingBuilder")
            .field("conversions", &self.maps.len())
            .finish()
    }
}

/// The frozen, process-wide mapping configuration
pub struct MappingConfig {
    maps: HashMap<(TypeId, TypeId), MapEntry>,
}

impl MappingConfig {
    /// Convert a source value into its mapped destination type
    pub fn map<S: 'static, D: 'static>(&self, source: &S) -> Result<D, CoreError> {
        let Some(entry) = self.maps.get(&(TypeId::of::<S>(), TypeId::of::<D>())) else {
            return Err(CoreError::mapping_not_found(
                std::any::type_name::<S>(),
                std::any::type_name::<D>(),
            ));
        };

        let converted = (entry.convert)(source).ok_or_else(|| {
            CoreError::invalid_registration(format!(
                "mapping from '{}' received a mismatched source value",
                entry.source_type
            ))
        })?;
        converted.downcast::<D>().map(|dest| *dest).map_err(|_| {
            CoreError::invalid_registration(format!(
                "mapping to '{}' produced a mismatched value",
                entry.dest_type
            ))
        })
    }

    /// Check whether a conversion exists for the pair
    pub fn supports<S: 'static, D: 'static>(&self) -> bool {
        self.maps
            .contains_key(&(TypeId::of::<S>(), TypeId::of::<D>()))
    }

    /// Number of registered conversions
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Check whether no conversions are registered
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl std::fmt::Debug for MappingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingConfig")
            .field("conversions", &self.maps.len())
            .finish()
    }
}
