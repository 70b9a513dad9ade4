//! Read/write façade binding the codec to one entity.

use crate::engine::{Engine, EngineResult, RawValue};
use crate::error::{translate, Entity, Error, PropertyIssue, Result};
use crate::property::{
    codec::{self, PropertyDescriptor},
    Entry, Snapshot, Value,
};
use tracing::{debug, instrument};

/// An entity whose properties can be read through the engine.
pub trait PropertySource {
    fn entity(&self) -> Entity;

    fn engine(&self) -> &dyn Engine;

    /// Property names in discovery order.
    fn names(&self) -> &[String];

    /// Normalizes a user supplied name.
    fn canonical(&self, name: &str) -> String {
        name.trim().to_string()
    }

    /// Static descriptor for `name`, if the codec knows it.
    fn descriptor(&self, name: &str) -> Option<PropertyDescriptor>;

    /// # Errors
    /// Returns the engine fault unchanged.
    fn read_raw(&self, name: &str) -> EngineResult<RawValue>;
}

/// An entity whose properties can also be written.
pub trait PropertySink: PropertySource {
    /// # Errors
    /// Returns the engine fault unchanged.
    fn write_raw(&mut self, name: &str, value: i64) -> EngineResult<()>;
}

#[derive(Debug)]
pub struct PropertyAccessor<S> {
    source: S,
}

impl<S: PropertySource> PropertyAccessor<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn names(&self) -> &[String] {
        self.source.names()
    }

    /// Reads and decodes one property. `Ok(None)` means "not applicable".
    ///
    /// # Errors
    /// * [`Error::InvalidProperty`] for unknown or write-only names.
    /// * [`Error::InvalidValue`] if the engine value does not decode.
    /// * [`Error::Engine`] for any other engine failure.
    #[instrument(level = "trace", skip(self, name), fields(entity = %self.source.entity()))]
    pub fn get(&self, name: impl AsRef<str>) -> Result<Option<Value>> {
        let name = self.source.canonical(name.as_ref());
        let descriptor = self.source.descriptor(&name).unwrap_or(codec::OPAQUE);

        if !descriptor.access.readable() {
            return Err(Error::InvalidProperty {
                entity: self.source.entity(),
                name,
                issue: PropertyIssue::WriteOnly,
            });
        }

        let raw = self
            .source
            .read_raw(&name)
            .map_err(|fault| translate(self.source.engine(), self.source.entity(), fault))?;

        codec::decode(&name, &descriptor, raw)
    }

    /// Reads every property. Failures are kept inline so one bad property
    /// does not hide the others.
    #[must_use]
    pub fn all(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for name in self.source.names() {
            let entry = match self.get(name) {
                Ok(value) => Entry::Value(value),
                Err(err) => {
                    debug!(property = %name, error = %err, "property not readable");
                    Entry::Error(err.to_string())
                }
            };
            snapshot.push(name.clone(), entry);
        }
        snapshot
    }
}

impl<S: PropertySink> PropertyAccessor<S> {
    /// Validates and writes one property. Nothing reaches the engine if
    /// validation fails.
    ///
    /// # Errors
    /// * [`Error::InvalidProperty`] for unknown or read-only names.
    /// * [`Error::OutOfBounds`] / [`Error::InvalidWrite`] for rejected values.
    /// * [`Error::Engine`] if the engine refuses the write.
    #[instrument(level = "debug", skip(self, name, value), fields(entity = %self.source.entity()))]
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<Value>) -> Result<()> {
        let name = self.source.canonical(name.as_ref());
        let value = value.into();
        let entity = self.source.entity();

        let descriptor = match self.source.descriptor(&name) {
            Some(descriptor) => descriptor,
            None if self.source.names().contains(&name) => codec::OPAQUE,
            None => {
                return Err(Error::InvalidProperty {
                    entity,
                    name,
                    issue: PropertyIssue::Unknown,
                })
            }
        };

        let raw = codec::encode(entity, &name, &descriptor, &value)?;

        debug!(property = %name, %value, raw, "writing property");

        let written = self.source.write_raw(&name, raw);
        written.map_err(|fault| translate(self.source.engine(), entity, fault))
    }
}
