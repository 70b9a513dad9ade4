//! Process-wide engine parameters.
//!
//! The parameter block lives inside the engine and is consulted on every
//! token operation. Reads go straight to the engine; writes are serialized by
//! a single lock because the engine gives no guarantee for concurrent
//! mutation.

use crate::engine::{status, Engine, EngineFault, EngineResult, LibraryVersion, RawValue};
use crate::error::{translate, Entity, Error, Result};
use crate::property::{
    codec::{self, PropertyDescriptor},
    PropertyAccessor, PropertySink, PropertySource, Snapshot,
};
use std::{
    fmt,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};
use tracing::{info, instrument};

/// Identification error threshold: failed verifications before lockout.
pub const LOCKOUT_THRESHOLD: &str = "IThreshold";

#[derive(Debug)]
pub struct Kernel {
    engine: Arc<dyn Engine>,
    writes: Mutex<()>,
    names: OnceLock<Vec<String>>,
}

impl Kernel {
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            writes: Mutex::new(()),
            names: OnceLock::new(),
        }
    }

    /// Engine version, bitness and build type.
    ///
    /// # Errors
    /// Returns [`Error::Engine`] if the engine cannot report it.
    pub fn version(&self) -> Result<LibraryVersion> {
        self.engine
            .library_version()
            .map_err(|fault| translate(self.engine.as_ref(), Entity::Kernel, fault))
    }

    /// Parameter names, fetched from the engine once.
    pub fn property_names(&self) -> &[String] {
        self.names
            .get_or_init(|| self.engine.kernel_property_names())
    }

    /// Property-style access to the parameters.
    #[must_use]
    pub fn params(&self) -> PropertyAccessor<KernelParams<'_>> {
        PropertyAccessor::new(KernelParams { kernel: self })
    }

    /// # Errors
    /// Returns [`Error::InvalidProperty`] for unknown parameters.
    pub fn get(&self, name: &str) -> Result<i64> {
        self.params()
            .get(name)?
            .and_then(|value| value.as_int())
            .ok_or_else(|| Error::InvalidValue {
                name: name.to_string(),
                raw: String::new(),
            })
    }

    /// # Errors
    /// Returns [`Error::InvalidProperty`] for unknown parameters and
    /// [`Error::OutOfBounds`] for values outside the int32 range.
    pub fn set(&self, name: &str, value: i64) -> Result<()> {
        self.params().set(name, value)
    }

    /// Every parameter, in engine order.
    #[must_use]
    pub fn all(&self) -> Snapshot {
        self.params().all()
    }

    /// Applies configured overrides in order, stopping at the first failure.
    ///
    /// # Errors
    /// Returns the first error raised by [`Kernel::set`].
    #[instrument(skip(self, overrides))]
    pub fn apply<'a, I>(&self, overrides: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        for (name, value) in overrides {
            self.set(name, value)?;
            info!(param = name, value, "kernel parameter set");
        }
        Ok(())
    }

    /// Failed verifications after which the engine locks a token.
    ///
    /// # Errors
    /// Returns an error if the engine has no such parameter.
    pub fn lockout_threshold(&self) -> Result<i64> {
        self.get(LOCKOUT_THRESHOLD)
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version() {
            Ok(version) => write!(
                f,
                "#<Kernel version={:?} bitness={:?} type={:?} parameters={}>",
                version.version,
                version.bitness,
                version.kind,
                self.all()
            ),
            Err(err) => write!(f, "#<Kernel version=ERROR: {err} parameters={}>", self.all()),
        }
    }
}

/// [`PropertySource`] view of a [`Kernel`].
#[derive(Debug, Clone, Copy)]
pub struct KernelParams<'a> {
    kernel: &'a Kernel,
}

impl PropertySource for KernelParams<'_> {
    fn entity(&self) -> Entity {
        Entity::Kernel
    }

    fn engine(&self) -> &dyn Engine {
        self.kernel.engine.as_ref()
    }

    fn names(&self) -> &[String] {
        self.kernel.property_names()
    }

    fn descriptor(&self, _name: &str) -> Option<PropertyDescriptor> {
        Some(codec::KERNEL_PARAM)
    }

    fn read_raw(&self, name: &str) -> EngineResult<RawValue> {
        self.kernel
            .engine
            .get_kernel_param(name)
            .map(|value| RawValue::Int(i64::from(value)))
    }
}

impl PropertySink for KernelParams<'_> {
    fn write_raw(&mut self, name: &str, value: i64) -> EngineResult<()> {
        let value = i32::try_from(value).map_err(|_| EngineFault::Status {
            method: "SetKernelParam",
            code: status::INVALID_VALUE,
        })?;
        let _guard = self
            .kernel
            .writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.kernel.engine.set_kernel_param(name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::MemoryEngine;
    use crate::property::{Entry, Value};
    use std::thread;

    fn kernel() -> Kernel {
        Kernel::new(Arc::new(MemoryEngine::new()))
    }

    #[test]
    fn version_has_the_three_fields() {
        let version = kernel().version().unwrap();
        assert!(!version.version.is_empty());
        assert!(version.bitness.chars().all(|c| c.is_ascii_digit()));
        assert!(!version.kind.is_empty());
    }

    #[test]
    fn property_names_include_window_and_diagnostics() {
        let kernel = kernel();
        let names = kernel.property_names();
        assert!(names.iter().any(|n| n == "ITimeWindow"));
        assert!(names.iter().any(|n| n == "DiagLevel"));
    }

    #[test]
    fn defaults() {
        let kernel = kernel();
        assert_eq!(kernel.get("DiagLevel").unwrap(), 0);
        assert_eq!(kernel.get("ITimeWindow").unwrap(), 30);
        assert_eq!(kernel.lockout_threshold().unwrap(), 3);
    }

    #[test]
    fn bogus_names_fail_on_read_and_write() {
        let kernel = kernel();
        let err = kernel.get("Foo").unwrap_err();
        assert!(err.to_string().contains("invalid kernel param Foo"));

        let err = kernel.set("Foo", 60).unwrap_err();
        assert!(err.to_string().contains("invalid kernel param Foo"));
    }

    #[test]
    fn set_changes_the_engine_value() {
        let kernel = kernel();
        kernel.set("ITimeWindow", 60).unwrap();
        assert_eq!(kernel.get("ITimeWindow").unwrap(), 60);
    }

    #[test]
    fn out_of_range_values_never_reach_the_engine() {
        let kernel = kernel();
        let err = kernel.set("ITimeWindow", i64::from(i32::MAX) + 1).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { .. }));
        assert_eq!(kernel.get("ITimeWindow").unwrap(), 30);
    }

    #[test]
    fn all_follows_engine_order() {
        let kernel = kernel();
        let all = kernel.all();
        let names: Vec<&str> = all.names().collect();
        let expected: Vec<&str> = kernel.property_names().iter().map(String::as_str).collect();
        assert_eq!(names, expected);
        assert!(all.iter().all(|(_, entry)| !entry.is_error()));
        assert_eq!(all.get("IThreshold"), Some(&Entry::Value(Some(Value::Int(3)))));
    }

    #[test]
    fn apply_stops_at_first_failure() {
        let kernel = kernel();
        let err = kernel
            .apply([("DiagLevel", 2), ("Bogus", 1), ("EventWindow", 5)])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidProperty { .. }));
        assert_eq!(kernel.get("DiagLevel").unwrap(), 2);
        assert_eq!(kernel.get("EventWindow").unwrap(), 100);
    }

    #[test]
    fn display_lists_version_and_parameters() {
        let rendered = kernel().to_string();
        let pattern =
            regex::Regex::new(r#"version="[0-9.]+?" bitness="[0-9]+?" type=".+?" parameters=\{.+?\}"#)
                .unwrap();
        assert!(pattern.is_match(&rendered), "{rendered}");
    }

    #[test]
    fn concurrent_writes_are_serialized() {
        let kernel = Arc::new(kernel());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let kernel = Arc::clone(&kernel);
                thread::spawn(move || kernel.set("DiagLevel", i).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!((0..8).contains(&kernel.get("DiagLevel").unwrap()));
    }

    #[test]
    fn raw_writes_outside_int32_are_refused() {
        let kernel = kernel();
        let mut params = KernelParams { kernel: &kernel };
        let fault = params
            .write_raw("DiagLevel", i64::from(i32::MAX) + 1)
            .unwrap_err();
        assert_eq!(
            fault,
            EngineFault::Status {
                method: "SetKernelParam",
                code: status::INVALID_VALUE,
            }
        );
        assert_eq!(kernel.get("DiagLevel").unwrap(), 0);
    }
}
