//! Error helpers shared by the command-line tools of the workspace.
//!
//! - [`GenericError`]: a `snafu` "whatever" error carrying a message, an
//!   optional boxed source, and the location it was created at.
//! - [`Report`]: renders an error together with its chain of sources.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

use alloc::{boxed::Box, string::String};
use core::{error::Error, fmt};

use snafu::{GenerateImplicitData, Snafu};

/// Source location captured when an error is created.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location(&'static core::panic::Location<'static>);

impl Default for Location {
    #[track_caller]
    fn default() -> Self {
        Self(core::panic::Location::caller())
    }
}

impl GenerateImplicitData for Location {
    #[track_caller]
    fn generate() -> Self {
        Self::default()
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Snafu)]
#[snafu(whatever, display("{message}"))]
pub struct GenericError {
    message: String,
    #[snafu(implicit)]
    location: Location,
    #[snafu(source(from(Box<dyn Error>, Some)))]
    source: Option<Box<dyn Error>>,
}

impl GenericError {
    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }
}

/// Multi-line report of an error and the errors that caused it.
///
/// Locations are printed for every [`GenericError`] in the chain.
///
/// ```text
/// Error: failed to allocate 4096 bytes
///   at crates/slot-arena/examples/arena_trace.rs:98:22
///
/// Caused by:
///    0: out of arena memory: requested=4096, ...
/// ```
pub struct Report<E> {
    error: E,
}

impl<E> fmt::Debug for Report<E>
where
    E: Error + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<E> fmt::Display for Report<E>
where
    E: Error + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error: {}", self.error)?;
        if let Some(loc) = location_of(&self.error) {
            writeln!(f, "  at {loc}")?;
        }
        let mut source = self.error.source();
        if source.is_some() {
            writeln!(f)?;
            writeln!(f, "Caused by:")?;
        }
        let mut index = 0;
        while let Some(s) = source {
            writeln!(f, "{index:4}: {s}")?;
            if let Some(loc) = location_of(s) {
                writeln!(f, "      at {loc}")?;
            }
            source = s.source();
            index += 1;
        }
        Ok(())
    }
}

impl<E> Report<E> {
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

fn location_of(error: &(dyn Error + 'static)) -> Option<Location> {
    error
        .downcast_ref::<GenericError>()
        .map(GenericError::location)
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use alloc::{format, string::ToString as _};

    use snafu::{ResultExt as _, whatever};

    use super::*;

    #[derive(Debug, Snafu)]
    enum TestError {
        #[snafu(display("slot table exhausted"))]
        Exhausted,
    }

    fn fails() -> Result<(), GenericError> {
        Err(TestError::Exhausted).whatever_context("failed to grow buffer")
    }

    fn bad_config() -> Result<(), GenericError> {
        whatever!("bad slot size {}", 0)
    }

    #[test]
    fn report_lists_sources() {
        let report = Report::new(fails().unwrap_err()).to_string();
        let mut lines = report.lines();
        assert_eq!(lines.next(), Some("Error: failed to grow buffer"));
        assert!(lines.next().unwrap().starts_with("  at "));
        assert_eq!(lines.next(), Some(""));
        assert_eq!(lines.next(), Some("Caused by:"));
        assert_eq!(lines.next(), Some("   0: slot table exhausted"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn report_without_source() {
        let report = format!("{:?}", Report::new(bad_config().unwrap_err()));
        assert!(report.starts_with("Error: bad slot size 0\n  at "));
        assert!(!report.contains("Caused by:"));
    }
}
