//! Failure container: a supervisor node around a render subtree.
//!
//! State machine: `Clean` --fault--> `Faulted` (terminal until [`Boundary::reset`]).
//! Each transition into `Faulted` is reported to [`Diagnostics`] exactly once.
//! The container does not protect its own fallback: a fault there escapes to
//! the next outer container.

use super::{guarded, render_guarded, retry_panel, Component, Fault, Html};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::error;
use ulid::Ulid;

/// Sink for contained faults (logs, telemetry).
pub trait Diagnostics: Send + Sync {
    fn report(&self, fault: &Fault);
}

/// Reports faults as `tracing` error events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, fault: &Fault) {
        error!(
            origin = %fault.origin,
            boundary = fault.boundary.as_deref().unwrap_or("none"),
            digest = fault.digest.as_deref().unwrap_or("none"),
            "render fault: {}",
            fault.message
        );
    }
}

/// Keeps every reported fault, and forwards to `tracing`.
#[derive(Debug, Default)]
pub struct DiagnosticsLog {
    faults: Mutex<Vec<Fault>>,
}

impl DiagnosticsLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn faults(&self) -> Vec<Fault> {
        self.faults.lock().clone()
    }

    /// Reports that name `name`, either as origin or as the catching container.
    #[must_use]
    pub fn count_for(&self, name: &str) -> usize {
        self.faults
            .lock()
            .iter()
            .filter(|fault| fault.origin == name || fault.boundary.as_deref() == Some(name))
            .count()
    }
}

impl Diagnostics for DiagnosticsLog {
    fn report(&self, fault: &Fault) {
        TracingDiagnostics.report(fault);
        self.faults.lock().push(fault.clone());
    }
}

/// Presentation shown in place of a faulted subtree.
pub trait Fallback: Send + Sync {
    /// # Errors
    /// A fault here escapes the enclosing container.
    fn render(&self, fault: &Fault) -> Result<Html, Fault>;
}

impl<F> Fallback for F
where
    F: Fn(&Fault) -> Result<Html, Fault> + Send + Sync,
{
    fn render(&self, fault: &Fault) -> Result<Html, Fault> {
        self(fault)
    }
}

/// Neutral "something went wrong" panel.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFallback;

impl Fallback for DefaultFallback {
    fn render(&self, fault: &Fault) -> Result<Html, Fault> {
        Ok(retry_panel(
            "fallback",
            "Something went wrong",
            "This part of the page could not be displayed. Please try again later.",
            fault.digest.as_deref(),
        ))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundaryState {
    Clean,
    Faulted(Fault),
}

pub struct Boundary<'f, C> {
    child: C,
    fallback: Box<dyn Fallback + 'f>,
    diagnostics: Arc<dyn Diagnostics>,
    state: Mutex<BoundaryState>,
}

impl<'f, C: Component> Boundary<'f, C> {
    pub fn new(child: C, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            child,
            fallback: Box::new(DefaultFallback),
            diagnostics,
            state: Mutex::new(BoundaryState::Clean),
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: impl Fallback + 'f) -> Self {
        self.fallback = Box::new(fallback);
        self
    }

    #[must_use]
    pub fn state(&self) -> BoundaryState {
        self.state.lock().clone()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(*self.state.lock(), BoundaryState::Clean)
    }

    /// Back to `Clean`; the next render re-attempts the original subtree.
    pub fn reset(&self) {
        *self.state.lock() = BoundaryState::Clean;
    }

    /// Render the child, or the fallback once the child has faulted.
    ///
    /// # Errors
    /// Returns a fault only when the fallback itself fails.
    pub fn render(&self) -> Result<Html, Fault> {
        let current = self.state();
        let fault = match current {
            BoundaryState::Faulted(fault) => fault,
            BoundaryState::Clean => match render_guarded(&self.child) {
                Ok(html) => return Ok(html),
                Err(fault) => self.trip(fault),
            },
        };

        guarded(self.child.name(), || self.fallback.render(&fault))
    }

    fn trip(&self, mut fault: Fault) -> Fault {
        if fault.origin.is_empty() {
            fault.origin = self.child.name().to_string();
        }
        fault.boundary = Some(self.child.name().to_string());
        if fault.digest.is_none() {
            fault.digest = Some(Ulid::new().to_string());
        }
        self.diagnostics.report(&fault);
        *self.state.lock() = BoundaryState::Faulted(fault.clone());
        fault
    }
}

impl<C: Component> Component for Boundary<'_, C> {
    fn name(&self) -> &str {
        self.child.name()
    }

    fn render(&self) -> Result<Html, Fault> {
        Boundary::render(self)
    }
}
