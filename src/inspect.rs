//! Element inspection and ordering of concurrent inspect requests.

use std::sync::Arc;
use tracing::debug;

use crate::engine::ParsingEngine;
use crate::error::ViewerError;
use crate::index::LineIndex;
use crate::model::{ElementProperties, ElementRef};

/// Full property set of `element`.
///
/// The element must be present in `index`, which must belong to the same
/// model.
pub async fn inspect<E: ParsingEngine + ?Sized>(
    engine: &E,
    index: &LineIndex,
    element: ElementRef,
) -> Result<ElementProperties, ViewerError> {
    if index.handle() != element.model || !index.contains(element.id) {
        return Err(ViewerError::ElementNotFound { element });
    }
    let properties = engine.get_properties(element).await?;
    debug!(%element, sets = properties.property_sets.len(), "inspected element");
    Ok(properties)
}

/// Position of a request in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Hands out tickets and decides which results are still wanted.
///
/// Only the most recently issued ticket is accepted, so a slow result for
/// an earlier click can never overwrite a later one.
#[derive(Debug, Default)]
pub struct InspectGate {
    issued: u64,
    pending: Option<Ticket>,
}

impl InspectGate {
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.pending = Some(ticket);
        ticket
    }

    /// Makes every outstanding ticket stale.
    pub fn invalidate(&mut self) {
        self.pending = None;
    }

    /// Whether a result for `ticket` should be shown. A ticket is accepted at
    /// most once.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        if self.pending != Some(ticket) {
            return false;
        }
        self.pending = None;
        true
    }

    /// Whether the latest ticket is still waiting for its result.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// A detached inspect call that can run on any executor.
#[derive(Debug)]
pub struct InspectRequest<E: ?Sized> {
    pub ticket: Ticket,
    pub element: ElementRef,
    engine: Arc<E>,
    index: Arc<LineIndex>,
}

#[derive(Debug)]
pub struct InspectOutcome {
    pub ticket: Ticket,
    pub element: ElementRef,
    pub result: Result<ElementProperties, ViewerError>,
}

impl<E: ParsingEngine + ?Sized> InspectRequest<E> {
    #[must_use]
    pub fn new(ticket: Ticket, element: ElementRef, engine: Arc<E>, index: Arc<LineIndex>) -> Self {
        Self {
            ticket,
            element,
            engine,
            index,
        }
    }

    pub async fn run(self) -> InspectOutcome {
        let result = inspect(self.engine.as_ref(), &self.index, self.element).await;
        InspectOutcome {
            ticket: self.ticket,
            element: self.element,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use crate::model::{ExpressId, ModelHandle};
    use crate::testing::FakeEngine;
    use pretty_assertions::assert_eq;

    #[test]
    fn only_the_last_issued_ticket_is_accepted() {
        let mut gate = InspectGate::default();
        let first = gate.issue();
        let second = gate.issue();

        assert!(gate.is_pending());
        assert!(!gate.accept(first));
        assert!(gate.accept(second));
        assert!(!gate.accept(second));
        assert!(!gate.is_pending());
    }

    #[test]
    fn invalidate_discards_outstanding_tickets() {
        let mut gate = InspectGate::default();
        let ticket = gate.issue();
        gate.invalidate();
        assert!(!gate.is_pending());
        assert!(!gate.accept(ticket));

        let next = gate.issue();
        assert!(gate.is_pending());
        assert!(gate.accept(next));
        assert!(!gate.is_pending());
    }

    #[tokio::test]
    async fn inspect_checks_the_index() {
        let engine = FakeEngine::with_lines(&[(42, "IFCWALL")]);
        let handle = engine.open(b"x").unwrap();
        let index = build_index(&engine, handle).unwrap();

        let wall = ElementRef::new(handle, ExpressId(42));
        let props = inspect(&engine, &index, wall).await.unwrap();
        assert_eq!(props.type_tag, "IFCWALL");

        let missing = ElementRef::new(handle, ExpressId(5));
        assert!(matches!(
            inspect(&engine, &index, missing).await,
            Err(ViewerError::ElementNotFound { element }) if element == missing
        ));

        let other_model = ElementRef::new(ModelHandle(handle.0 + 1), ExpressId(42));
        assert!(inspect(&engine, &index, other_model).await.is_err());
    }

    #[tokio::test]
    async fn requests_run_on_spawned_tasks() {
        let engine = Arc::new(FakeEngine::with_lines(&[(7, "IFCDOOR")]));
        let handle = engine.open(b"x").unwrap();
        let index = Arc::new(build_index(engine.as_ref(), handle).unwrap());

        let mut gate = InspectGate::default();
        let element = ElementRef::new(handle, ExpressId(7));
        let request = InspectRequest::new(gate.issue(), element, engine, index);

        let outcome = tokio::spawn(request.run()).await.unwrap();
        assert!(gate.accept(outcome.ticket));
        assert_eq!(outcome.result.unwrap().type_tag, "IFCDOOR");
    }
}
