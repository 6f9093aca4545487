//! Suppression gates - per-track, per-event-kind echo filters
//!
//! Every mirrored action (seek, play, pause, rate change) performed on a
//! track makes that track fire the very native event the group listens to.
//! Left alone, the echo would be propagated again and the tracks would
//! bounce the action between each other forever.
//!
//! The caller contract is a bracket around every mirrored action:
//!
//! ```text
//! gate.suppress()   ──► perform action ──► (echo observed, not relayed)
//!                                       ──► timer ──► gate.enable()
//! ```
//!
//! Brackets may overlap. A gate stays closed until every `suppress` has been
//! matched by an `enable`; surplus `enable` calls on an open gate are no-ops,
//! so a stale re-enable timer can never close or corrupt a gate.

use crate::types::EventKind;

/// State of one gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    /// Native events of this kind are relayed
    #[default]
    Open,
    /// Native events of this kind are swallowed; `depth` open brackets
    Suppressed { depth: u32 },
}

/// A single suppression gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuppressionGate {
    state: GateState,
}

impl SuppressionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == GateState::Open
    }

    /// Open a bracket: close the gate (or deepen an existing closure)
    pub fn suppress(&mut self) {
        self.state = match self.state {
            GateState::Open => GateState::Suppressed { depth: 1 },
            GateState::Suppressed { depth } => GateState::Suppressed {
                depth: depth.saturating_add(1),
            },
        };
    }

    /// Close a bracket; the gate opens once no bracket remains
    pub fn enable(&mut self) {
        self.state = match self.state {
            GateState::Open => GateState::Open,
            GateState::Suppressed { depth } if depth <= 1 => GateState::Open,
            GateState::Suppressed { depth } => GateState::Suppressed { depth: depth - 1 },
        };
    }

    /// Force the gate open regardless of outstanding brackets
    pub fn reset(&mut self) {
        self.state = GateState::Open;
    }
}

/// One gate per [`EventKind`] for a single track
#[derive(Debug, Clone, Default)]
pub struct EventGates {
    gates: [SuppressionGate; EventKind::COUNT],
}

impl EventGates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suppress(&mut self, kind: EventKind) {
        self.gates[kind.index()].suppress();
    }

    pub fn enable(&mut self, kind: EventKind) {
        self.gates[kind.index()].enable();
    }

    pub fn is_open(&self, kind: EventKind) -> bool {
        self.gates[kind.index()].is_open()
    }

    pub fn state(&self, kind: EventKind) -> GateState {
        self.gates[kind.index()].state()
    }

    /// Open every gate (used on teardown)
    pub fn reset_all(&mut self) {
        self.gates.iter_mut().for_each(SuppressionGate::reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_opens_again() {
        let mut gate = SuppressionGate::new();
        assert!(gate.is_open());

        gate.suppress();
        assert_eq!(gate.state(), GateState::Suppressed { depth: 1 });

        gate.enable();
        assert!(gate.is_open());
    }

    #[test]
    fn test_overlapping_brackets() {
        let mut gate = SuppressionGate::new();
        gate.suppress();
        gate.suppress();

        // First re-enable must not open while the second bracket is pending
        gate.enable();
        assert!(!gate.is_open());

        gate.enable();
        assert!(gate.is_open());
    }

    #[test]
    fn test_stale_enable_is_noop() {
        let mut gate = SuppressionGate::new();
        gate.enable();
        gate.enable();
        assert!(gate.is_open());

        // A later bracket still closes the gate
        gate.suppress();
        assert!(!gate.is_open());
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut gates = EventGates::new();
        gates.suppress(EventKind::Seeking);

        assert!(!gates.is_open(EventKind::Seeking));
        for kind in [EventKind::Play, EventKind::Pause, EventKind::RateChange, EventKind::Waiting] {
            assert!(gates.is_open(kind), "{} should stay open", kind);
        }

        gates.reset_all();
        assert!(gates.is_open(EventKind::Seeking));
    }
}
