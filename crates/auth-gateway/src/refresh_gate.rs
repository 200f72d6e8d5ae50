//! Single-flight gate around the token refresh exchange.
//!
//! ## State Diagram
//!
//! ```text
//! ┌──────────┐   Begin    ┌──────────────┐
//! │   Idle   │ ─────────► │  Refreshing  │
//! └──────────┘            └──────┬───────┘
//!      ▲                         │ Succeeded / Failed
//!      └─────────────────────────┘
//! ```
//!
//! `Begin` is only accepted from `Idle`, so exactly one caller at a time holds
//! a [`RefreshTicket`]. A caller that finds the gate busy does not wait for
//! the in-flight refresh; it gets `None` and surfaces its own failure.

use parking_lot::Mutex;
use rust_fsm::*;
use tracing::debug;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub refresh_gate_machine(Idle)

    Idle => {
        Begin => Refreshing
    },
    Refreshing => {
        Succeeded => Idle,
        Failed => Idle
    }
}

use refresh_gate_machine::Input as GateInput;
use refresh_gate_machine::State as GateMachineState;
use refresh_gate_machine::StateMachine as GateMachine;

/// Externally visible gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Refreshing,
}

impl From<&GateMachineState> for GateState {
    fn from(state: &GateMachineState) -> Self {
        match state {
            GateMachineState::Idle => GateState::Idle,
            GateMachineState::Refreshing => GateState::Refreshing,
        }
    }
}

/// Process-wide refresh gate. One instance is shared by every request.
pub struct RefreshGate {
    machine: Mutex<GateMachine>,
}

impl Default for RefreshGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshGate {
    pub fn new() -> Self {
        Self {
            machine: Mutex::new(GateMachine::new()),
        }
    }

    pub fn state(&self) -> GateState {
        GateState::from(self.machine.lock().state())
    }

    pub fn is_refreshing(&self) -> bool {
        self.state() == GateState::Refreshing
    }

    /// Claim the gate. Returns `None` if a refresh is already underway.
    pub fn try_begin(&self) -> Option<RefreshTicket<'_>> {
        let mut machine = self.machine.lock();
        match machine.consume(&GateInput::Begin) {
            Ok(_) => Some(RefreshTicket {
                gate: self,
                settled: false,
            }),
            Err(_) => {
                debug!("Refresh already in flight");
                None
            }
        }
    }

    fn settle(&self, input: &GateInput) {
        let mut machine = self.machine.lock();
        if machine.consume(input).is_err() {
            debug!(input = ?input, state = ?machine.state(), "Refresh gate already idle");
        }
    }
}

/// Proof of holding the refresh gate.
///
/// The gate returns to idle when the ticket is settled or dropped, so a
/// cancelled refresh future never leaves the gate stuck.
#[must_use = "dropping the ticket immediately releases the refresh gate"]
pub struct RefreshTicket<'a> {
    gate: &'a RefreshGate,
    settled: bool,
}

impl RefreshTicket<'_> {
    pub fn succeeded(mut self) {
        self.settle(GateInput::Succeeded);
    }

    pub fn failed(mut self) {
        self.settle(GateInput::Failed);
    }

    fn settle(&mut self, input: GateInput) {
        if !self.settled {
            self.settled = true;
            self.gate.settle(&input);
        }
    }
}

impl Drop for RefreshTicket<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("Refresh abandoned before completion");
            self.settle(GateInput::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle() {
        let gate = RefreshGate::new();
        assert_eq!(gate.state(), GateState::Idle);
        assert!(!gate.is_refreshing());
    }

    #[test]
    fn test_second_claim_is_refused_while_refreshing() {
        let gate = RefreshGate::new();

        let ticket = gate.try_begin().expect("first claim succeeds");
        assert!(gate.is_refreshing());
        assert!(gate.try_begin().is_none());

        ticket.succeeded();
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn test_failed_refresh_releases_gate() {
        let gate = RefreshGate::new();

        gate.try_begin().unwrap().failed();
        assert!(!gate.is_refreshing());
        assert!(gate.try_begin().is_some());
    }

    #[test]
    fn test_dropped_ticket_releases_gate() {
        let gate = RefreshGate::new();

        {
            let _ticket = gate.try_begin().unwrap();
            assert!(gate.is_refreshing());
        }

        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn test_machine_rejects_settle_from_idle() {
        let mut machine = GateMachine::new();
        assert!(machine.consume(&GateInput::Succeeded).is_err());
        assert_eq!(*machine.state(), GateMachineState::Idle);
    }
}
