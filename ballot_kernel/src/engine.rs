/// Ballot kernel v1: Engine
///
/// Top-level orchestrator. Delegates mutation to transitions,
/// validates via invariants.
///
/// Strict sequence enforcement, initialize-first validation.

use tracing::{debug, info, warn};

use crate::domain::{BallotState, TransitionResult, VoteCast};
use crate::error::EngineError;
use crate::events::{CommandEnvelope, INITIALIZE, SCHEMA_VERSION};
use crate::invariants::{validate_invariants, validate_transition};
use crate::transitions::{apply_command as transition_apply, initial_state};

/// Stateful engine wrapping the pure transition layer.
#[derive(Debug, Clone, Default)]
pub struct BallotEngine {
    state: Option<BallotState>,
    last_sequence: u64,
    notifications: Vec<VoteCast>,
}

impl BallotEngine {
    /// Create a new, uninitialized engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current ballot, once `initialize` has been applied.
    pub fn state(&self) -> Result<&BallotState, EngineError> {
        self.state.as_ref().ok_or(EngineError::Uninitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Every VoteCast emitted since creation (or the last take), in call order.
    pub fn notifications(&self) -> &[VoteCast] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<VoteCast> {
        std::mem::take(&mut self.notifications)
    }

    /// Apply a single command:
    ///   1. Validate schema version (must be 1)
    ///   2. Validate sequence (strictly increasing, no gaps)
    ///   3. `initialize` first, and only first
    ///   4. Delegate to transitions on a clone
    ///   5. Validate state and transition invariants
    ///   6. Store and return
    ///
    /// A rejected command leaves state, sequence and notifications untouched.
    pub fn apply_command(&mut self, command: &CommandEnvelope) -> Result<TransitionResult, EngineError> {
        match self.try_apply(command) {
            Ok(result) => {
                info!(
                    sequence = command.sequence,
                    command = %command.command_type,
                    caller = %command.caller,
                    "command applied"
                );
                for n in &result.notifications {
                    info!(candidate_id = n.candidate_id, "VoteCast");
                }
                self.notifications.extend_from_slice(&result.notifications);
                Ok(result)
            }
            Err(err) => {
                warn!(
                    sequence = command.sequence,
                    command = %command.command_type,
                    caller = %command.caller,
                    error = %err,
                    "command rejected"
                );
                Err(err)
            }
        }
    }

    fn try_apply(&mut self, command: &CommandEnvelope) -> Result<TransitionResult, EngineError> {
        // -- Schema version enforcement --
        if command.schema_version != SCHEMA_VERSION {
            return Err(EngineError::SchemaMismatch {
                expected: SCHEMA_VERSION,
                got: command.schema_version,
            });
        }

        // -- Sequence enforcement --
        let expected = self.last_sequence + 1;
        if command.sequence != expected {
            return Err(EngineError::SequenceViolation {
                expected,
                got: command.sequence,
            });
        }

        let (new_state, result) = match &self.state {
            None => {
                let state = initial_state(command)?;
                validate_invariants(&state);
                debug!(candidates = state.total_candidates(), admin = %state.admin(), "ballot initialized");
                let result = TransitionResult {
                    command_type: INITIALIZE.to_string(),
                    sequence: command.sequence,
                    notifications: Vec::new(),
                };
                (state, result)
            }
            Some(current) => {
                let (new_state, result) = transition_apply(current, command)?;
                validate_invariants(&new_state);
                validate_transition(current, &new_state);
                (new_state, result)
            }
        };

        self.state = Some(new_state);
        self.last_sequence = command.sequence;
        Ok(result)
    }

    /// Apply an ordered sequence of commands, stopping at the first rejection.
    pub fn apply_sequence(&mut self, commands: &[CommandEnvelope]) -> Result<&BallotState, EngineError> {
        for command in commands {
            self.apply_command(command)?;
        }
        self.state()
    }

    /// Command-sourced reconstruction: reset and replay.
    pub fn replay(&mut self, commands: &[CommandEnvelope]) -> Result<&BallotState, EngineError> {
        *self = Self::new();
        self.apply_sequence(commands)
    }
}
