//! Player and AI intents, applied at the start of the next tick.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::components::{Command, Side, UnitType};

/// A side-effecting intent.
///
/// Actions are fire-and-forget: the engine validates them when it drains
/// the queue and silently drops the ones it cannot honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Buy a unit for a side.
    Recruit {
        /// Kind of unit.
        unit_type: UnitType,
        /// Buying side.
        side: Side,
    },
    /// Replace a side's standing command.
    ChangeCommand {
        /// Commanded side.
        side: Side,
        /// New command.
        command: Command,
    },
    /// Any action kind this build does not understand. Ignored.
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Recruit shorthand.
    #[must_use]
    pub const fn recruit(unit_type: UnitType, side: Side) -> Self {
        Self::Recruit { unit_type, side }
    }

    /// Change-command shorthand.
    #[must_use]
    pub const fn command(side: Side, command: Command) -> Self {
        Self::ChangeCommand { side, command }
    }
}

/// FIFO inbox of actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionQueue {
    pending: VecDeque<Action>,
}

impl ActionQueue {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action.
    pub fn push(&mut self, action: Action) {
        self.pending.push_back(action);
    }

    /// Take every pending action in submission order.
    pub fn drain(&mut self) -> Vec<Action> {
        self.pending.drain(..).collect()
    }

    /// Number of pending actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending actions without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.pending.iter()
    }
}

impl Extend<Action> for ActionQueue {
    fn extend<I: IntoIterator<Item = Action>>(&mut self, iter: I) {
        self.pending.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_is_fifo_and_empties() {
        let mut queue = ActionQueue::new();
        queue.push(Action::recruit(UnitType::Worker, Side::Player));
        queue.push(Action::command(Side::Player, Command::Attack));

        let drained = queue.drain();
        assert_eq!(
            drained,
            vec![
                Action::recruit(UnitType::Worker, Side::Player),
                Action::command(Side::Player, Command::Attack),
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_unknown_action_kind_decodes_to_unknown() {
        let action: Action = serde_json::from_str(r#"{"type":"SELF_DESTRUCT"}"#).unwrap();
        assert_eq!(action, Action::Unknown);
    }

    #[test]
    fn test_recruit_wire_shape() {
        let json = serde_json::to_string(&Action::recruit(UnitType::Archer, Side::Enemy)).unwrap();
        assert_eq!(json, r#"{"type":"RECRUIT","unit_type":"archer","side":"enemy"}"#);
    }
}
