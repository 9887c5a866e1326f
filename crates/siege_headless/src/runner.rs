//! Interactive JSON-lines session.
//!
//! The runner owns one [`Simulation`] and advances it only when told to,
//! on the nominal tick clock. Input and output are generic so tests can
//! drive a session from memory.

use std::io::{self, BufRead, Write};

use siege_core::actions::Action;
use siege_core::simulation::{Simulation, TICK_INTERVAL_MS};

use crate::protocol::{Command, Response};

/// Hard cap on ticks per `tick` command.
pub const MAX_TICKS_PER_COMMAND: u32 = 100_000;

/// Session options.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Output state after every `tick` command instead of an ack.
    pub auto_state_output: bool,
}

/// Headless session for controller-driven matches.
#[derive(Debug)]
pub struct HeadlessRunner {
    sim: Simulation,
    config: HeadlessConfig,
    announced_over: bool,
}

impl HeadlessRunner {
    /// Session over an already built simulation.
    #[must_use]
    pub fn new(sim: Simulation, config: HeadlessConfig) -> Self {
        Self {
            sim,
            config,
            announced_over: false,
        }
    }

    /// Simulation being driven.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Handle one command. Returns the responses and whether to stop.
    pub fn handle(&mut self, command: Command) -> (Vec<Response>, bool) {
        let name = command.name();
        let mut responses = Vec::new();

        match command {
            Command::Tick { count } => {
                if count > MAX_TICKS_PER_COMMAND {
                    responses.push(Response::error(
                        format!("count {count} exceeds the limit of {MAX_TICKS_PER_COMMAND}"),
                        Some(name),
                    ));
                    return (responses, false);
                }
                for _ in 0..count {
                    let now = self.sim.snapshot().last_tick + TICK_INTERVAL_MS;
                    self.sim.tick(now);
                }
                if self.config.auto_state_output {
                    responses.push(Response::state(&self.sim));
                } else {
                    responses.push(Response::ack(name));
                }
                if let Some(over) = self.announce_outcome() {
                    responses.push(over);
                }
            }
            Command::Recruit { unit_type, side } => {
                self.sim.submit(Action::recruit(unit_type, side));
                responses.push(Response::ack(name));
            }
            Command::Command { side, command } => {
                self.sim.submit(Action::command(side, command));
                responses.push(Response::ack(name));
            }
            Command::Query => responses.push(Response::state(&self.sim)),
            Command::Hash => responses.push(Response::StateHash {
                tick: self.sim.tick_count(),
                hash: self.sim.state_hash(),
            }),
            Command::Quit => {
                responses.push(Response::Bye);
                return (responses, true);
            }
        }

        (responses, false)
    }

    fn announce_outcome(&mut self) -> Option<Response> {
        let status = self.sim.snapshot().game_status;
        if self.announced_over || !status.is_over() {
            return None;
        }
        self.announced_over = true;
        tracing::info!(?status, ticks = self.sim.tick_count(), "Match decided");
        Some(Response::GameOver {
            result: status,
            ticks: self.sim.tick_count(),
        })
    }

    /// Serve a session until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(mut self, input: R, mut output: W) -> io::Result<Simulation> {
        output.write_all(Response::ready(self.sim.tick_count()).to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (responses, quit) = match Command::from_json(line) {
                Ok(command) => self.handle(command),
                Err(e) => (vec![Response::error(format!("Parse error: {e}"), None)], false),
            };
            for response in &responses {
                output.write_all(response.to_json_line().as_bytes())?;
            }
            output.flush()?;
            if quit {
                break;
            }
        }

        tracing::debug!(ticks = self.sim.tick_count(), "Session ended");
        Ok(self.sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siege_core::components::{Side, UnitType};
    use siege_core::data::GameConfig;
    use siege_core::simulation::MatchConfig;

    fn quiet_runner(auto_state: bool) -> HeadlessRunner {
        let match_config = MatchConfig {
            ai_sides: Vec::new(),
            ..MatchConfig::default()
        };
        HeadlessRunner::new(
            Simulation::new(GameConfig::default(), &match_config, 0),
            HeadlessConfig {
                auto_state_output: auto_state,
            },
        )
    }

    #[test]
    fn test_recruit_applies_on_next_tick() {
        let mut runner = quiet_runner(false);
        let (responses, _) = runner.handle(Command::Recruit {
            unit_type: UnitType::Worker,
            side: Side::Player,
        });
        assert_eq!(responses, vec![Response::ack("recruit")]);
        assert_eq!(runner.simulation().snapshot().units.len(), 0);

        runner.handle(Command::Tick { count: 1 });
        assert_eq!(runner.simulation().snapshot().units.len(), 1);
        assert_eq!(runner.simulation().snapshot().last_tick, 20);
    }

    #[test]
    fn test_auto_state_reports_after_tick() {
        let mut runner = quiet_runner(true);
        let (responses, _) = runner.handle(Command::Tick { count: 5 });
        let Response::State(state) = &responses[0] else {
            panic!("expected state, got {responses:?}");
        };
        assert_eq!(state.tick, 5);
        assert_eq!(state.time_ms, 100);
    }

    #[test]
    fn test_game_over_is_announced_once() {
        let mut runner = quiet_runner(false);
        runner.sim.snapshot_mut().statue_hp.enemy = 0.0;

        let (first, _) = runner.handle(Command::Tick { count: 1 });
        assert!(first.iter().any(|r| matches!(r, Response::GameOver { .. })));
        let (second, _) = runner.handle(Command::Tick { count: 1 });
        assert!(!second.iter().any(|r| matches!(r, Response::GameOver { .. })));
    }

    #[test]
    fn test_oversized_tick_is_refused() {
        let mut runner = quiet_runner(false);
        let (responses, quit) = runner.handle(Command::Tick {
            count: MAX_TICKS_PER_COMMAND + 1,
        });
        assert!(matches!(responses[0], Response::Error { .. }));
        assert!(!quit);
        assert_eq!(runner.simulation().tick_count(), 0);
    }
}
