//! Wall-clock paced session for interactive frontends.

use pw_scenario::{ScheduledFlowDef, Scenario};
use pw_sim::{FramePlan, RealtimePacer, SimResult, Simulator, TelemetrySnapshot};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub plan: FramePlan,
    pub sim_time_s: f64,
    /// Latest published telemetry after the frame
    pub telemetry: Option<TelemetrySnapshot>,
}

/// A simulator advanced in whole fixed ticks per rendered frame.
pub struct LiveSession {
    sim: Simulator,
    pacer: RealtimePacer,
    acceleration: f64,
    schedule: Vec<ScheduledFlowDef>,
    next_flow: usize,
}

impl LiveSession {
    pub fn new(scenario: &Scenario) -> SimResult<Self> {
        let time = &scenario.plant.time;
        let pacer = RealtimePacer::new(time.dt_s, time.max_acceleration, time.max_ticks_per_frame)?;
        Ok(Self {
            sim: Simulator::new(scenario.plant.clone())?,
            pacer,
            acceleration: 1.0,
            schedule: scenario.sorted_schedule(),
            next_flow: 0,
        })
    }

    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }

    pub fn simulator_mut(&mut self) -> &mut Simulator {
        &mut self.sim
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    /// Requested acceleration; the pacer clamps it each frame. Zero pauses.
    pub fn set_acceleration(&mut self, acceleration: f64) {
        self.acceleration = acceleration;
    }

    /// Run the ticks owed for `wall_elapsed_s` of wall-clock time.
    pub fn advance_frame(&mut self, wall_elapsed_s: f64) -> SimResult<FrameStats> {
        let plan = self.pacer.plan(wall_elapsed_s, self.acceleration);
        let dt = self.sim.dt();
        for _ in 0..plan.ticks {
            let now = self.sim.time_s();
            while let Some(flow) = self.schedule.get(self.next_flow) {
                if flow.at_s > now + 0.5 * dt {
                    break;
                }
                self.sim.queue_boundary_flow(flow.delta_lb, flow.source.into())?;
                self.next_flow += 1;
            }
            self.sim.tick();
        }
        Ok(FrameStats {
            plan,
            sim_time_s: self.sim.time_s(),
            telemetry: self.sim.telemetry(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pw_scenario::FlowSourceDef;

    #[test]
    fn frames_advance_whole_ticks() {
        let mut scenario = Scenario::new("live");
        scenario.plant.time.dt_s = 0.5;
        let mut session = LiveSession::new(&scenario).unwrap();
        session.set_acceleration(10.0);

        let stats = session.advance_frame(0.1).unwrap();
        assert_eq!(stats.plan.ticks, 2);
        assert_eq!(stats.sim_time_s, 1.0);
        assert!(stats.telemetry.is_some());

        session.set_acceleration(0.0);
        let paused = session.advance_frame(1.0).unwrap();
        assert_eq!(paused.plan.ticks, 0);
        assert_eq!(paused.sim_time_s, 1.0);
    }

    #[test]
    fn schedule_applies_at_its_time() {
        let mut scenario = Scenario::new("live");
        scenario.plant.time.dt_s = 1.0;
        scenario.schedule.push(ScheduledFlowDef {
            at_s: 3.0,
            source: FlowSourceDef::Makeup,
            delta_lb: 12.0,
        });
        let mut session = LiveSession::new(&scenario).unwrap();
        session.set_acceleration(1.0);

        session.advance_frame(3.0).unwrap();
        assert_eq!(session.simulator().state().accumulators().makeup_net_lb, 0.0);
        session.advance_frame(1.0).unwrap();
        assert_eq!(session.simulator().state().accumulators().makeup_net_lb, 12.0);
    }
}
