//! Primary-loop heat-up engine.
//!
//! Provides:
//! - Mass ledger with tagged boundary flows and a derived RCS remainder
//! - Regime state machine with the bubble formation sub-phases
//! - Pressurizer partition step backed by the closure solver
//! - Multi-node steam generator with blend ramp and delta clamp
//! - Forensics ring buffer with triggered CSV dumps
//! - Event log, telemetry publisher, and real-time pacing
//! - CVCS, heater/spray, relief, and RCP start collaborators

pub mod alarms;
pub mod config;
pub mod cvcs;
pub mod error;
pub mod events;
pub mod forensics;
pub mod ledger;
pub mod pacing;
pub mod pressurizer;
pub mod rcp;
pub mod regime;
pub mod relief;
pub mod sg;
pub mod sim;
pub mod state;
pub mod telemetry;

pub use alarms::{AlarmCounters, AlarmFlags, AlarmKind};
pub use config::{MAX_STABLE_DT_S, PlantConfig};
pub use error::{InvariantViolation, LedgerError, SimError, SimResult};
pub use events::{Event, EventLog, Severity};
pub use forensics::{ForensicsRecorder, ForensicsSink, Trigger};
pub use ledger::{BoundaryReceipt, LedgerAnomaly};
pub use pacing::{FramePlan, RealtimePacer};
pub use regime::{PlantMode, Transition};
pub use sg::{SgRegime, SteamGenerator};
pub use sim::{PlantState, SimOptions, SimRun, Simulator, TickReport, run_sim, run_sim_with};
pub use state::{BoundarySource, BubblePhase, PlantRegime, SystemState};
pub use telemetry::{TelemetryPublisher, TelemetrySnapshot};
