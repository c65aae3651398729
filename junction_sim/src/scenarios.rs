//! Signal cycling scenarios for deterministic simulation runs.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// SIG-001: Four-way junction, full rounds at nominal frame rate
    FourWay,

    /// SIG-002: Town layout with a T-junction and uneven arm timings
    TJunction,

    /// SIG-003: Freeze mid-phase, hold, then resume
    Freeze,

    /// SIG-004: Replay suspends the scheduler while the recording seeks it
    ReplaySeek,

    /// SIG-005: Frame deltas far longer than any phase
    Overshoot,

    /// SIG-006: Jittered frame times replay identically from the same seed
    Jitter,

    /// SIG-007: Sensor projections onto the junction geometry
    SensorProbe,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::FourWay,
            ScenarioId::TJunction,
            ScenarioId::Freeze,
            ScenarioId::ReplaySeek,
            ScenarioId::Overshoot,
            ScenarioId::Jitter,
            ScenarioId::SensorProbe,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::FourWay => "four_way",
            ScenarioId::TJunction => "t_junction",
            ScenarioId::Freeze => "freeze",
            ScenarioId::ReplaySeek => "replay_seek",
            ScenarioId::Overshoot => "overshoot",
            ScenarioId::Jitter => "jitter",
            ScenarioId::SensorProbe => "sensor_probe",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::FourWay => "4 arms, default cycle, verify round-robin order and mutual exclusion",
            ScenarioId::TJunction => "Two junctions ticked together, verify each keeps its own schedule",
            ScenarioId::Freeze => "Freeze all groups for 10s, verify no timer or light moves",
            ScenarioId::ReplaySeek => "Replay drives elapsed time, verify the live run resumes in sync",
            ScenarioId::Overshoot => "One 100s frame, verify exactly one phase change per group",
            ScenarioId::Jitter => "Gaussian frame jitter, verify same seed gives the same timeline",
            ScenarioId::SensorProbe => "Project points over every signal head, verify labels and misses",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "four_way" | "fourway" | "sig-001" => Ok(ScenarioId::FourWay),
            "t_junction" | "tjunction" | "sig-002" => Ok(ScenarioId::TJunction),
            "freeze" | "sig-003" => Ok(ScenarioId::Freeze),
            "replay_seek" | "replayseek" | "sig-004" => Ok(ScenarioId::ReplaySeek),
            "overshoot" | "sig-005" => Ok(ScenarioId::Overshoot),
            "jitter" | "sig-006" => Ok(ScenarioId::Jitter),
            "sensor_probe" | "sensorprobe" | "sig-007" => Ok(ScenarioId::SensorProbe),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
