//! Finite State Machine for a single deployment attempt

/// Which sequence of steps an attempt walks through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePath {
    /// Build a fresh archive from the latest source and install it
    Forward,

    /// Reinstall an existing archive
    Rollback,
}

/// Release state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseState {
    /// Not started
    Idle,

    SyncingSource,
    RefreshingWorkingConfig,
    Building,
    Archiving,
    CopyingConfigIntoArchive,
    RecordingProvenance,
    CopyingAppIntoArchive,

    ResolvingArchive,
    CheckingValidity,

    /// The only destructive step
    ClearingLiveDir,
    InstallingFromArchive,

    /// Every step succeeded
    Done,

    /// A step failed; the attempt is over
    Failed,
}

const FORWARD_STEPS: &[ReleaseState] = &[
    ReleaseState::SyncingSource,
    ReleaseState::RefreshingWorkingConfig,
    ReleaseState::Building,
    ReleaseState::Archiving,
    ReleaseState::CopyingConfigIntoArchive,
    ReleaseState::RecordingProvenance,
    ReleaseState::CopyingAppIntoArchive,
    ReleaseState::ClearingLiveDir,
    ReleaseState::InstallingFromArchive,
];

const ROLLBACK_STEPS: &[ReleaseState] = &[
    ReleaseState::ResolvingArchive,
    ReleaseState::CheckingValidity,
    ReleaseState::ClearingLiveDir,
    ReleaseState::InstallingFromArchive,
];

impl ReleaseState {
    /// Operator-facing banner text for a step
    pub fn description(&self) -> &'static str {
        match self {
            ReleaseState::Idle => "Waiting",
            ReleaseState::SyncingSource => "Updating data from repository",
            ReleaseState::RefreshingWorkingConfig => "Updating working config.xml",
            ReleaseState::Building => "Building project",
            ReleaseState::Archiving => "Creating archive directory for the new version",
            ReleaseState::CopyingConfigIntoArchive => "Copying configuration to the archive",
            ReleaseState::RecordingProvenance => "Writing information about used GIT commit",
            ReleaseState::CopyingAppIntoArchive => "Copying built project to the archive",
            ReleaseState::ResolvingArchive => "Looking up archive",
            ReleaseState::CheckingValidity => "Checking archive validity",
            ReleaseState::ClearingLiveDir => "Removing current deployment",
            ReleaseState::InstallingFromArchive => "Deploying new version",
            ReleaseState::Done => "Done",
            ReleaseState::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReleaseState::Done | ReleaseState::Failed)
    }

    /// Whether the state is one of the working steps
    pub fn is_step(&self) -> bool {
        !self.is_terminal() && *self != ReleaseState::Idle
    }
}

impl ReleasePath {
    /// Ordered steps of this path
    pub fn steps(&self) -> &'static [ReleaseState] {
        match self {
            ReleasePath::Forward => FORWARD_STEPS,
            ReleasePath::Rollback => ROLLBACK_STEPS,
        }
    }
}

/// Release event
#[derive(Debug, Clone)]
pub enum ReleaseEvent {
    /// Begin the first step
    Start,

    /// The current step finished successfully
    StepSucceeded,

    /// The current step failed
    StepFailed(String),
}

/// Release FSM
#[derive(Debug, Clone)]
pub struct ReleaseFsm {
    path: ReleasePath,
    state: ReleaseState,
    position: usize,
    failed_at: Option<ReleaseState>,
    error: Option<String>,
    completed: Vec<ReleaseState>,
}

impl ReleaseFsm {
    /// Create a new FSM in idle state
    pub fn new(path: ReleasePath) -> Self {
        Self {
            path,
            state: ReleaseState::Idle,
            position: 0,
            failed_at: None,
            error: None,
            completed: Vec::new(),
        }
    }

    /// Get current state
    pub fn state(&self) -> ReleaseState {
        self.state
    }

    /// Step at which the attempt failed
    pub fn failed_at(&self) -> Option<ReleaseState> {
        self.failed_at
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Steps finished successfully so far, in order
    pub fn completed(&self) -> &[ReleaseState] {
        &self.completed
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: ReleaseEvent) -> Result<(), String> {
        let steps = self.path.steps();
        let new_state = match (self.state, &event) {
            (ReleaseState::Idle, ReleaseEvent::Start) => {
                self.position = 0;
                steps[0]
            }

            (state, ReleaseEvent::StepSucceeded) if state.is_step() => {
                self.completed.push(state);
                self.position += 1;
                steps.get(self.position).copied().unwrap_or(ReleaseState::Done)
            }

            (state, ReleaseEvent::StepFailed(err)) if state.is_step() => {
                self.failed_at = Some(state);
                self.error = Some(err.clone());
                ReleaseState::Failed
            }

            // Invalid transitions
            (state, event) => {
                return Err(format!(
                    "Invalid transition: {:?} -> {:?}",
                    state, event
                ));
            }
        };

        self.state = new_state;
        Ok(())
    }

    /// Whether the live application directory may have been modified
    pub fn touched_live_dir(&self) -> bool {
        self.completed.contains(&ReleaseState::ClearingLiveDir)
            || self.failed_at == Some(ReleaseState::ClearingLiveDir)
    }
}
