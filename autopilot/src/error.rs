use core::fmt;

use pod_race_core::CoreError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanError {
    /// The observed state or track was malformed.
    Core(CoreError),
    /// Generation 0 produced no usable child.
    NoCandidate,
    EmptyActionSet,
    ZeroBeamWidth,
    /// No wall clock and no depth limit: the search would never stop.
    Unbounded,
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core(err) => write!(f, "invalid planning input: {err}"),
            Self::NoCandidate => write!(f, "search produced no candidate action"),
            Self::EmptyActionSet => write!(f, "thrust and angle-offset sets must be non-empty"),
            Self::ZeroBeamWidth => write!(f, "beam width must be >= 1"),
            Self::Unbounded => write!(
                f,
                "planner without a wall-clock budget needs a max_depth"
            ),
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Core(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CoreError> for PlanError {
    fn from(value: CoreError) -> Self {
        Self::Core(value)
    }
}
