use core::fmt;

/// Caller-side invariant violations. None of these are recoverable inside the
/// core: they mean the observed state or the track handed to us is malformed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreError {
    EmptyCheckpointLoop,
    CheckpointIndexOutOfRange { index: usize, len: usize },
    NonFiniteCoordinate { what: &'static str },
    NonFiniteVehicle,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCheckpointLoop => write!(f, "checkpoint loop is empty"),
            Self::CheckpointIndexOutOfRange { index, len } => write!(
                f,
                "next checkpoint index {index} out of range for a loop of {len}"
            ),
            Self::NonFiniteCoordinate { what } => write!(f, "non-finite coordinate in {what}"),
            Self::NonFiniteVehicle => write!(f, "vehicle state has non-finite components"),
        }
    }
}

impl std::error::Error for CoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_index() {
        let err = CoreError::CheckpointIndexOutOfRange { index: 7, len: 4 };
        assert_eq!(
            err.to_string(),
            "next checkpoint index 7 out of range for a loop of 4"
        );
    }
}
