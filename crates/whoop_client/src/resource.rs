use crate::WhoopError;
use std::fmt;
use std::str::FromStr;

/// Collections exported from the WHOOP API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Sleep,
    Workout,
    Recovery,
    Cycle,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Sleep,
        Resource::Workout,
        Resource::Recovery,
        Resource::Cycle,
    ];

    /// Exported when nothing else is requested.
    pub const DEFAULT: [Resource; 2] = [Resource::Sleep, Resource::Workout];

    /// Path relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Sleep => "v1/activity/sleep",
            Resource::Workout => "v1/activity/workout",
            Resource::Recovery => "v1/recovery",
            Resource::Cycle => "v1/cycle",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Resource::Sleep => "sleep",
            Resource::Workout => "workout",
            Resource::Recovery => "recovery",
            Resource::Cycle => "cycle",
        }
    }

    pub fn log_file(self) -> String {
        format!("{}.log", self.name())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = WhoopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Resource::ALL
            .into_iter()
            .find(|r| r.name() == lowered)
            .ok_or_else(|| WhoopError::Config(format!("unknown resource: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Sleep".parse::<Resource>().unwrap(), Resource::Sleep);
        assert_eq!(" cycle ".parse::<Resource>().unwrap(), Resource::Cycle);
        assert!("steps".parse::<Resource>().is_err());
    }

    #[test]
    fn paths_and_files() {
        assert_eq!(Resource::Workout.path(), "v1/activity/workout");
        assert_eq!(Resource::Recovery.log_file(), "recovery.log");
    }
}
