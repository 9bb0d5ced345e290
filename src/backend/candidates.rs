//! Candidate launch strategies for the backend server
//!
//! The table is ordered from "works with zero local setup" to "requires a
//! manual install exposed on PATH".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Package name of the backend server on PyPI
pub const BACKEND_PACKAGE: &str = "google-automation-mcp";

/// Python module that runs the backend server
pub const BACKEND_MODULE: &str = "google_automation_mcp";

/// Install instructions shown when no candidate could be started
pub const INSTALL_HINT: &str = "pip install google-automation-mcp";

/// One (program, arguments) pair tried while locating the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateStrategy {
    /// Program to execute, resolved through PATH
    pub program: String,

    /// Arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,
}

impl CandidateStrategy {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CandidateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// The reference launch table, in priority order
pub fn default_candidates() -> Vec<CandidateStrategy> {
    vec![
        // Managed runner, no install needed
        CandidateStrategy::new("uvx", [BACKEND_PACKAGE]),
        CandidateStrategy::new("pipx", ["run", BACKEND_PACKAGE]),
        // Installed entry point
        CandidateStrategy::new(BACKEND_PACKAGE, Vec::<String>::new()),
        CandidateStrategy::new("python3", ["-m", BACKEND_MODULE]),
        CandidateStrategy::new("python", ["-m", BACKEND_MODULE]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_candidates_order() {
        let programs: Vec<String> = default_candidates()
            .iter()
            .map(|c| c.to_string())
            .collect();

        assert_eq!(
            programs,
            vec![
                "uvx google-automation-mcp",
                "pipx run google-automation-mcp",
                "google-automation-mcp",
                "python3 -m google_automation_mcp",
                "python -m google_automation_mcp",
            ]
        );
    }

    #[test]
    fn test_default_candidates_deterministic() {
        assert_eq!(default_candidates(), default_candidates());
    }

    #[test]
    fn test_parse_candidate_without_args() {
        let candidate: CandidateStrategy = toml::from_str(r#"program = "echo-server""#).unwrap();
        assert_eq!(candidate.program, "echo-server");
        assert!(candidate.args.is_empty());
    }
}
