//! Role catalog
//!
//! Static reference data for the open positions. Role identifiers are a
//! closed enumeration known at process start; the intent classifier may
//! only ever emit identifiers from this set (or none), and every lookup in
//! retrieval and scheduling goes through the canonical id.

use serde::{Deserialize, Serialize};

/// Canonical identifier for an open position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleId {
    DataAnalyst,
    MlEngineer,
    PythonDeveloper,
    SqlDeveloper,
}

impl RoleId {
    /// All roles, in presentation order
    pub const ALL: [RoleId; 4] = [
        RoleId::DataAnalyst,
        RoleId::MlEngineer,
        RoleId::PythonDeveloper,
        RoleId::SqlDeveloper,
    ];

    /// The canonical snake_case id used on the wire and in metadata filters
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleId::DataAnalyst => "data_analyst",
            RoleId::MlEngineer => "ml_engineer",
            RoleId::PythonDeveloper => "python_developer",
            RoleId::SqlDeveloper => "sql_developer",
        }
    }

    /// Parse a canonical id. Anything outside the closed set yields `None`;
    /// free-form role strings are never accepted.
    pub fn parse(s: &str) -> Option<RoleId> {
        match s {
            "data_analyst" => Some(RoleId::DataAnalyst),
            "ml_engineer" => Some(RoleId::MlEngineer),
            "python_developer" => Some(RoleId::PythonDeveloper),
            "sql_developer" => Some(RoleId::SqlDeveloper),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference data for one role
#[derive(Debug, Clone)]
pub struct RoleInfo {
    /// Human-friendly name shown to candidates
    pub friendly_name: &'static str,
    /// Source document the knowledge base was ingested from
    pub document_source: &'static str,
    /// Position name used by the scheduling table
    pub position_name: &'static str,
    /// Phrasings candidates use for this role
    pub aliases: &'static [&'static str],
}

const DATA_ANALYST: RoleInfo = RoleInfo {
    friendly_name: "Data Analyst",
    document_source: "Data-Analyst-Job-Description.pdf",
    position_name: "Analyst",
    aliases: &["data analyst", "analyst", "data analytics"],
};

const ML_ENGINEER: RoleInfo = RoleInfo {
    friendly_name: "Machine Learning Engineer",
    document_source: "Machine-Learning-Engineer-092016.pdf",
    position_name: "ML",
    aliases: &["ml engineer", "machine learning engineer", "ml"],
};

const PYTHON_DEVELOPER: RoleInfo = RoleInfo {
    friendly_name: "Python Developer",
    document_source: "PythonDeveloperJobDescription.pdf",
    position_name: "Python Dev",
    aliases: &["python developer", "python dev", "python software engineer"],
};

const SQL_DEVELOPER: RoleInfo = RoleInfo {
    friendly_name: "Senior SQL Developer",
    document_source: "SrSQLDeveloperJD.pdf",
    position_name: "Sql Dev",
    aliases: &[
        "sql developer",
        "sr sql dev",
        "sql dev",
        "database developer",
        "senior sql developer",
    ],
};

/// Read-only catalog of all open positions
#[derive(Debug, Clone, Default)]
pub struct RoleCatalog;

impl RoleCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Look up the reference data for a role
    pub fn info(&self, role: RoleId) -> &'static RoleInfo {
        match role {
            RoleId::DataAnalyst => &DATA_ANALYST,
            RoleId::MlEngineer => &ML_ENGINEER,
            RoleId::PythonDeveloper => &PYTHON_DEVELOPER,
            RoleId::SqlDeveloper => &SQL_DEVELOPER,
        }
    }

    /// Friendly names in presentation order, for welcome/listing messages
    pub fn friendly_names(&self) -> Vec<&'static str> {
        RoleId::ALL.iter().map(|r| self.info(*r).friendly_name).collect()
    }

    /// Bulleted role listing used by several canned responses
    pub fn bulleted_roles(&self) -> String {
        self.friendly_names()
            .iter()
            .map(|name| format!("• {name}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Per-role extraction instructions injected into the classifier prompt
    pub fn role_instructions(&self) -> String {
        RoleId::ALL
            .iter()
            .map(|role| {
                let info = self.info(*role);
                format!(
                    "- To discuss the {} role, use the ID '{}'. The user might refer to it with aliases like: {}.",
                    info.friendly_name,
                    role.as_str(),
                    info.aliases.join(", ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Distinct roles whose aliases appear in the message.
    ///
    /// Used to spot messages naming more than one role so the assistant can
    /// ask the candidate to pick exactly one. Matching is plain lowercase
    /// substring matching over the alias lists.
    pub fn roles_mentioned(&self, message: &str) -> Vec<RoleId> {
        let lower = message.to_lowercase();
        RoleId::ALL
            .iter()
            .copied()
            .filter(|role| {
                self.info(*role)
                    .aliases
                    .iter()
                    .any(|alias| lower.contains(alias))
            })
            .collect()
    }
}
