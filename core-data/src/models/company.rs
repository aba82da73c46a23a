use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::WorkflowError;
use super::role::Role;

const FULL_CHAIN: [Role; 5] = [
    Role::Area,
    Role::Director,
    Role::Gerencia,
    Role::Calidad,
    Role::Seguridad,
];

const NO_AREA_CHAIN: [Role; 4] = [
    Role::Director,
    Role::Gerencia,
    Role::Calidad,
    Role::Seguridad,
];

/// Company variant. Each variant declares the ordered roles that must
/// approve a profile and which role stands for the original creator.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Company {
    Merkahorro,
    Construahorro,
    Megamayoristas,
}

impl Company {
    pub fn as_str(&self) -> &'static str {
        match self {
            Company::Merkahorro => "merkahorro",
            Company::Construahorro => "construahorro",
            Company::Megamayoristas => "megamayoristas",
        }
    }

    pub fn roles(&self) -> &'static [Role] {
        match self {
            Company::Merkahorro | Company::Megamayoristas => &FULL_CHAIN,
            Company::Construahorro => &NO_AREA_CHAIN,
        }
    }

    pub fn first_role(&self) -> Role {
        self.roles()[0]
    }

    /// Role following `role` in this company's chain, `None` when `role` is last.
    pub fn next_role(&self, role: Role) -> Option<Role> {
        let roles = self.roles();
        roles
            .iter()
            .position(|r| *r == role)
            .and_then(|idx| roles.get(idx + 1).copied())
    }

    pub fn applies(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }

    /// Approver slot that receives the final and rejection notices.
    pub fn creator_role(&self) -> Role {
        match self {
            Company::Merkahorro => Role::Area,
            Company::Construahorro | Company::Megamayoristas => Role::Director,
        }
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Company {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "merkahorro" => Ok(Company::Merkahorro),
            "construahorro" => Ok(Company::Construahorro),
            "megamayoristas" => Ok(Company::Megamayoristas),
            other => Err(WorkflowError::validation(
                "company",
                format!("unknown company '{}'", other),
            )),
        }
    }
}
