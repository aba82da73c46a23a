use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::WorkflowError;

/// One approval step of the chain.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Area,
    Director,
    Gerencia,
    Calidad,
    Seguridad,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Area,
        Role::Director,
        Role::Gerencia,
        Role::Calidad,
        Role::Seguridad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Area => "area",
            Role::Director => "director",
            Role::Gerencia => "gerencia",
            Role::Calidad => "calidad",
            Role::Seguridad => "seguridad",
        }
    }

    /// Human label used in notification subjects.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Area => "Área",
            Role::Director => "Dirección",
            Role::Gerencia => "Gerencia",
            Role::Calidad => "Calidad",
            Role::Seguridad => "Seguridad y Salud en el Trabajo",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "area" | "área" => Ok(Role::Area),
            "director" => Ok(Role::Director),
            "gerencia" => Ok(Role::Gerencia),
            "calidad" => Ok(Role::Calidad),
            "seguridad" => Ok(Role::Seguridad),
            _ => Err(WorkflowError::InvalidRole(s.to_string())),
        }
    }
}

/// What an approver decided. Both the imperative and the participle
/// spellings are accepted on input.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    #[serde(rename = "aprobar", alias = "aprobado")]
    Approve,
    #[serde(rename = "rechazar", alias = "rechazado")]
    Reject,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Approve => f.write_str("aprobar"),
            Decision::Reject => f.write_str("rechazar"),
        }
    }
}

impl FromStr for Decision {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aprobar" | "aprobado" => Ok(Decision::Approve),
            "rechazar" | "rechazado" => Ok(Decision::Reject),
            _ => Err(WorkflowError::InvalidDecision(s.to_string())),
        }
    }
}
