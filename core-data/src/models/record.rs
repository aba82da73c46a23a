use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::auditlog::AuditLog;
use super::company::Company;
use super::profile::JobProfile;
use super::role::Role;
use super::state::WorkflowState;

/// Email of the person assigned to each approval slot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Approvers {
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub gerencia: Option<String>,
    #[serde(default)]
    pub calidad: Option<String>,
    #[serde(default)]
    pub seguridad: Option<String>,
}

impl Approvers {
    /// Assigned identity for `role`, ignoring blank values.
    pub fn get(&self, role: Role) -> Option<&str> {
        let slot = match role {
            Role::Area => &self.area,
            Role::Director => &self.director,
            Role::Gerencia => &self.gerencia,
            Role::Calidad => &self.calidad,
            Role::Seguridad => &self.seguridad,
        };
        slot.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Observations {
    #[serde(default, rename = "observacion_area")]
    area: Option<String>,
    #[serde(default, rename = "observacion_director")]
    director: Option<String>,
    #[serde(default, rename = "observacion_gerencia")]
    gerencia: Option<String>,
    #[serde(default, rename = "observacion_calidad")]
    calidad: Option<String>,
    #[serde(default, rename = "observacion_seguridad")]
    seguridad: Option<String>,
}

impl Observations {
    fn slot_mut(&mut self, role: Role) -> &mut Option<String> {
        match role {
            Role::Area => &mut self.area,
            Role::Director => &mut self.director,
            Role::Gerencia => &mut self.gerencia,
            Role::Calidad => &mut self.calidad,
            Role::Seguridad => &mut self.seguridad,
        }
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Area => self.area.as_deref(),
            Role::Director => self.director.as_deref(),
            Role::Gerencia => self.gerencia.as_deref(),
            Role::Calidad => self.calidad.as_deref(),
            Role::Seguridad => self.seguridad.as_deref(),
        }
    }

    pub fn set(&mut self, role: Role, comment: Option<String>) {
        *self.slot_mut(role) = comment;
    }

    pub fn is_empty(&self) -> bool {
        Role::ALL.iter().all(|role| self.get(*role).is_none())
    }
}

/// Record ids are Sonyflake values above 2^53, so they leave the process as
/// JSON strings. Numbers are still accepted on input.
pub(crate) mod id_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Id {
            Number(u64),
            Text(String),
        }

        match Id::deserialize(deserializer)? {
            Id::Number(id) => Ok(id),
            Id::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
        }
    }
}

/// One job-profile approval request. Mutated in place as approvers act;
/// never deleted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorkflowRecord {
    #[serde(with = "id_text")]
    pub(crate) id: u64,

    pub(crate) workflow_id: String,

    pub(crate) company: Company,

    pub(crate) estado: WorkflowState,

    /// Write counter; bumped by the store on every successful update.
    #[serde(default)]
    pub(crate) version: u64,

    #[serde(default)]
    pub(crate) etapas_aprobadas: Vec<Role>,

    #[serde(flatten)]
    pub(crate) approvers: Approvers,

    #[serde(flatten)]
    pub(crate) observations: Observations,

    #[serde(default)]
    pub(crate) documento: Option<String>,

    pub(crate) perfil: JobProfile,

    #[serde(default)]
    pub(crate) historial: Vec<AuditLog>,

    #[serde(with = "time::serde::iso8601")]
    pub(crate) created_at: OffsetDateTime,

    #[serde(with = "time::serde::iso8601")]
    pub(crate) updated_at: OffsetDateTime,
}

impl WorkflowRecord {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn company(&self) -> Company {
        self.company
    }

    pub fn estado(&self) -> &WorkflowState {
        &self.estado
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn etapas_aprobadas(&self) -> &[Role] {
        &self.etapas_aprobadas
    }

    pub fn approvers(&self) -> &Approvers {
        &self.approvers
    }

    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    pub fn documento(&self) -> Option<&str> {
        self.documento.as_deref()
    }

    pub fn perfil(&self) -> &JobProfile {
        &self.perfil
    }

    pub fn historial(&self) -> &[AuditLog] {
        &self.historial
    }

    pub fn created_at(&self) -> &OffsetDateTime {
        &self.created_at
    }

    pub fn updated_at(&self) -> &OffsetDateTime {
        &self.updated_at
    }

    /// Identity the creator is reached at, per the company's creator slot.
    pub fn creator(&self) -> Option<&str> {
        self.approvers.get(self.company.creator_role())
    }

    pub fn new(
        id: u64,
        workflow_id: String,
        company: Company,
        approvers: Approvers,
        perfil: JobProfile,
        documento: Option<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            workflow_id,
            company,
            estado: WorkflowState::Pending(company.first_role()),
            version: 0,
            etapas_aprobadas: Vec::new(),
            approvers,
            observations: Observations::default(),
            documento,
            perfil,
            historial: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set-like append; returns false when `role` was already recorded.
    pub(crate) fn mark_stage_approved(&mut self, role: Role) -> bool {
        if self.etapas_aprobadas.contains(&role) {
            return false;
        }
        self.etapas_aprobadas.push(role);
        true
    }

    pub(crate) fn push_audit(&mut self, audit: AuditLog) {
        self.historial.push(audit);
    }

    pub(crate) fn next_audit_seq(&self) -> u32 {
        self.historial.len() as u32 + 1
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }

    /// The copy a store writes back after a successful conditional update.
    pub fn next_version(&self) -> Self {
        Self {
            version: self.version + 1,
            ..self.clone()
        }
    }
}
