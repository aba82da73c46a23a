use sonyflake::Sonyflake;

use crate::models::errors::WorkflowError;

type MachineIdError = Box<dyn std::error::Error + Send + Sync>;

/// Record identifiers: time-ordered 63-bit Sonyflake ids.
#[derive(Clone)]
pub struct IdGenerator {
    inner: Sonyflake,
}

impl IdGenerator {
    /// `machine_id` must be unique per running instance.
    pub fn new(machine_id: u16) -> Result<Self, WorkflowError> {
        let machine: &dyn Fn() -> Result<u16, MachineIdError> = &move || Ok(machine_id);
        let inner = Sonyflake::builder()
            .machine_id(machine)
            .finalize()
            .map_err(|e| WorkflowError::Persistence(format!("Id generator setup failed: {}", e)))?;
        Ok(Self { inner })
    }

    pub fn next_id(&self) -> Result<u64, WorkflowError> {
        self.inner
            .next_id()
            .map_err(|e| WorkflowError::Persistence(format!("Id generation failed: {}", e)))
    }
}

impl std::fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdGenerator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let ids = IdGenerator::new(7).unwrap();
        let first = ids.next_id().unwrap();
        let second = ids.next_id().unwrap();
        assert!(second > first);
    }
}
