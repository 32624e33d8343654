//! Shared variable kiosk
//!
//! A run-scoped key/value store through which process models exchange
//! published state and rate variables. Each variable has exactly one
//! registered publisher; the claim is checked at registration time, writes
//! only verify the claimed ownership. Reads fail loudly on missing keys.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{ModelId, Value, VarId};

/// Single-owner-per-key variable store
#[derive(Debug, Default)]
pub struct VariableKiosk {
    /// Registered publisher per variable
    owners: IndexMap<VarId, ModelId>,
    /// Last published value per variable
    values: IndexMap<VarId, Value>,
}

impl VariableKiosk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a variable name for a publisher. Fails if another publisher
    /// already claimed it.
    pub fn register(&mut self, owner: &ModelId, name: VarId) -> Result<()> {
        if let Some(existing) = self.owners.get(&name) {
            return Err(Error::VariableAlreadyRegistered {
                name,
                owner: existing.clone(),
            });
        }
        debug!(variable = %name, owner = %owner, "variable registered");
        self.owners.insert(name, owner.clone());
        Ok(())
    }

    /// Publish a value. The publisher must be the registered owner.
    pub fn publish(&mut self, owner: &ModelId, name: &VarId, value: Value) -> Result<()> {
        match self.owners.get(name) {
            Some(registered) if registered == owner => {
                self.values.insert(name.clone(), value);
                Ok(())
            }
            Some(_) | None => Err(Error::NotVariableOwner {
                name: name.clone(),
                owner: owner.clone(),
            }),
        }
    }

    /// Read a published value. A missing key is a fatal wiring bug and
    /// propagates as an error.
    pub fn get(&self, name: &VarId) -> Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| Error::VariableNotFound(name.clone()))
    }

    /// Convenience accessor for scalar variables
    pub fn get_scalar(&self, name: &VarId) -> Result<f64> {
        self.get(name)?
            .as_scalar()
            .ok_or_else(|| Error::VariableNotFound(name.clone()))
    }

    /// Whether a value has been published under this name
    pub fn contains(&self, name: &VarId) -> bool {
        self.values.contains_key(name)
    }

    /// Registered variable names, in registration order
    pub fn registered(&self) -> impl Iterator<Item = &VarId> {
        self.owners.keys()
    }

    /// Release a publisher's claims and published values (crop deletion)
    pub fn release_owner(&mut self, owner: &ModelId) {
        let released: Vec<VarId> = self
            .owners
            .iter()
            .filter(|(_, registered)| *registered == owner)
            .map(|(name, _)| name.clone())
            .collect();
        for name in released {
            self.owners.shift_remove(&name);
            self.values.shift_remove(&name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_publish_get() {
        let mut kiosk = VariableKiosk::new();
        let owner: ModelId = "phenology".into();
        let var: VarId = "dvs".into();

        kiosk.register(&owner, var.clone()).unwrap();
        kiosk.publish(&owner, &var, Value::Scalar(0.3)).unwrap();

        assert_eq!(kiosk.get_scalar(&var).unwrap(), 0.3);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut kiosk = VariableKiosk::new();
        let var: VarId = "dvs".into();

        kiosk.register(&"phenology".into(), var.clone()).unwrap();
        let err = kiosk.register(&"intruder".into(), var).unwrap_err();
        assert!(matches!(err, Error::VariableAlreadyRegistered { .. }));
    }

    #[test]
    fn test_non_owner_cannot_publish() {
        let mut kiosk = VariableKiosk::new();
        let var: VarId = "dvs".into();

        kiosk.register(&"phenology".into(), var.clone()).unwrap();
        let err = kiosk
            .publish(&"intruder".into(), &var, Value::Scalar(1.0))
            .unwrap_err();
        assert!(matches!(err, Error::NotVariableOwner { .. }));
    }

    #[test]
    fn test_missing_variable_is_an_error() {
        let kiosk = VariableKiosk::new();
        let err = kiosk.get(&"unpublished".into()).unwrap_err();
        assert!(matches!(err, Error::VariableNotFound(_)));
    }

    #[test]
    fn test_release_owner_frees_claims() {
        let mut kiosk = VariableKiosk::new();
        let owner: ModelId = "leaf".into();
        let var: VarId = "lai".into();

        kiosk.register(&owner, var.clone()).unwrap();
        kiosk.publish(&owner, &var, Value::Scalar(2.5)).unwrap();
        kiosk.release_owner(&owner);

        assert!(!kiosk.contains(&var));
        // The name is claimable again, e.g. by the next crop cycle.
        kiosk.register(&"leaf2".into(), var).unwrap();
    }
}
