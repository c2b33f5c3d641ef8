use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{ClientError, Result};
use crate::ue::UserEquipment;

/// All UEs this process hosts, keyed by IMSI. Reads take the shared lock;
/// add/remove take the exclusive lock, per spec.md §5's concurrency
/// discipline.
#[derive(Default)]
pub struct UeRegistry {
    ues: RwLock<HashMap<String, UserEquipment>>,
}

impl UeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, ue: UserEquipment) {
        self.ues.write().insert(ue.imsi.clone(), ue);
    }

    pub fn remove(&self, imsi: &str) -> Option<UserEquipment> {
        self.ues.write().remove(imsi)
    }

    pub fn contains(&self, imsi: &str) -> bool {
        self.ues.read().contains_key(imsi)
    }

    pub fn with_ue<T>(&self, imsi: &str, f: impl FnOnce(&UserEquipment) -> T) -> Result<T> {
        let ues = self.ues.read();
        let ue = ues.get(imsi).ok_or_else(|| ClientError::UnknownUe(imsi.to_string()))?;
        Ok(f(ue))
    }

    pub fn with_ue_mut<T>(&self, imsi: &str, f: impl FnOnce(&mut UserEquipment) -> T) -> Result<T> {
        let mut ues = self.ues.write();
        let ue = ues.get_mut(imsi).ok_or_else(|| ClientError::UnknownUe(imsi.to_string()))?;
        Ok(f(ue))
    }

    pub fn len(&self) -> usize {
        self.ues.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ues.read().is_empty()
    }
}
