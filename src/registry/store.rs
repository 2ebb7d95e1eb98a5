// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Commitment Registry
//!
//! Process-wide store of model commitments. The registry is an explicit
//! object shared by `Arc`, so every test (or tenant) can own an isolated one.
//!
//! ## Update policy
//!
//! `update_model` mutates in place: the model keeps its id, `version` is
//! incremented and the replaced commitment is appended to the model's history.
//! Every mutation runs under the write lock, so concurrent writers to one model
//! are serialized and the owner check always sees the state it mutates.
//! Events are queued under that lock and delivered after it is released.

use chrono::Utc;
use ethers::types::Address;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use super::error::RegistryError;
use super::types::{ModelCommitment, ModelId, ModelRecord, ModelView};
use crate::events::{Event, EventQueue, EventSink};

#[derive(Debug)]
struct ModelEntry {
    record: ModelRecord,
    /// Replaced commitments, oldest first
    previous: Vec<ModelCommitment>,
}

#[derive(Debug)]
struct RegistryState {
    next_id: u64,
    models: HashMap<ModelId, ModelEntry>,
}

pub struct CommitmentRegistry {
    state: RwLock<RegistryState>,
    events: EventQueue,
}

impl CommitmentRegistry {
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                next_id: 1,
                models: HashMap::new(),
            }),
            events: EventQueue::new(events),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RegistryState>, RegistryError> {
        self.state.read().map_err(|_| RegistryError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RegistryState>, RegistryError> {
        self.state.write().map_err(|_| RegistryError::LockPoisoned)
    }

    /// Register a commitment; `caller` becomes the owner
    pub fn register_model(
        &self,
        caller: Address,
        commitment: ModelCommitment,
    ) -> Result<ModelId, RegistryError> {
        commitment.validate()?;

        let mut state = self.write()?;
        let model_id = ModelId(state.next_id);
        state.next_id += 1;

        let now = Utc::now();
        let record = ModelRecord {
            id: model_id,
            commitment: commitment.clone(),
            owner: caller,
            deprecated: false,
            version: 1,
            registered_at: now,
            updated_at: now,
        };
        state.models.insert(
            model_id,
            ModelEntry {
                record,
                previous: Vec::new(),
            },
        );

        info!(
            "📝 Registered model {} (owner {:?}, proof system {})",
            model_id, caller, commitment.proof_system_id
        );
        self.events.enqueue(Event::ModelRegistered {
            model_id,
            owner: caller,
            commitment,
        });
        drop(state);
        self.events.flush();

        Ok(model_id)
    }

    /// Replace the commitment of an existing, non-deprecated model
    pub fn update_model(
        &self,
        caller: Address,
        model_id: ModelId,
        new_commitment: ModelCommitment,
    ) -> Result<(), RegistryError> {
        let mut state = self.write()?;
        let entry = state
            .models
            .get_mut(&model_id)
            .ok_or(RegistryError::ModelNotFound { model_id })?;

        if entry.record.owner != caller {
            warn!("🚫 {:?} tried to update model {} it does not own", caller, model_id);
            return Err(RegistryError::NotModelOwner { model_id, caller });
        }
        if entry.record.deprecated {
            return Err(RegistryError::ModelDeprecated { model_id });
        }
        new_commitment.validate()?;

        let old = std::mem::replace(&mut entry.record.commitment, new_commitment.clone());
        entry.previous.push(old.clone());
        entry.record.version += 1;
        entry.record.updated_at = Utc::now();

        info!(
            "🔄 Updated model {} to version {}",
            model_id, entry.record.version
        );
        self.events.enqueue(Event::ModelUpdated {
            model_id,
            old,
            new: new_commitment,
        });
        drop(state);
        self.events.flush();

        Ok(())
    }

    /// Mark a model deprecated. Idempotent; irreversible.
    pub fn deprecate_model(&self, caller: Address, model_id: ModelId) -> Result<(), RegistryError> {
        let mut state = self.write()?;
        let entry = state
            .models
            .get_mut(&model_id)
            .ok_or(RegistryError::ModelNotFound { model_id })?;

        if entry.record.owner != caller {
            warn!("🚫 {:?} tried to deprecate model {} it does not own", caller, model_id);
            return Err(RegistryError::NotModelOwner { model_id, caller });
        }
        if entry.record.deprecated {
            debug!("Model {} already deprecated", model_id);
            return Ok(());
        }

        entry.record.deprecated = true;
        entry.record.updated_at = Utc::now();

        info!("🗄️  Deprecated model {}", model_id);
        self.events.enqueue(Event::ModelDeprecated { model_id });
        drop(state);
        self.events.flush();

        Ok(())
    }

    pub fn get_model(&self, model_id: ModelId) -> Result<ModelView, RegistryError> {
        let state = self.read()?;
        state
            .models
            .get(&model_id)
            .map(|entry| ModelView::from(&entry.record))
            .ok_or(RegistryError::ModelNotFound { model_id })
    }

    /// Full stored record, including version and timestamps
    pub fn get_record(&self, model_id: ModelId) -> Result<ModelRecord, RegistryError> {
        let state = self.read()?;
        state
            .models
            .get(&model_id)
            .map(|entry| entry.record.clone())
            .ok_or(RegistryError::ModelNotFound { model_id })
    }

    /// Every commitment the model has had, oldest first, current last
    pub fn model_history(&self, model_id: ModelId) -> Result<Vec<ModelCommitment>, RegistryError> {
        let state = self.read()?;
        let entry = state
            .models
            .get(&model_id)
            .ok_or(RegistryError::ModelNotFound { model_id })?;

        let mut history = entry.previous.clone();
        history.push(entry.record.commitment.clone());
        Ok(history)
    }

    /// Models owned by `owner`, in registration order
    pub fn models_owned_by(&self, owner: Address) -> Result<Vec<ModelId>, RegistryError> {
        let state = self.read()?;
        let mut ids: Vec<ModelId> = state
            .models
            .values()
            .filter(|entry| entry.record.owner == owner)
            .map(|entry| entry.record.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    pub fn model_count(&self) -> Result<usize, RegistryError> {
        Ok(self.read()?.models.len())
    }
}
