//! Registration sink that records submissions in a key-value store
//!
//! Each record is stored as JSON under `registration_{id}`. A second
//! submission for a mobile number already on file is refused.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

use hp_core::domain::entities::{ChannelKind, RegistrationRecord};
use hp_core::services::registration::RegistrationSinkTrait;
use hp_core::services::verification::KeyValueStoreTrait;

const RECORD_PREFIX: &str = "registration_";
const MOBILE_INDEX_PREFIX: &str = "registrationMobile_";

pub struct KeyValueRegistrationSink<K: KeyValueStoreTrait> {
    store: Arc<K>,
}

impl<K: KeyValueStoreTrait> KeyValueRegistrationSink<K> {
    pub fn new(store: Arc<K>) -> Self {
        Self { store }
    }

    pub fn record_key(id: &str) -> String {
        format!("{}{}", RECORD_PREFIX, id)
    }

    fn mobile_key(mobile: &str) -> String {
        format!("{}{}", MOBILE_INDEX_PREFIX, mobile)
    }

    /// Load a stored record by id
    pub async fn find(&self, id: &str) -> Result<Option<RegistrationRecord>, String> {
        match self.store.get(&Self::record_key(id)).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| format!("Corrupt registration {}: {}", id, e)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<K: KeyValueStoreTrait> RegistrationSinkTrait for KeyValueRegistrationSink<K> {
    async fn submit_registration(&self, record: &RegistrationRecord) -> Result<String, String> {
        let masked = ChannelKind::Mobile.mask(&record.mobile);
        let mobile_key = Self::mobile_key(&record.mobile);

        if self.store.get(&mobile_key).await?.is_some() {
            warn!(event = "registration_duplicate", mobile = %masked, "Mobile number already registered");
            return Err("Mobile number is already registered".to_string());
        }

        let id = record.id.to_string();
        let json = serde_json::to_string(record).map_err(|e| e.to_string())?;
        self.store.set(&Self::record_key(&id), &json).await.map_err(|e| {
            error!(event = "registration_store_failed", mobile = %masked, error = %e, "Failed to store registration");
            e
        })?;
        self.store.set(&mobile_key, &id).await?;

        info!(event = "registration_stored", registration_id = %id, mobile = %masked, "Registration stored");
        Ok(id)
    }
}
