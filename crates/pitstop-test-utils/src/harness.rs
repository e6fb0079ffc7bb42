// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end survey tests.
//!
//! `TestHarness` assembles temp SQLite storage, a [`MockProvider`] and a
//! [`MockChannel`], plus helpers for seeding customers and visits. The
//! survey service itself is built by the calling test from these parts.

use std::sync::Arc;

use pitstop_config::model::{PitstopConfig, StorageConfig};
use pitstop_core::records::{Customer, NewCustomer, NewServiceVisit, ServiceVisit};
use pitstop_core::{Language, PitstopError, StorageAdapter};
use pitstop_storage::SqliteStorage;

use crate::mock_channel::MockChannel;
use crate::mock_provider::MockProvider;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    config: PitstopConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            config: PitstopConfig::default(),
        }
    }

    /// Set mock provider responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Start from a custom configuration. The storage path is always replaced.
    pub fn with_config(mut self, config: PitstopConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the dealership name used in greetings.
    pub fn with_dealership(mut self, name: &str) -> Self {
        self.config.dealership.name = name.to_string();
        self
    }

    /// Build the test harness, creating the temp database.
    pub async fn build(self) -> Result<TestHarness, PitstopError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| PitstopError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        config.sms.from_number = Some("+15559990000".to_string());

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;

        Ok(TestHarness {
            mock_provider: Arc::new(MockProvider::with_responses(self.responses)),
            mock_channel: Arc::new(MockChannel::new()),
            storage: Arc::new(storage),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    /// The mock generative provider.
    pub mock_provider: Arc<MockProvider>,
    /// The mock SMS channel.
    pub mock_channel: Arc<MockChannel>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<dyn StorageAdapter>,
    /// Effective configuration.
    pub config: PitstopConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Insert a customer with the given phone and preferred language.
    pub async fn add_customer(
        &self,
        phone: &str,
        language: Language,
    ) -> Result<Customer, PitstopError> {
        self.storage
            .create_customer(&NewCustomer {
                first_name: "Test".to_string(),
                last_name: "Customer".to_string(),
                email: None,
                phone: phone.to_string(),
                preferred_language: language,
            })
            .await
    }

    /// Insert a visit for `customer_id`, completed at `completed_at` when given.
    pub async fn add_visit(
        &self,
        customer_id: i64,
        completed_at: Option<&str>,
    ) -> Result<ServiceVisit, PitstopError> {
        let service_date = completed_at
            .and_then(|ts| ts.get(..10))
            .unwrap_or("2026-03-01")
            .to_string();
        self.storage
            .create_service_visit(&NewServiceVisit {
                customer_id,
                service_date,
                service_type: "Oil change".to_string(),
                vehicle_make: Some("Honda".to_string()),
                vehicle_model: Some("Civic".to_string()),
                vehicle_year: Some(2020),
                vin: None,
                service_advisor: Some("Maria".to_string()),
                technician: Some("Dev".to_string()),
                completed_at: completed_at.map(str::to_string),
            })
            .await
    }

    /// A customer plus one visit, ready for `send_initial_survey`.
    pub async fn customer_with_visit(
        &self,
        phone: &str,
        language: Language,
    ) -> Result<(Customer, ServiceVisit), PitstopError> {
        let customer = self.add_customer(phone, language).await?;
        let visit = self
            .add_visit(customer.id, Some("2026-03-01T15:00:00.000Z"))
            .await?;
        Ok((customer, visit))
    }

    /// Add a response to the mock provider's queue.
    pub async fn add_provider_response(&self, text: impl Into<String>) {
        self.mock_provider.add_response(text).await;
    }
}
