// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore backend.
//!
//! Thin typed wrapper over the fluent Firestore API. Documents are
//! serialized with their serde field names (camelCase), matching the
//! shapes the mobile and admin clients read directly.

use crate::error::AppError;
use serde::{de::DeserializeOwned, Serialize};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreBackend {
    client: firestore::FirestoreDb,
}

impl FirestoreBackend {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    pub async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn list<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.client
            .fluent()
            .select()
            .from(collection)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Documents whose string field `field` equals `value`.
    pub async fn list_where_eq<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let field = field.to_string();
        let value = value.to_string();

        self.client
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.for_all([q.field(field.as_str()).eq(value.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn set<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Read a document, compute its replacement, and commit it in a transaction.
    ///
    /// The read is made inside the transaction, so a concurrent write to the
    /// same document makes the commit fail with `AppError::Conflict` instead
    /// of being overwritten. If `apply` rejects the current state the
    /// transaction is rolled back and nothing is written.
    pub async fn update_with<T, F>(&self, collection: &str, id: &str, apply: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned + Sync + Send,
        F: FnOnce(Option<T>) -> Result<T, AppError>,
    {
        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let tx_db = self.client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let read: Result<Option<T>, _> = tx_db
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await;

        let current = match read {
            Ok(current) => current,
            Err(e) => {
                rollback(transaction, collection, id).await;
                return Err(transaction_error(
                    format!("Failed to read {} in transaction", collection),
                    e,
                ));
            }
        };

        let next = match apply(current) {
            Ok(next) => next,
            Err(err) => {
                rollback(transaction, collection, id).await;
                return Err(err);
            }
        };

        self.client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(&next)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to add {} write to transaction: {}",
                    collection, e
                ))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| transaction_error("Transaction commit failed".to_string(), e))?;

        Ok(next)
    }
}

async fn rollback(transaction: firestore::FirestoreTransaction<'_>, collection: &str, id: &str) {
    if let Err(e) = transaction.rollback().await {
        tracing::warn!(collection, id, error = %e, "Transaction rollback failed");
    }
}

/// Contention aborts become conflicts so callers can retry the whole
/// read-modify-write.
fn transaction_error(context: String, e: firestore::errors::FirestoreError) -> AppError {
    match e {
        firestore::errors::FirestoreError::DatabaseError(ref db) if db.public.code == "Aborted" => {
            AppError::Conflict(format!("{}: transaction aborted by contention", context))
        }
        e => AppError::Database(format!("{}: {}", context, e)),
    }
}
