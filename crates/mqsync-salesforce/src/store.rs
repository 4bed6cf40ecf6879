//! Object-store seams used by the sync runtime.

use std::sync::Arc;

use async_trait::async_trait;
use mqsync_core::{FieldMap, Insertable, QueryRequest, SyncOutcome};

use crate::{
    AuthError, Authenticator, SalesforceClientOptions, SalesforceRestClient, StoreError,
};

#[async_trait]
/// Trait contract for `ObjectStore` behavior.
pub trait ObjectStore: Send + Sync {
    /// Returns every record matching the request, in store order.
    async fn query(&self, request: &QueryRequest) -> Result<Vec<FieldMap>, StoreError>;

    /// Inserts records independently of each other. Outcomes are index-aligned
    /// with `records`.
    async fn insert_collection(
        &self,
        records: &[&dyn Insertable],
    ) -> Result<Vec<SyncOutcome>, StoreError>;
}

#[async_trait]
/// Trait contract for opening an authenticated store handle.
pub trait StoreConnector: Send + Sync {
    async fn open_store(&self) -> Result<Arc<dyn ObjectStore>, AuthError>;
}

pub struct SalesforceConnector {
    authenticator: Arc<dyn Authenticator>,
    options: SalesforceClientOptions,
}

impl SalesforceConnector {
    pub fn new(authenticator: Arc<dyn Authenticator>, options: SalesforceClientOptions) -> Self {
        Self {
            authenticator,
            options,
        }
    }
}

#[async_trait]
impl StoreConnector for SalesforceConnector {
    async fn open_store(&self) -> Result<Arc<dyn ObjectStore>, AuthError> {
        let session = self.authenticator.authenticate().await?;
        let client = SalesforceRestClient::new(session, self.options.clone())
            .map_err(|error| match error {
                StoreError::Http(error) => AuthError::Http(error),
                other => AuthError::InvalidResponse(other.to_string()),
            })?;
        Ok(Arc::new(client))
    }
}
