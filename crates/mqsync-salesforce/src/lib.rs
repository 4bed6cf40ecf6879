//! Object-store collaborator for the payload sync.
//!
//! Opens OAuth sessions (JWT bearer or username-password), runs equality
//! queries rendered as SOQL, and submits sObject collection inserts whose
//! per-record outcomes are returned index-aligned with the request.

pub mod auth;
mod error;
pub mod rest_client;
pub mod soql;
pub mod store;

pub use auth::{
    Authenticator, JwtBearerAuthenticator, JwtBearerCredentials, PasswordAuthenticator,
    PasswordCredentials, SalesforceSession,
};
pub use error::{AuthError, StoreError};
pub use rest_client::{SalesforceClientOptions, SalesforceRestClient, DEFAULT_API_VERSION};
pub use store::{ObjectStore, SalesforceConnector, StoreConnector};
