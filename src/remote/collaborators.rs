//! Interfaces of the external services the orchestrator drives.
//!
//! Each collaborator is a trait so the orchestrator can run against the HTTP
//! backend in the app and against in-memory fakes in tests.

use serde::{Deserialize, Serialize};

use super::error::RemoteError;
use super::status::JobStatus;

/// Single-use upload destination handed out by asset storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub url: String,
}

/// Opaque id of a stored asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle(pub String);

/// Id used to observe a generation job. It is the handle of the uploaded
/// reference image the job was submitted for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(pub String);

impl JobHandle {
    pub fn for_source(source: &AssetHandle) -> Self {
        Self(source.0.clone())
    }

    pub fn source(&self) -> AssetHandle {
        AssetHandle(self.0.clone())
    }
}

impl std::fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Acknowledgement of a generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobAck {
    pub success: bool,
}

/// A job the service still considers in flight for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingJob {
    pub source: AssetHandle,
    pub original_image_url: Option<String>,
}

pub trait AssetStorage: Send + Sync {
    fn request_upload_slot(&self) -> Result<UploadTarget, RemoteError>;

    fn transfer(
        &self,
        target: &UploadTarget,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<AssetHandle, RemoteError>;
}

pub trait MetadataRegistry: Send + Sync {
    fn record_upload(&self, handle: &AssetHandle, owner_id: &str) -> Result<(), RemoteError>;

    /// Mark `derived` as produced from `source`.
    fn link_derived_asset(
        &self,
        derived: &AssetHandle,
        source: &AssetHandle,
    ) -> Result<(), RemoteError>;
}

pub trait GenerationService: Send + Sync {
    fn submit_job(&self, source: &AssetHandle) -> Result<JobAck, RemoteError>;

    fn job_status(&self, job: &JobHandle) -> Result<JobStatus, RemoteError>;

    fn pending_jobs(&self, owner_id: &str) -> Result<Vec<PendingJob>, RemoteError>;
}

pub trait EntitlementLedger: Send + Sync {
    fn remaining_credits(&self, owner_id: &str) -> Result<i64, RemoteError>;

    /// Make sure the backend knows about this user. Called once at startup.
    fn register_user(&self, owner_id: &str, display_name: Option<&str>) -> Result<(), RemoteError>;
}

/// Who is using the app. Sign-in itself happens elsewhere.
pub trait IdentityProvider {
    fn is_signed_in(&self) -> bool;

    fn user_id(&self) -> Option<&str>;

    fn display_name(&self) -> Option<&str>;
}

/// Every remote collaborator behind one object.
pub trait Backend: AssetStorage + MetadataRegistry + GenerationService + EntitlementLedger {}

impl<T> Backend for T where T: AssetStorage + MetadataRegistry + GenerationService + EntitlementLedger {}
