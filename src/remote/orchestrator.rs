//! Upload and generation workflows.
//!
//! These functions block on the network and are meant to run on a task pool.
//! Collaborator failures are mapped to the step they happened in: storage
//! failures become [`GenerationError::Upload`], registry and generation
//! failures become [`GenerationError::Submission`].

use bevy::log::{debug, info, warn};

use super::collaborators::{
    AssetHandle, AssetStorage, GenerationService, IdentityProvider, JobHandle, MetadataRegistry,
};
use super::error::GenerationError;
use crate::constants::EXPORT_CONTENT_TYPE;

/// Gate an operation on sign-in and remaining credits.
///
/// Unknown credits (not fetched yet) do not block. Returns the owner id.
pub fn check_access(
    identity: &dyn IdentityProvider,
    remaining_credits: Option<i64>,
) -> Result<String, GenerationError> {
    let owner = match identity.user_id() {
        Some(id) if identity.is_signed_in() && !id.is_empty() => id.to_string(),
        _ => return Err(GenerationError::AuthRequired),
    };
    if remaining_credits.is_some_and(|credits| credits <= 0) {
        return Err(GenerationError::InsufficientCredits);
    }
    Ok(owner)
}

fn store_bytes<B>(backend: &B, bytes: &[u8], content_type: &str) -> Result<AssetHandle, GenerationError>
where
    B: AssetStorage + ?Sized,
{
    let target = backend
        .request_upload_slot()
        .map_err(|e| GenerationError::Upload(e.to_string()))?;
    let handle = backend
        .transfer(&target, bytes, content_type)
        .map_err(|e| GenerationError::Upload(e.to_string()))?;
    debug!("Stored {} bytes as {}", bytes.len(), handle);
    Ok(handle)
}

/// Upload the reference photo and record it for `owner_id`.
pub fn upload_reference<B>(
    backend: &B,
    bytes: &[u8],
    content_type: &str,
    owner_id: &str,
) -> Result<AssetHandle, GenerationError>
where
    B: AssetStorage + MetadataRegistry + ?Sized,
{
    let handle = store_bytes(backend, bytes, content_type)?;
    backend
        .record_upload(&handle, owner_id)
        .map_err(|e| GenerationError::Upload(e.to_string()))?;
    info!("Uploaded reference image {}", handle);
    Ok(handle)
}

/// Upload the exported composition and start a generation job for `original`.
///
/// The returned job handle is the reference handle; status queries use it.
pub fn submit_for_generation<B>(
    backend: &B,
    exported: &[u8],
    original: &AssetHandle,
) -> Result<JobHandle, GenerationError>
where
    B: AssetStorage + MetadataRegistry + GenerationService + ?Sized,
{
    let derived = store_bytes(backend, exported, EXPORT_CONTENT_TYPE)?;

    backend
        .link_derived_asset(&derived, original)
        .map_err(|e| GenerationError::Submission(e.to_string()))?;

    let ack = backend
        .submit_job(original)
        .map_err(|e| GenerationError::Submission(e.to_string()))?;
    if !ack.success {
        warn!("Generation request for {} was rejected", original);
        return Err(GenerationError::Submission(
            "the service rejected the request".to_string(),
        ));
    }

    info!("Submitted generation job for {}", original);
    Ok(JobHandle::for_source(original))
}
