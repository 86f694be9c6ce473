//! Generation state resources, messages and background task components.

use std::path::PathBuf;

use bevy::prelude::*;
use bevy::tasks::Task;
use image::RgbaImage;

use super::collaborators::{AssetHandle, JobHandle, PendingJob};
use super::error::{GenerationError, RemoteError};
use super::status::{JobPoller, JobStatus};

/// Generated thumbnail shown in the result view
#[derive(Debug, Default)]
pub struct GenerationResult {
    pub url: String,
    /// Raw downloaded file, kept for saving to disk
    pub bytes: Option<Vec<u8>>,
    pub image: Option<Handle<Image>>,
    pub fetch_failed: bool,
}

/// State of the reference upload and the generation job for this session.
#[derive(Resource, Default)]
pub struct GenerationState {
    /// Uploaded reference photo
    pub reference: Option<AssetHandle>,
    pub reference_path: Option<PathBuf>,
    pub reference_url: Option<String>,
    /// True while an upload, submission or job is in flight
    pub processing: bool,
    pub job: Option<JobHandle>,
    pub poller: Option<JobPoller>,
    pub result: Option<GenerationResult>,
    /// Persistent notice tied to the running job
    pub job_notice: Option<u64>,
    /// Bumped on every reset so results of abandoned tasks are dropped
    pub epoch: u64,
}

impl GenerationState {
    /// Forget the reference, the job and the result. Stops polling.
    pub fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self {
            epoch,
            ..Default::default()
        };
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }
}

/// The user picked a reference photo from disk
#[derive(Message)]
pub struct ReferencePicked {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

#[derive(Message)]
pub struct GenerateRequested;

/// How much of the session a reset throws away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetKind {
    /// Drop the reference and annotations, abandoning any running job
    Cancel,
    /// Leave the result view and start over
    CreateNew,
}

#[derive(Message)]
pub struct ResetSession(pub ResetKind);

/// The user asked to save the generated thumbnail
#[derive(Message)]
pub struct DownloadResult;

#[derive(Component)]
pub struct UploadReferenceTask {
    pub epoch: u64,
    pub task: Task<Result<AssetHandle, GenerationError>>,
}

#[derive(Component)]
pub struct SubmitTask {
    pub epoch: u64,
    pub task: Task<Result<JobHandle, GenerationError>>,
}

#[derive(Component)]
pub struct StatusTask {
    pub epoch: u64,
    pub task: Task<Result<JobStatus, RemoteError>>,
}

#[derive(Component)]
pub struct PendingJobsTask {
    pub epoch: u64,
    pub task: Task<Result<Vec<PendingJob>, RemoteError>>,
}

/// Download of an image by URL, decoded off the main thread
#[derive(Component)]
pub struct FetchImageTask {
    pub epoch: u64,
    pub purpose: FetchPurpose,
    pub task: Task<Result<(Vec<u8>, RgbaImage), String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPurpose {
    /// Background photo of a resumed job
    Reference,
    /// Generated thumbnail
    Result,
}

#[derive(Component)]
pub struct CreditsTask(pub Task<Result<i64, RemoteError>>);

#[derive(Component)]
pub struct SaveResultTask(pub Task<Result<Option<PathBuf>, String>>);
