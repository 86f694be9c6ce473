//! Bevy systems that run uploads, submissions and status polling.
//!
//! Network calls run on the [`AsyncComputeTaskPool`] and are polled each
//! frame with `poll_once`, so the UI thread never blocks. Every task is tagged
//! with the session epoch it was started in; results from an abandoned
//! session are dropped.

use std::sync::Arc;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::tasks::AsyncComputeTaskPool;
use chrono::Utc;
use futures_lite::future;
use image::RgbaImage;

use super::account::Account;
use super::collaborators::{Backend, JobHandle};
use super::error::GenerationError;
use super::http::download_bytes;
use super::orchestrator::{check_access, submit_for_generation, upload_reference};
use super::session::{PersistedSession, SessionStore};
use super::state::{
    CreditsTask, DownloadResult, FetchImageTask, FetchPurpose, GenerateRequested,
    GenerationResult, GenerationState, PendingJobsTask, ReferencePicked, ResetKind, ResetSession,
    SaveResultTask, StatusTask, SubmitTask, UploadReferenceTask,
};
use super::status::{JobPoller, PollOutcome};
use super::RemoteBackend;
use crate::annotate::{AnnotationSettings, ShapeStore, ToolStateMachine};
use crate::canvas::{CanvasBackground, rgba_to_image};
use crate::config::AppConfig;
use crate::constants::RESULT_FILE_NAME;
use crate::export::{LabelFont, Scene, export_png};
use crate::notices::Notices;

/// Canvas resources a session reset or a new background touches.
#[derive(SystemParam)]
pub struct CanvasSession<'w> {
    pub background: ResMut<'w, CanvasBackground>,
    pub store: ResMut<'w, ShapeStore>,
    pub machine: ResMut<'w, ToolStateMachine>,
}

impl CanvasSession<'_> {
    /// Replace the background. Annotations drawn over the old one are dropped.
    pub fn load_background(&mut self, image: RgbaImage) {
        self.background.set(image);
        self.store.clear();
        self.machine.cancel_gesture();
    }

    pub fn clear(&mut self) {
        self.background.clear();
        self.store.clear();
        self.machine.cancel_gesture();
    }
}

const STILL_GENERATING: &str =
    "Your thumbnail is still being generated. You can safely close the app and come back later.";

fn spawn_credit_refresh(commands: &mut Commands, backend: &Arc<dyn Backend>, owner: &str) {
    let backend = Arc::clone(backend);
    let owner = owner.to_string();
    let task = AsyncComputeTaskPool::get().spawn(async move { backend.remaining_credits(&owner) });
    commands.spawn(CreditsTask(task));
}

fn spawn_image_fetch(commands: &mut Commands, epoch: u64, purpose: FetchPurpose, url: String) {
    let task = AsyncComputeTaskPool::get().spawn(async move {
        let bytes = download_bytes(&url).map_err(|e| e.to_string())?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| format!("could not decode image: {}", e))?
            .to_rgba8();
        Ok((bytes, image))
    });
    commands.spawn(FetchImageTask {
        epoch,
        purpose,
        task,
    });
}

/// Take over a job that was submitted earlier and start polling it.
fn adopt_job(
    commands: &mut Commands,
    state: &mut GenerationState,
    canvas: &mut CanvasSession,
    notices: &mut Notices,
    session: PersistedSession,
    policy: super::PollPolicy,
    now: f64,
) {
    info!("Resuming generation job {}", session.job);

    if let Some(path) = session.reference_path.as_ref().filter(|p| p.exists()) {
        match image::open(path) {
            Ok(image) => canvas.load_background(image.to_rgba8()),
            Err(e) => warn!("Could not reload reference image {:?}: {}", path, e),
        }
    } else if let Some(url) = &session.reference_url {
        spawn_image_fetch(commands, state.epoch, FetchPurpose::Reference, url.clone());
    }

    state.reference = Some(session.reference);
    state.reference_path = session.reference_path;
    state.reference_url = session.reference_url;
    state.processing = true;
    state.poller = Some(JobPoller::new(session.job.clone(), policy, now));
    state.job = Some(session.job);
    state.job_notice = Some(notices.persistent_info(STILL_GENERATING));
}

/// Register the user and fetch their credit balance in the background.
fn spawn_account_sync(commands: &mut Commands, backend: &Arc<dyn Backend>, account: &Account) {
    let Some(owner) = account.owner() else {
        debug!("Not signed in; skipping account sync");
        return;
    };

    let client = Arc::clone(backend);
    let owner = owner.to_string();
    let display_name = account.identity.display_name.clone();
    let task = AsyncComputeTaskPool::get().spawn(async move {
        if let Err(e) = client.register_user(&owner, display_name.as_deref()) {
            warn!("Failed to register user with backend: {}", e);
        }
        client.remaining_credits(&owner)
    });
    commands.spawn(CreditsTask(task));
}

/// Apply backend URL and identity from the loaded configuration.
///
/// A new identity or backend is synced right away so the credit balance
/// always belongs to the current user.
pub fn apply_config_to_remote(
    mut commands: Commands,
    config: Res<AppConfig>,
    mut backend: ResMut<RemoteBackend>,
    mut account: ResMut<Account>,
) {
    let backend_changed = backend.base_url != config.data.backend_url;
    if backend_changed {
        *backend = RemoteBackend::from_config(&config.data);
        info!("Using generation backend at {}", config.data.backend_url);
    }
    let identity_changed = account.identity != config.data.identity;
    if identity_changed {
        account.identity = config.data.identity.clone();
        account.credits = None;
    }
    if backend_changed || identity_changed {
        spawn_account_sync(&mut commands, &backend.client, &account);
    }
}

/// Restore a job persisted by an earlier run, or ask the service for one.
#[allow(clippy::too_many_arguments)]
pub fn resume_pending_job(
    mut commands: Commands,
    sessions: Res<SessionStore>,
    config: Res<AppConfig>,
    backend: Res<RemoteBackend>,
    account: Res<Account>,
    time: Res<Time>,
    mut state: ResMut<GenerationState>,
    mut canvas: CanvasSession,
    mut notices: ResMut<Notices>,
) {
    match sessions.load() {
        Ok(Some(session)) => {
            adopt_job(
                &mut commands,
                &mut state,
                &mut canvas,
                &mut notices,
                session,
                config.data.poll_policy(),
                time.elapsed_secs_f64(),
            );
        }
        Ok(None) => {
            if let Some(owner) = account.owner() {
                let client = Arc::clone(&backend.client);
                let owner = owner.to_string();
                let task =
                    AsyncComputeTaskPool::get().spawn(async move { client.pending_jobs(&owner) });
                commands.spawn(PendingJobsTask {
                    epoch: state.epoch,
                    task,
                });
            }
        }
        Err(e) => {
            warn!("Discarding unreadable session file: {}", e);
            if let Err(e) = sessions.clear() {
                error!("Failed to remove session file: {}", e);
            }
        }
    }
}

/// Load a picked photo as the background and upload it as the reference.
#[allow(clippy::too_many_arguments)]
pub fn handle_reference_picked(
    mut commands: Commands,
    mut messages: MessageReader<ReferencePicked>,
    backend: Res<RemoteBackend>,
    account: Res<Account>,
    mut state: ResMut<GenerationState>,
    mut canvas: CanvasSession,
    mut notices: ResMut<Notices>,
) {
    // Only the most recent pick matters
    let Some(picked) = messages.read().last() else {
        return;
    };

    if state.processing {
        notices.info("Please wait for the current upload to finish");
        return;
    }

    let owner = match check_access(&account.identity, account.credits) {
        Ok(owner) => owner,
        Err(e) => {
            notices.report(&e);
            return;
        }
    };

    let image = match image::load_from_memory(&picked.bytes) {
        Ok(image) => image.to_rgba8(),
        Err(e) => {
            warn!("Could not decode {:?}: {}", picked.path, e);
            notices.error(format!("Could not read image: {}", e));
            return;
        }
    };

    let content_type = image::guess_format(&picked.bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
        .to_string();

    state.reset();
    canvas.load_background(image);
    state.reference_path = Some(picked.path.clone());
    state.processing = true;
    info!("Loaded reference image {:?}", picked.path);

    let client = Arc::clone(&backend.client);
    let bytes = picked.bytes.clone();
    let task = AsyncComputeTaskPool::get()
        .spawn(async move { upload_reference(client.as_ref(), &bytes, &content_type, &owner) });
    commands.spawn(UploadReferenceTask {
        epoch: state.epoch,
        task,
    });
}

#[derive(SystemParam)]
pub struct ExportInputs<'w> {
    pub background: Res<'w, CanvasBackground>,
    pub store: Res<'w, ShapeStore>,
    pub settings: Res<'w, AnnotationSettings>,
    pub font: ResMut<'w, LabelFont>,
    pub config: Res<'w, AppConfig>,
}

/// Export the canvas and submit it for generation.
pub fn handle_generate_requested(
    mut commands: Commands,
    mut messages: MessageReader<GenerateRequested>,
    backend: Res<RemoteBackend>,
    account: Res<Account>,
    mut state: ResMut<GenerationState>,
    mut inputs: ExportInputs,
    mut notices: ResMut<Notices>,
) {
    if messages.read().count() == 0 {
        return;
    }

    if state.processing {
        notices.info("A thumbnail is already being generated");
        return;
    }

    if let Err(e) = check_access(&account.identity, account.credits) {
        notices.report(&e);
        return;
    }
    let Some(reference) = state.reference.clone() else {
        notices.report(&GenerationError::MissingReference);
        return;
    };

    inputs.font.warn_if_missing(&inputs.store);
    let style = inputs.settings.snapshot();
    let scene = Scene {
        background: inputs.background.image(),
        shapes: &inputs.store,
        style: &style,
        font: inputs.font.font.as_ref(),
    };
    let exported = match export_png(&scene, inputs.config.data.export_density) {
        Ok(exported) => exported,
        Err(e) => {
            error!("Export failed: {}", e);
            notices.error(format!("Could not export the canvas: {}", e));
            return;
        }
    };

    state.processing = true;
    let client = Arc::clone(&backend.client);
    let task = AsyncComputeTaskPool::get()
        .spawn(async move { submit_for_generation(client.as_ref(), &exported.bytes, &reference) });
    commands.spawn(SubmitTask {
        epoch: state.epoch,
        task,
    });
}

pub fn handle_reset_session(
    mut messages: MessageReader<ResetSession>,
    sessions: Res<SessionStore>,
    mut state: ResMut<GenerationState>,
    mut canvas: CanvasSession,
    mut notices: ResMut<Notices>,
) {
    let Some(ResetSession(kind)) = messages.read().last() else {
        return;
    };

    if let Some(id) = state.job_notice {
        notices.dismiss(id);
    }
    if state.job.is_some() && *kind == ResetKind::Cancel {
        info!("Abandoning job {:?}; it keeps running remotely", state.job);
    }
    if let Err(e) = sessions.clear() {
        error!("Failed to remove session file: {}", e);
    }

    state.reset();
    canvas.clear();
    debug!("Session reset ({:?})", kind);
}

pub fn poll_upload_reference_task(
    mut commands: Commands,
    mut state: ResMut<GenerationState>,
    mut notices: ResMut<Notices>,
    mut tasks: Query<(Entity, &mut UploadReferenceTask)>,
) {
    for (entity, mut upload) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut upload.task)) else {
            continue;
        };
        commands.entity(entity).despawn();

        if !state.is_current(upload.epoch) {
            continue;
        }
        state.processing = false;
        match result {
            Ok(handle) => state.reference = Some(handle),
            Err(e) => {
                notices.report(&e);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn poll_submit_task(
    mut commands: Commands,
    sessions: Res<SessionStore>,
    config: Res<AppConfig>,
    time: Res<Time>,
    mut state: ResMut<GenerationState>,
    mut notices: ResMut<Notices>,
    mut tasks: Query<(Entity, &mut SubmitTask)>,
) {
    for (entity, mut submit) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut submit.task)) else {
            continue;
        };
        commands.entity(entity).despawn();

        if !state.is_current(submit.epoch) {
            continue;
        }
        match result {
            Ok(job) => start_polling(&mut state, &sessions, &mut notices, job, &config, &time),
            Err(e) => {
                state.processing = false;
                notices.report(&e);
            }
        }
    }
}

fn start_polling(
    state: &mut GenerationState,
    sessions: &SessionStore,
    notices: &mut Notices,
    job: JobHandle,
    config: &AppConfig,
    time: &Time,
) {
    let reference = state.reference.clone().unwrap_or_else(|| job.source());
    let session = PersistedSession {
        job: job.clone(),
        reference,
        reference_path: state.reference_path.clone(),
        reference_url: state.reference_url.clone(),
        submitted_at: Utc::now(),
    };
    if let Err(e) = sessions.save(&session) {
        warn!("Could not persist pending job: {}", e);
    }

    state.poller = Some(JobPoller::new(
        job.clone(),
        config.data.poll_policy(),
        time.elapsed_secs_f64(),
    ));
    state.job = Some(job);
    if let Some(id) = state.job_notice.take() {
        notices.dismiss(id);
    }
    state.job_notice = Some(notices.persistent_info(
        "Your thumbnail is being generated. You can safely close the app and come back later.",
    ));
}

/// Start a status query whenever the poller says one is due.
pub fn drive_job_poller(
    mut commands: Commands,
    time: Res<Time>,
    backend: Res<RemoteBackend>,
    mut state: ResMut<GenerationState>,
) {
    let epoch = state.epoch;
    let Some(poller) = state.poller.as_mut() else {
        return;
    };
    if !poller.is_due(time.elapsed_secs_f64()) {
        return;
    }

    poller.begin_query();
    let job = poller.job().clone();
    let client = Arc::clone(&backend.client);
    let task = AsyncComputeTaskPool::get().spawn(async move { client.job_status(&job) });
    commands.spawn(StatusTask { epoch, task });
}

#[allow(clippy::too_many_arguments)]
pub fn poll_status_task(
    mut commands: Commands,
    time: Res<Time>,
    sessions: Res<SessionStore>,
    backend: Res<RemoteBackend>,
    account: Res<Account>,
    mut state: ResMut<GenerationState>,
    mut notices: ResMut<Notices>,
    mut tasks: Query<(Entity, &mut StatusTask)>,
) {
    for (entity, mut status) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut status.task)) else {
            continue;
        };
        commands.entity(entity).despawn();

        if !state.is_current(status.epoch) {
            continue;
        }
        let Some(poller) = state.poller.as_mut() else {
            continue;
        };

        let outcome = poller.finish_query(time.elapsed_secs_f64(), result);
        if outcome == PollOutcome::Continue {
            continue;
        }

        state.poller = None;
        state.processing = false;
        if let Some(id) = state.job_notice.take() {
            notices.dismiss(id);
        }

        match outcome {
            PollOutcome::Completed(url) => {
                info!("Thumbnail ready at {}", url);
                state.job = None;
                spawn_image_fetch(&mut commands, state.epoch, FetchPurpose::Result, url.clone());
                state.result = Some(GenerationResult {
                    url,
                    ..Default::default()
                });
            }
            PollOutcome::Failed => {
                state.job = None;
                notices.report(&GenerationError::RemoteProcessing);
            }
            PollOutcome::Exhausted => {
                // Keep the persisted job so the next start resumes it
                warn!("Stopped polling job {:?} after too many attempts", state.job);
                state.job_notice = Some(notices.persistent_info(
                    "Your thumbnail is still processing. Check back later; it will be picked up on the next start.",
                ));
                continue;
            }
            PollOutcome::Continue => {}
        }

        if let Err(e) = sessions.clear() {
            error!("Failed to remove session file: {}", e);
        }
        if let Some(owner) = account.owner() {
            spawn_credit_refresh(&mut commands, &backend.client, owner);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn poll_pending_jobs_task(
    mut commands: Commands,
    sessions: Res<SessionStore>,
    config: Res<AppConfig>,
    time: Res<Time>,
    mut state: ResMut<GenerationState>,
    mut canvas: CanvasSession,
    mut notices: ResMut<Notices>,
    mut tasks: Query<(Entity, &mut PendingJobsTask)>,
) {
    for (entity, mut pending) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut pending.task)) else {
            continue;
        };
        commands.entity(entity).despawn();

        if !state.is_current(pending.epoch) || state.job.is_some() {
            continue;
        }
        let jobs = match result {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!("Could not look up pending jobs: {}", e);
                continue;
            }
        };
        let Some(job) = jobs.into_iter().next() else {
            continue;
        };

        let session = PersistedSession {
            job: JobHandle::for_source(&job.source),
            reference: job.source,
            reference_path: None,
            reference_url: job.original_image_url,
            submitted_at: Utc::now(),
        };
        if let Err(e) = sessions.save(&session) {
            warn!("Could not persist pending job: {}", e);
        }
        adopt_job(
            &mut commands,
            &mut state,
            &mut canvas,
            &mut notices,
            session,
            config.data.poll_policy(),
            time.elapsed_secs_f64(),
        );
    }
}

#[allow(clippy::too_many_arguments)]
pub fn poll_fetch_image_task(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    mut state: ResMut<GenerationState>,
    mut canvas: CanvasSession,
    mut notices: ResMut<Notices>,
    mut tasks: Query<(Entity, &mut FetchImageTask)>,
) {
    for (entity, mut fetch) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut fetch.task)) else {
            continue;
        };
        commands.entity(entity).despawn();

        if !state.is_current(fetch.epoch) {
            continue;
        }
        match (fetch.purpose, result) {
            (FetchPurpose::Reference, Ok((_, image))) => {
                if !canvas.background.is_loaded() {
                    canvas.load_background(image);
                }
            }
            (FetchPurpose::Reference, Err(e)) => {
                warn!("Could not fetch reference image: {}", e);
            }
            (FetchPurpose::Result, Ok((bytes, image))) => {
                if let Some(result) = state.result.as_mut() {
                    result.image = Some(images.add(rgba_to_image(&image)));
                    result.bytes = Some(bytes);
                }
            }
            (FetchPurpose::Result, Err(e)) => {
                warn!("Could not fetch generated thumbnail: {}", e);
                notices.error("Could not load the generated thumbnail preview");
                if let Some(result) = state.result.as_mut() {
                    result.fetch_failed = true;
                }
            }
        }
    }
}

pub fn poll_credits_task(
    mut commands: Commands,
    mut account: ResMut<Account>,
    mut tasks: Query<(Entity, &mut CreditsTask)>,
) {
    for (entity, mut credits) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut credits.0)) else {
            continue;
        };
        commands.entity(entity).despawn();
        match result {
            Ok(remaining) => {
                debug!("Remaining credits: {}", remaining);
                account.credits = Some(remaining);
            }
            Err(e) => warn!("Could not fetch remaining credits: {}", e),
        }
    }
}

/// Ask where to save the generated thumbnail and write it there.
pub fn handle_download_result(
    mut commands: Commands,
    mut messages: MessageReader<DownloadResult>,
    state: Res<GenerationState>,
    mut notices: ResMut<Notices>,
    pending: Query<(), With<SaveResultTask>>,
) {
    if messages.read().count() == 0 || !pending.is_empty() {
        return;
    }
    let Some(result) = state.result.as_ref() else {
        return;
    };

    let url = result.url.clone();
    let cached = result.bytes.clone();
    if cached.is_none() && result.fetch_failed {
        notices.info("Downloading the thumbnail again");
    }

    let task = AsyncComputeTaskPool::get().spawn(async move {
        let Some(handle) = rfd::AsyncFileDialog::new()
            .set_title("Save Thumbnail")
            .set_file_name(RESULT_FILE_NAME)
            .add_filter("PNG image", &["png"])
            .save_file()
            .await
        else {
            return Ok(None);
        };
        let bytes = match cached {
            Some(bytes) => bytes,
            None => download_bytes(&url).map_err(|e| e.to_string())?,
        };
        let path = handle.path().to_path_buf();
        std::fs::write(&path, bytes).map_err(|e| format!("could not write {:?}: {}", path, e))?;
        Ok(Some(path))
    });
    commands.spawn(SaveResultTask(task));
}

pub fn poll_save_result_task(
    mut commands: Commands,
    mut notices: ResMut<Notices>,
    mut tasks: Query<(Entity, &mut SaveResultTask)>,
) {
    for (entity, mut save) in tasks.iter_mut() {
        let Some(result) = future::block_on(future::poll_once(&mut save.0)) else {
            continue;
        };
        commands.entity(entity).despawn();
        match result {
            Ok(Some(path)) => {
                info!("Saved thumbnail to {:?}", path);
                notices.info(format!("Saved thumbnail to {}", path.display()));
            }
            Ok(None) => {}
            Err(e) => {
                error!("Failed to save thumbnail: {}", e);
                notices.error(format!("Failed to save thumbnail: {}", e));
            }
        }
    }
}
