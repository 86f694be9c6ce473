//! Reference upload, thumbnail generation and job status polling.
//!
//! ## Module Structure
//!
//! - [`collaborators`] - Traits for storage, metadata, generation and credits
//! - [`orchestrator`] - Upload and submission workflows over those traits
//! - [`status`] - Job status and the bounded polling schedule
//! - [`http`] - `ureq` implementation of every collaborator
//! - [`session`] - `session.json` persistence of the pending job
//! - [`account`] - Identity and credit balance
//! - [`state`] - Resources, messages and task components
//! - [`systems`] - Bevy systems tying it together

pub mod account;
pub mod collaborators;
mod error;
pub mod http;
pub mod orchestrator;
pub mod session;
pub mod state;
pub mod status;
mod systems;


use std::sync::Arc;

use bevy::prelude::*;

use crate::config::{AppConfig, AppConfigData, ConfigLoaded};

pub use account::{Account, Identity};
pub use error::GenerationError;
pub use state::{DownloadResult, GenerateRequested, GenerationState, ReferencePicked, ResetKind, ResetSession};
pub use status::PollPolicy;

use collaborators::Backend;
use http::HttpBackend;
use session::SessionStore;

/// Backend every network task talks to.
#[derive(Resource, Clone)]
pub struct RemoteBackend {
    pub client: Arc<dyn Backend>,
    pub base_url: String,
}

impl RemoteBackend {
    pub fn from_config(config: &AppConfigData) -> Self {
        let timeout = config.request_timeout();
        Self {
            client: Arc::new(HttpBackend::new(&config.backend_url, timeout)),
            base_url: config.backend_url.clone(),
        }
    }
}

impl Default for RemoteBackend {
    fn default() -> Self {
        Self::from_config(&AppConfigData::default())
    }
}

pub struct GenerationPlugin;

impl Plugin for GenerationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RemoteBackend>()
            .init_resource::<Account>()
            .init_resource::<GenerationState>()
            .init_resource::<SessionStore>()
            .add_message::<ReferencePicked>()
            .add_message::<GenerateRequested>()
            .add_message::<ResetSession>()
            .add_message::<DownloadResult>()
            .add_systems(
                Startup,
                (systems::apply_config_to_remote, systems::resume_pending_job)
                    .chain()
                    .after(ConfigLoaded),
            )
            .add_systems(
                Update,
                systems::apply_config_to_remote.run_if(resource_changed::<AppConfig>),
            )
            .add_systems(
                Update,
                (
                    systems::handle_reset_session.run_if(on_message::<ResetSession>),
                    systems::handle_reference_picked.run_if(on_message::<ReferencePicked>),
                    systems::handle_generate_requested.run_if(on_message::<GenerateRequested>),
                    systems::handle_download_result.run_if(on_message::<DownloadResult>),
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    systems::poll_upload_reference_task,
                    systems::poll_submit_task,
                    systems::drive_job_poller,
                    systems::poll_status_task,
                    systems::poll_pending_jobs_task,
                    systems::poll_fetch_image_task,
                    systems::poll_credits_task,
                    systems::poll_save_result_task,
                ),
            );
    }
}
