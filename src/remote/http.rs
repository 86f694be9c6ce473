//! JSON-over-HTTP implementation of every collaborator.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::collaborators::{
    AssetHandle, AssetStorage, EntitlementLedger, GenerationService, JobAck, JobHandle,
    MetadataRegistry, PendingJob, UploadTarget,
};
use super::error::RemoteError;
use super::status::JobStatus;

const USER_AGENT: &str = concat!("thumbforge/", env!("CARGO_PKG_VERSION"));

pub struct HttpBackend {
    base_url: String,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlResponse {
    upload_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredResponse {
    storage_id: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    success: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageDetails {
    status: String,
    #[serde(default)]
    cartoon_image_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessingImage {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    original_storage_id: Option<String>,
    #[serde(default)]
    original_image_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreditsResponse {
    remaining_credits: i64,
}

impl From<ureq::Error> for RemoteError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => RemoteError::Status {
                status,
                message: response
                    .into_string()
                    .unwrap_or_else(|_| "<unreadable body>".to_string()),
            },
            ureq::Error::Transport(transport) => RemoteError::Transport(transport.to_string()),
        }
    }
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let response = self.agent.get(&self.url(path)).call()?;
        decode(response)
    }

    fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, RemoteError> {
        let response = self.agent.post(&self.url(path)).send_json(body)?;
        decode(response)
    }

    /// POST and ignore the response body
    fn post_only(&self, path: &str, body: serde_json::Value) -> Result<(), RemoteError> {
        self.agent.post(&self.url(path)).send_json(body)?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, RemoteError> {
    response
        .into_json::<T>()
        .map_err(|e| RemoteError::Decode(e.to_string()))
}

/// Map the service's status vocabulary onto [`JobStatus`].
fn parse_status(details: ImageDetails) -> Result<JobStatus, RemoteError> {
    match details.status.as_str() {
        "pending" => Ok(JobStatus::Pending),
        "processing" => Ok(JobStatus::Processing),
        // A completed record without its URL is still being finalised
        "completed" => Ok(match details.cartoon_image_url {
            Some(result_url) if !result_url.is_empty() => JobStatus::Completed { result_url },
            _ => JobStatus::Processing,
        }),
        "error" | "failed" => Ok(JobStatus::Failed),
        other => Err(RemoteError::Decode(format!("unknown job status '{}'", other))),
    }
}

impl AssetStorage for HttpBackend {
    fn request_upload_slot(&self) -> Result<UploadTarget, RemoteError> {
        let response: UploadUrlResponse = self.post_json("upload-url", json!({}))?;
        Ok(UploadTarget {
            url: response.upload_url,
        })
    }

    fn transfer(
        &self,
        target: &UploadTarget,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<AssetHandle, RemoteError> {
        let response = self
            .agent
            .post(&target.url)
            .set("Content-Type", content_type)
            .send_bytes(bytes)?;
        let stored: StoredResponse = decode(response)?;
        Ok(AssetHandle(stored.storage_id))
    }
}

impl MetadataRegistry for HttpBackend {
    fn record_upload(&self, handle: &AssetHandle, owner_id: &str) -> Result<(), RemoteError> {
        self.post_only(
            "images/uploaded",
            json!({ "storageId": handle.0, "userId": owner_id }),
        )
    }

    fn link_derived_asset(
        &self,
        derived: &AssetHandle,
        source: &AssetHandle,
    ) -> Result<(), RemoteError> {
        self.post_only(
            "images/merged",
            json!({ "storageId": derived.0, "referenceStorageId": source.0 }),
        )
    }
}

impl GenerationService for HttpBackend {
    fn submit_job(&self, source: &AssetHandle) -> Result<JobAck, RemoteError> {
        let response: SubmitResponse = self.post_json("thumbnails", json!({ "storageId": source.0 }))?;
        Ok(JobAck {
            success: response.success,
        })
    }

    fn job_status(&self, job: &JobHandle) -> Result<JobStatus, RemoteError> {
        let details: ImageDetails = self.get_json(&format!("images/{}", job.0))?;
        parse_status(details)
    }

    fn pending_jobs(&self, owner_id: &str) -> Result<Vec<PendingJob>, RemoteError> {
        let images: Vec<ProcessingImage> =
            self.get_json(&format!("users/{}/processing", owner_id))?;
        Ok(images
            .into_iter()
            .filter(|image| image.kind.as_deref().is_none_or(|kind| kind == "thumbnail"))
            .filter_map(|image| {
                Some(PendingJob {
                    source: AssetHandle(image.original_storage_id?),
                    original_image_url: image.original_image_url,
                })
            })
            .collect())
    }
}

impl EntitlementLedger for HttpBackend {
    fn remaining_credits(&self, owner_id: &str) -> Result<i64, RemoteError> {
        let response: CreditsResponse = self.get_json(&format!("users/{}/credits", owner_id))?;
        Ok(response.remaining_credits)
    }

    fn register_user(&self, owner_id: &str, display_name: Option<&str>) -> Result<(), RemoteError> {
        self.post_only("users", json!({ "userId": owner_id, "name": display_name }))
    }
}

/// Fetch a file over HTTP into memory.
pub fn download_bytes(url: &str) -> Result<Vec<u8>, RemoteError> {
    let response = ureq::get(url).set("User-Agent", USER_AGENT).call()?;
    let mut bytes = Vec::new();
    std::io::Read::read_to_end(&mut response.into_reader(), &mut bytes)
        .map_err(|e| RemoteError::Transport(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(status: &str, url: Option<&str>) -> ImageDetails {
        ImageDetails {
            status: status.to_string(),
            cartoon_image_url: url.map(str::to_string),
        }
    }

    #[test]
    fn test_status_vocabulary() {
        assert_eq!(parse_status(details("pending", None)), Ok(JobStatus::Pending));
        assert_eq!(parse_status(details("processing", None)), Ok(JobStatus::Processing));
        assert_eq!(parse_status(details("error", None)), Ok(JobStatus::Failed));
        assert_eq!(
            parse_status(details("completed", Some("https://cdn/x.png"))),
            Ok(JobStatus::Completed {
                result_url: "https://cdn/x.png".into()
            })
        );
    }

    #[test]
    fn test_completed_without_url_keeps_processing() {
        assert_eq!(parse_status(details("completed", None)), Ok(JobStatus::Processing));
        assert_eq!(parse_status(details("completed", Some(""))), Ok(JobStatus::Processing));
    }

    #[test]
    fn test_unknown_status_is_decode_error() {
        assert!(matches!(
            parse_status(details("queued-ish", None)),
            Err(RemoteError::Decode(_))
        ));
    }

    #[test]
    fn test_image_details_parse_camel_case() {
        let json = r#"{"status":"completed","cartoonImageUrl":"https://cdn/y.png","extra":1}"#;
        let parsed: ImageDetails = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.cartoon_image_url.as_deref(), Some("https://cdn/y.png"));
    }

    #[test]
    fn test_url_joining_trims_slashes() {
        let backend = HttpBackend::new("https://api.example.com/", Duration::from_secs(5));
        assert_eq!(backend.url("/upload-url"), "https://api.example.com/upload-url");
        assert_eq!(backend.url("images/abc"), "https://api.example.com/images/abc");
    }
}
