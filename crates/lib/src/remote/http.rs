//! HTTP client for the Schol-AR REST API.

use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response,
    header::AUTHORIZATION,
    multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::{
    RemoteApi, RemoteError, RetryPolicy,
    protocol::{
        AugmentationListing, CreateAugmentationRequest, CreateProjectRequest, ProjectListing,
        QrLinks, edit_field_name,
    },
};
use crate::{
    Result,
    config::ClientConfig,
    model::{AugmentationKind, Credential, FileKind, ProjectType, RemoteId},
    validation::ValidationError,
};

/// [`RemoteApi`] over HTTPS with token authentication.
///
/// Reads are retried according to the configured [`RetryPolicy`]; creations
/// and uploads are sent exactly once.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpRemote {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Unreachable {
                operation: "set up the HTTP client".to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            retry: config.retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder, credential: &Credential) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Token {}", credential.expose()))
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;
        let status = response.status();
        if !status.is_success() {
            debug!(operation, %status, "Schol-AR request failed");
            return Err(RemoteError::from_status(operation, status.as_u16()).into());
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        credential: &Credential,
    ) -> Result<T> {
        self.retry
            .run(operation, move || async move {
                let request = self.authorized(self.client.get(self.endpoint(path)), credential);
                let response = self.send(operation, request).await?;
                decode(operation, response).await
            })
            .await
    }

    async fn find_project_by_title(
        &self,
        credential: &Credential,
        title: &str,
    ) -> Result<Option<ProjectListing>> {
        Ok(self
            .list_projects(credential)
            .await?
            .into_iter()
            .rev()
            .find(|p| p.project_title == title))
    }

    async fn find_augmentation_by_title(
        &self,
        credential: &Credential,
        project: &RemoteId,
        title: &str,
    ) -> Result<Option<AugmentationListing>> {
        Ok(self
            .list_augmentations(credential, project)
            .await?
            .into_iter()
            .rev()
            .find(|a| a.augmentation_title == title))
    }
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn validate_credential(&self, credential: &Credential) -> Result<bool> {
        match self.list_projects(credential).await {
            Ok(_) => Ok(true),
            Err(crate::Error::Remote(err)) if err.is_unauthorized() => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn list_projects(&self, credential: &Credential) -> Result<Vec<ProjectListing>> {
        self.get_json("list projects", "ListARP", credential).await
    }

    async fn create_project(
        &self,
        credential: &Credential,
        title: &str,
        project_type: ProjectType,
        url: &str,
    ) -> Result<ProjectListing> {
        let operation = "create a project";
        let body = CreateProjectRequest {
            project_title: title.to_string(),
            project_type,
            disc_url: url.to_string(),
        };
        let request = self.authorized(self.client.post(self.endpoint("CreateARP")), credential);
        let response = self.send(operation, request.json(&body)).await?;
        let value: serde_json::Value = decode(operation, response).await?;
        if let Ok(listing) = serde_json::from_value::<ProjectListing>(value) {
            info!(project = %listing.qr_string, "Created remote project");
            return Ok(listing);
        }
        // The creation succeeded but the reply did not carry the id; look it up.
        self.find_project_by_title(credential, title)
            .await?
            .ok_or_else(|| {
                RemoteError::Decode {
                    operation: operation.to_string(),
                    reason: "created project is missing from the project listing".to_string(),
                }
                .into()
            })
    }

    async fn list_augmentations(
        &self,
        credential: &Credential,
        project: &RemoteId,
    ) -> Result<Vec<AugmentationListing>> {
        self.get_json(
            "list augmentations",
            &format!("ListAug/{project}"),
            credential,
        )
        .await
    }

    async fn create_augmentation(
        &self,
        credential: &Credential,
        project: &RemoteId,
        title: &str,
        kind: AugmentationKind,
    ) -> Result<AugmentationListing> {
        let operation = "create an augmentation";
        let body = CreateAugmentationRequest {
            augmentation_title: title.to_string(),
            augmentation_type: kind,
        };
        let request = self.authorized(
            self.client.post(self.endpoint(&format!("CreateAug/{project}"))),
            credential,
        );
        let response = self.send(operation, request.json(&body)).await?;
        let value: serde_json::Value = decode(operation, response).await?;
        if let Ok(listing) = serde_json::from_value::<AugmentationListing>(value) {
            info!(project = %project, augmentation = %listing.internal_augid, "Created remote augmentation");
            return Ok(listing);
        }
        self.find_augmentation_by_title(credential, project, title)
            .await?
            .ok_or_else(|| {
                RemoteError::Decode {
                    operation: operation.to_string(),
                    reason: "created augmentation is missing from the listing".to_string(),
                }
                .into()
            })
    }

    async fn replace_file(
        &self,
        credential: &Credential,
        project: &RemoteId,
        augmentation: &RemoteId,
        field: FileKind,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let name = edit_field_name(field).ok_or(ValidationError::NotUploadable { field })?;
        let form = Form::new().part(name, Part::bytes(bytes).file_name(file_name.to_string()));
        let request = self.authorized(
            self.client
                .patch(self.endpoint(&format!("EditAug/{project}/{augmentation}"))),
            credential,
        );
        self.send("upload a file", request.multipart(form)).await?;
        Ok(())
    }

    async fn qr_links(&self, credential: &Credential, project: &RemoteId) -> Result<QrLinks> {
        self.get_json("fetch QR links", &format!("GetQR/{project}"), credential)
            .await
    }

    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>> {
        let operation = "download a file";
        self.retry
            .run(operation, move || async move {
                let response = self.send(operation, self.client.get(url)).await?;
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| transport_error(operation, e))?;
                Ok(bytes.to_vec())
            })
            .await
    }
}

async fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(operation, e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        RemoteError::Decode {
            operation: operation.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn transport_error(operation: &str, err: reqwest::Error) -> RemoteError {
    let operation = operation.to_string();
    if err.is_timeout() {
        RemoteError::Timeout { operation }
    } else if err.is_decode() {
        RemoteError::Decode {
            operation,
            reason: err.without_url().to_string(),
        }
    } else {
        RemoteError::Unreachable {
            operation,
            reason: err.without_url().to_string(),
        }
    }
}
