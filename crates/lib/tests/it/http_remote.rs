//! [`HttpRemote`] against a local axum mock of the Schol-AR REST API.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use scholar_sync::{
    AugmentationKind, ClientConfig, Credential, FileKind, ProjectType, RemoteId,
    remote::{HttpRemote, RemoteApi, RetryPolicy},
};
use serde_json::{Value, json};

const TOKEN: &str = "secret-token";

/// One multipart upload seen by the mock.
#[derive(Debug, Clone, PartialEq)]
struct Upload {
    path: String,
    field: String,
    file_name: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct MockState {
    projects: Vec<Value>,
    augmentations: Vec<Value>,
    hits: HashMap<&'static str, usize>,
    /// Upcoming responses per route, consumed before the normal reply.
    scripted: HashMap<&'static str, Vec<u16>>,
    create_replies_with_listing: bool,
    uploads: Vec<Upload>,
    list_delay: Option<Duration>,
}

#[derive(Clone, Default)]
struct Mock(Arc<Mutex<MockState>>);

impl Mock {
    fn with<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        f(&mut self.0.lock().unwrap())
    }

    fn hits(&self, route: &'static str) -> usize {
        self.with(|s| s.hits.get(route).copied().unwrap_or(0))
    }

    fn script(&self, route: &'static str, statuses: &[u16]) {
        self.with(|s| s.scripted.insert(route, statuses.to_vec()));
    }

    /// Count a hit and return a scripted failure if one is queued.
    fn enter(&self, route: &'static str, headers: &HeaderMap) -> Option<Response> {
        self.with(|s| {
            *s.hits.entry(route).or_default() += 1;
            let authorized = headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == format!("Token {TOKEN}"));
            if !authorized && route != "file" {
                return Some(StatusCode::UNAUTHORIZED.into_response());
            }
            let queue = s.scripted.get_mut(route)?;
            if queue.is_empty() {
                return None;
            }
            let status = queue.remove(0);
            Some(
                StatusCode::from_u16(status)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                    .into_response(),
            )
        })
    }
}

async fn list_projects(State(mock): State<Mock>, headers: HeaderMap) -> Response {
    if let Some(response) = mock.enter("ListARP", &headers) {
        return response;
    }
    if let Some(delay) = mock.with(|s| s.list_delay) {
        tokio::time::sleep(delay).await;
    }
    Json(mock.with(|s| s.projects.clone())).into_response()
}

async fn create_project(
    State(mock): State<Mock>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(response) = mock.enter("CreateARP", &headers) {
        return response;
    }
    mock.with(|s| {
        let listing = json!({
            "QRString": format!("QR{}", s.projects.len() + 1),
            "project_title": body["project_title"],
            "project_type": body["project_type"],
            "disc_url": body["disc_url"],
        });
        s.projects.push(listing.clone());
        if s.create_replies_with_listing {
            (StatusCode::CREATED, Json(listing)).into_response()
        } else {
            (StatusCode::CREATED, Json(json!({ "detail": "created" }))).into_response()
        }
    })
}

async fn list_augmentations(
    State(mock): State<Mock>,
    Path(project): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = mock.enter("ListAug", &headers) {
        return response;
    }
    if project != "QR1" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(mock.with(|s| s.augmentations.clone())).into_response()
}

async fn create_augmentation(
    State(mock): State<Mock>,
    Path(_project): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(response) = mock.enter("CreateAug", &headers) {
        return response;
    }
    mock.with(|s| {
        let listing = json!({
            "internal_augid": 40 + s.augmentations.len(),
            "augmentation_title": body["augmentation_title"],
            "augmentation_type": body["augmentation_type"],
            "augmented_file": "",
            "target_image": null,
            "targetimage_trackscore": "",
        });
        s.augmentations.push(listing.clone());
        (StatusCode::CREATED, Json(listing)).into_response()
    })
}

async fn edit_augmentation(
    State(mock): State<Mock>,
    Path((project, augmentation)): Path<(String, String)>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if let Some(response) = mock.enter("EditAug", &headers) {
        return response;
    }
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap_or_default().to_vec();
        mock.with(|s| {
            s.uploads.push(Upload {
                path: format!("{project}/{augmentation}"),
                field: name,
                file_name,
                bytes,
            })
        });
    }
    StatusCode::OK.into_response()
}

async fn get_qr(
    State(mock): State<Mock>,
    Path(project): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = mock.enter("GetQR", &headers) {
        return response;
    }
    Json(json!({
        "QR_Image1": format!("/media/{project}/public.png"),
        "AdminQRImage": format!("/media/{project}/admin.png"),
    }))
    .into_response()
}

async fn media(State(mock): State<Mock>, Path(name): Path<String>) -> Response {
    if let Some(response) = mock.enter("file", &HeaderMap::new()) {
        return response;
    }
    format!("bytes of {name}").into_response()
}

struct Server {
    mock: Mock,
    base_url: String,
}

impl Server {
    async fn start() -> Self {
        let mock = Mock::default();
        mock.with(|s| s.create_replies_with_listing = true);
        let router = Router::new()
            .route("/api/ListARP", get(list_projects))
            .route("/api/CreateARP", post(create_project))
            .route("/api/ListAug/{project}", get(list_augmentations))
            .route("/api/CreateAug/{project}", post(create_augmentation))
            .route("/api/EditAug/{project}/{augmentation}", patch(edit_augmentation))
            .route("/api/GetQR/{project}", get(get_qr))
            .route("/media/{name}", get(media))
            .with_state(mock.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Self {
            mock,
            base_url: format!("http://{addr}"),
        }
    }

    fn config(&self) -> ClientConfig {
        ClientConfig::new(&format!("{}/api/", self.base_url))
            .unwrap()
            .with_retry(RetryPolicy::default().with_base_delay(Duration::from_millis(5)))
    }

    fn remote(&self) -> HttpRemote {
        HttpRemote::new(&self.config()).unwrap()
    }

    fn seed_project(&self, id: &str, title: &str) {
        self.mock.with(|s| {
            s.projects.push(json!({
                "QRString": id,
                "project_title": title,
                "project_type": "paper",
                "disc_url": "",
            }))
        });
    }
}

fn credential() -> Credential {
    Credential::new(TOKEN)
}

#[tokio::test]
async fn test_token_header_and_unauthorized_mapping() {
    let server = Server::start().await;
    server.seed_project("QR1", "Paper");
    let remote = server.remote();

    assert!(remote.validate_credential(&credential()).await.unwrap());
    assert!(
        !remote
            .validate_credential(&Credential::new("wrong"))
            .await
            .unwrap()
    );

    let err = remote
        .list_projects(&Credential::new("wrong"))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(err.suggestion().is_some());
}

#[tokio::test]
async fn test_listing_decodes_into_records() {
    let server = Server::start().await;
    server.seed_project("QR1", "Paper");
    server.mock.with(|s| {
        s.augmentations.push(json!({
            "internal_augid": 7,
            "augmentation_title": "Protein",
            "augmentation_type": "model",
            "augmented_file": "/media/protein.glb",
            "target_image": "",
            "targetimage_trackscore": "3.5",
        }))
    });
    let remote = server.remote();

    let projects = remote.list_projects(&credential()).await.unwrap();
    let record = projects[0].to_record();
    assert_eq!(record.remote_id, "QR1");
    assert_eq!(record.project_type, ProjectType::Paper);
    assert_eq!(record.url, None);

    let augmentations = remote
        .list_augmentations(&credential(), &RemoteId::new("QR1"))
        .await
        .unwrap();
    let record = augmentations[0].to_record();
    assert_eq!(record.remote_id, "7");
    assert!(record.has_model_file);
    assert!(!record.has_target_image);
    assert_eq!(record.tracking_score, Some(3.5));
}

#[tokio::test]
async fn test_transient_read_failures_are_retried() {
    let server = Server::start().await;
    server.seed_project("QR1", "Paper");
    server.mock.script("ListARP", &[503, 502]);
    let remote = server.remote();

    let projects = remote.list_projects(&credential()).await.unwrap();

    assert_eq!(projects.len(), 1);
    assert_eq!(server.mock.hits("ListARP"), 3);
}

#[tokio::test]
async fn test_retries_give_up_after_configured_attempts() {
    let server = Server::start().await;
    server.mock.script("ListARP", &[503, 503, 503, 503]);
    let remote = server.remote();

    let err = remote.list_projects(&credential()).await.unwrap_err();

    assert!(err.is_non_local());
    assert_eq!(server.mock.hits("ListARP"), 3);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = Server::start().await;
    let remote = server.remote();

    let err = remote
        .list_augmentations(&credential(), &RemoteId::new("missing"))
        .await
        .unwrap_err();

    assert!(err.is_non_local());
    assert!(!err.is_unauthorized());
    assert_eq!(server.mock.hits("ListAug"), 1);
}

#[tokio::test]
async fn test_failed_create_is_sent_once() {
    let server = Server::start().await;
    server.mock.script("CreateARP", &[500]);
    let remote = server.remote();

    let err = remote
        .create_project(&credential(), "Paper", ProjectType::Paper, "")
        .await
        .unwrap_err();

    assert!(err.is_non_local());
    assert_eq!(server.mock.hits("CreateARP"), 1);
    assert!(server.mock.with(|s| s.projects.is_empty()));
}

#[tokio::test]
async fn test_create_falls_back_to_listing_for_id() {
    let server = Server::start().await;
    server.mock.with(|s| s.create_replies_with_listing = false);
    let remote = server.remote();

    let listing = remote
        .create_project(&credential(), "Poster", ProjectType::Poster, "https://doi.org/p")
        .await
        .unwrap();

    assert_eq!(listing.qr_string, "QR1");
    let record = listing.to_record();
    assert_eq!(record.project_type, ProjectType::Poster);
    assert_eq!(record.url.as_deref(), Some("https://doi.org/p"));
    assert_eq!(server.mock.hits("CreateARP"), 1);
    assert_eq!(server.mock.hits("ListARP"), 1);
}

#[tokio::test]
async fn test_create_augmentation_parses_numeric_id() {
    let server = Server::start().await;
    let remote = server.remote();

    let listing = remote
        .create_augmentation(
            &credential(),
            &RemoteId::new("QR1"),
            "Protein",
            AugmentationKind::Model,
        )
        .await
        .unwrap();

    assert_eq!(listing.remote_id(), "40");
    let record = listing.to_record();
    assert!(!record.has_model_file);
    assert_eq!(record.tracking_score, None);
    let sent_type = server
        .mock
        .with(|s| s.augmentations[0]["augmentation_type"].clone());
    assert_eq!(sent_type, json!("model"));
}

#[tokio::test]
async fn test_replace_file_sends_multipart_patch() {
    let server = Server::start().await;
    let remote = server.remote();

    remote
        .replace_file(
            &credential(),
            &RemoteId::new("QR1"),
            &RemoteId::new("7"),
            FileKind::TargetImage,
            "Protein-target.png",
            b"png-bytes".to_vec(),
        )
        .await
        .unwrap();

    let uploads = server.mock.with(|s| s.uploads.clone());
    assert_eq!(
        uploads,
        vec![Upload {
            path: "QR1/7".to_string(),
            field: "target_image".to_string(),
            file_name: "Protein-target.png".to_string(),
            bytes: b"png-bytes".to_vec(),
        }]
    );
}

#[tokio::test]
async fn test_session_is_never_sent() {
    let server = Server::start().await;
    let remote = server.remote();

    let err = remote
        .replace_file(
            &credential(),
            &RemoteId::new("QR1"),
            &RemoteId::new("7"),
            FileKind::Session,
            "s.cxs",
            Vec::new(),
        )
        .await
        .unwrap_err();

    assert!(err.is_validation_error());
    assert_eq!(server.mock.hits("EditAug"), 0);
}

#[tokio::test]
async fn test_qr_links_and_file_fetch() {
    let server = Server::start().await;
    let remote = server.remote();

    let links = remote
        .qr_links(&credential(), &RemoteId::new("QR1"))
        .await
        .unwrap();
    assert_eq!(links.public, "/media/QR1/public.png");

    let bytes = remote
        .fetch_file(&format!("{}/media/protein.glb", server.base_url))
        .await
        .unwrap();
    assert_eq!(bytes, b"bytes of protein.glb");
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = Server::start().await;
    server
        .mock
        .with(|s| s.list_delay = Some(Duration::from_secs(2)));
    let config = server
        .config()
        .with_timeout(Duration::from_millis(100))
        .unwrap()
        .with_retry(RetryPolicy::none());
    let remote = HttpRemote::new(&config).unwrap();

    let err = remote.list_projects(&credential()).await.unwrap_err();

    assert!(err.is_timeout_error());
    assert_eq!(server.mock.hits("ListARP"), 1);
}
