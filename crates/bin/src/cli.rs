//! CLI argument definitions for the scholar binary.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use scholar_sync::constants::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};

use crate::output::OutputFormat;

/// Keep a local mirror of Schol-AR projects and augmentations
#[derive(Parser, Debug)]
#[command(name = "scholar")]
#[command(about = "Schol-AR: manage AR projects and keep a local mirror in sync")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by every command.
#[derive(clap::Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Root directory of the local mirror [default: <data dir>/Schol-AR]
    #[arg(long, global = true, env = "SCHOLAR_HOME")]
    pub home: Option<PathBuf>,

    /// Root URL of the Schol-AR API
    #[arg(long, global = true, env = "SCHOLAR_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "SCHOLAR_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Attempts for idempotent requests (listings, downloads)
    #[arg(long, global = true, env = "SCHOLAR_RETRIES", default_value_t = 3)]
    pub retries: u32,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a username and API token, then sync the user's projects
    Login(LoginArgs),
    /// Select a project, creating it on Schol-AR if it does not exist
    Project(ProjectArgs),
    /// Select an augmentation, creating it on Schol-AR if it does not exist
    Augmentation(AugmentationArgs),
    /// Download the public and private QR codes of a project
    DownloadQr(ProjectRef),
    /// Download augmentation files into the local mirror
    Download(DownloadArgs),
    /// Upload augmentation files to Schol-AR
    Upload(UploadArgs),
    /// Copy files from the mirror to another location
    #[command(subcommand)]
    Store(StoreCommands),
    /// Save or open the editor session of an augmentation
    #[command(subcommand)]
    Session(SessionCommands),
    /// Delete local projects and augmentations that no longer exist on Schol-AR
    Clean(CleanArgs),
    /// Delete a user and all their local files (the Schol-AR account is untouched)
    RemoveUser(UserArg),
    /// List local users
    Users,
    /// List a user's projects
    Projects(UserArg),
    /// List a project's augmentations
    Augmentations(ProjectRef),
}

#[derive(clap::Args, Debug)]
pub struct UserArg {
    /// Local username
    pub username: String,
}

#[derive(clap::Args, Debug)]
pub struct ProjectRef {
    /// Local username
    pub username: String,
    /// Project title
    pub project: String,
}

#[derive(clap::Args, Debug)]
pub struct AugmentationRef {
    /// Local username
    pub username: String,
    /// Project title
    pub project: String,
    /// Augmentation title
    pub augmentation: String,
}

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// Local username
    pub username: String,
    /// Schol-AR API token. Omit to re-validate the stored token.
    #[arg(env = "SCHOLAR_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub project: ProjectRef,
    /// Project type used when creating: paper, poster, book, other
    #[arg(long = "type", default_value = "other")]
    pub project_type: String,
    /// Publication URL used when creating
    #[arg(long, default_value = "")]
    pub url: String,
}

#[derive(clap::Args, Debug)]
pub struct AugmentationArgs {
    #[command(flatten)]
    pub augmentation: AugmentationRef,
    /// Augmentation type used when creating (only `model` is supported)
    #[arg(long = "type", default_value = "model")]
    pub kind: String,
    /// Model file uploaded right after creation
    #[arg(long)]
    pub model: Option<PathBuf>,
    /// Target image uploaded right after creation
    #[arg(long)]
    pub target_image: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub augmentation: AugmentationRef,
    /// Download the target image
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub target_image: bool,
    /// Download the model file
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub model: bool,
}

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    #[command(flatten)]
    pub augmentation: AugmentationRef,
    /// Upload the target image (overwrites the remote copy permanently)
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub target_image: bool,
    /// Upload the model file
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub model: bool,
    /// Model file to upload instead of the staged one
    #[arg(long)]
    pub model_path: Option<PathBuf>,
    /// Target image to upload instead of the staged one
    #[arg(long)]
    pub target_image_path: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum StoreCommands {
    /// Copy the target image (.png is appended if missing)
    TargetImage(StoreFileArgs),
    /// Copy the model file (.glb is appended if missing)
    Model(StoreFileArgs),
    /// Copy the public QR code (.png is appended if missing)
    Qr(StoreQrArgs),
    /// Copy the model, target image and public QR code into a folder
    All(StoreAllArgs),
}

#[derive(clap::Args, Debug)]
pub struct StoreFileArgs {
    #[command(flatten)]
    pub augmentation: AugmentationRef,
    /// Destination path
    pub dest: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct StoreQrArgs {
    #[command(flatten)]
    pub project: ProjectRef,
    /// Destination path
    pub dest: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct StoreAllArgs {
    #[command(flatten)]
    pub augmentation: AugmentationRef,
    /// Destination folder
    pub folder: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Save the editor session into the augmentation
    Save(SessionSaveArgs),
    /// Restore the augmentation's session into the editor
    Open(SessionOpenArgs),
}

#[derive(clap::Args, Debug)]
pub struct SessionSaveArgs {
    #[command(flatten)]
    pub augmentation: AugmentationRef,
    /// Session file the editor writes
    #[arg(long, env = "SCHOLAR_SESSION_FILE")]
    pub editor_file: PathBuf,
    /// Existing session file to copy instead of the editor's current one
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct SessionOpenArgs {
    #[command(flatten)]
    pub augmentation: AugmentationRef,
    /// Session file the editor reads
    #[arg(long, env = "SCHOLAR_SESSION_FILE")]
    pub editor_file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct CleanArgs {
    /// Only clean this user (default: every user)
    pub username: Option<String>,
}
