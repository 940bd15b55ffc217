//! Constants used throughout the scholar-sync library.
//!
//! Central definitions for manifest file names, reserved directory names and
//! transfer limits. The directory layout itself lives in [`crate::layout`].

/// Manifest listing every user of an installation.
pub const USERS_MANIFEST: &str = "users.json";

/// Manifest listing the projects of one user.
pub const PROJECTS_MANIFEST: &str = "projects.json";

/// Manifest listing the augmentations of one project.
pub const AUGMENTATIONS_MANIFEST: &str = "augmentations.json";

/// Project subdirectory holding the QR code pair.
pub const QR_DIR: &str = "qr";

/// QR subdirectory for the public (publication-safe) code.
pub const QR_PUBLIC_DIR: &str = "pub";

/// QR subdirectory for the private (edit credential) code.
pub const QR_PRIVATE_DIR: &str = "admin";

/// Augmentation subdirectory for the 3D model file.
pub const MODEL_DIR: &str = "augmented_file";

/// Augmentation subdirectory for the editor session snapshot.
pub const SESSION_DIR: &str = "cxs";

/// Augmentation subdirectory for the target image.
pub const TARGET_IMAGE_DIR: &str = "target_image";

/// Upload ceiling in megabytes.
pub const MAX_UPLOAD_MB: u64 = 30;

/// Upload ceiling in bytes. Files must be strictly smaller than this.
pub const MAX_UPLOAD_BYTES: u64 = MAX_UPLOAD_MB * 1024 * 1024;

/// Default remote API root.
pub const DEFAULT_API_URL: &str = "https://www.Schol-AR.io/api";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Warning attached to every target image upload.
pub const TARGET_IMAGE_OVERWRITE_WARNING: &str = "the previous target image on the remote was overwritten and cannot be recovered";
