use std::path::Path;

use scholar_sync::{
    Workspace,
    transfer::{FieldSelection, FieldSources},
};

use crate::{
    cli::{DownloadArgs, ProjectRef, StoreAllArgs, StoreFileArgs, StoreQrArgs, UploadArgs},
    output::{OutputFormat, print_report},
};

pub async fn download(
    workspace: &Workspace,
    args: &DownloadArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let selection = FieldSelection {
        model: args.model,
        target_image: args.target_image,
    };
    if selection.is_empty() {
        return Err("nothing selected; pass --model true or --target-image true".into());
    }
    let target = &args.augmentation;
    let report = workspace
        .download(
            &target.username,
            &target.project,
            &target.augmentation,
            selection,
        )
        .await?;
    print_report(&report, format)
}

pub async fn upload(
    workspace: &Workspace,
    args: &UploadArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let selection = FieldSelection {
        model: args.model,
        target_image: args.target_image,
    };
    if selection.is_empty() {
        return Err("nothing selected; pass --model true or --target-image true".into());
    }
    let sources = FieldSources {
        model: args.model_path.clone(),
        target_image: args.target_image_path.clone(),
    };
    let target = &args.augmentation;
    let report = workspace
        .upload(
            &target.username,
            &target.project,
            &target.augmentation,
            selection,
            &sources,
        )
        .await?;
    print_report(&report, format)
}

pub async fn download_qr(
    workspace: &Workspace,
    args: &ProjectRef,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = workspace.download_qr(&args.username, &args.project).await?;
    print_report(&report, format)
}

pub async fn store_target_image(
    workspace: &Workspace,
    args: &StoreFileArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = &args.augmentation;
    let path = workspace
        .store_target_image(
            &target.username,
            &target.project,
            &target.augmentation,
            &args.dest,
        )
        .await?;
    print_stored(&path, format)
}

pub async fn store_model(
    workspace: &Workspace,
    args: &StoreFileArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = &args.augmentation;
    let path = workspace
        .store_model(
            &target.username,
            &target.project,
            &target.augmentation,
            &args.dest,
        )
        .await?;
    print_stored(&path, format)
}

pub async fn store_qr(
    workspace: &Workspace,
    args: &StoreQrArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = workspace
        .store_qr(&args.project.username, &args.project.project, &args.dest)
        .await?;
    print_stored(&path, format)
}

pub async fn store_all(
    workspace: &Workspace,
    args: &StoreAllArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = &args.augmentation;
    let report = workspace
        .store_all(
            &target.username,
            &target.project,
            &target.augmentation,
            &args.folder,
        )
        .await?;
    print_report(&report, format)
}

fn print_stored(path: &Path, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => println!("Stored {}", path.display()),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({ "path": path }))?
            );
        }
    }
    Ok(())
}
