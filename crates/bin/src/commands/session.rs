use scholar_sync::{Workspace, session::FileSessionLinkage};

use crate::{
    cli::{SessionOpenArgs, SessionSaveArgs},
    output::OutputFormat,
};

pub async fn save(
    workspace: &Workspace,
    args: &SessionSaveArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let linkage = FileSessionLinkage::new(&args.editor_file);
    let target = &args.augmentation;
    let path = workspace
        .save_session(
            &target.username,
            &target.project,
            &target.augmentation,
            &linkage,
            args.file.as_deref(),
        )
        .await?;

    match format {
        OutputFormat::Human => println!("Saved session to {}", path.display()),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({ "saved": path }))?
            );
        }
    }
    Ok(())
}

pub async fn open(
    workspace: &Workspace,
    args: &SessionOpenArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let linkage = FileSessionLinkage::new(&args.editor_file);
    let target = &args.augmentation;
    let opened = workspace
        .open_session(
            &target.username,
            &target.project,
            &target.augmentation,
            &linkage,
        )
        .await?;

    match format {
        OutputFormat::Human => match &opened {
            Some(path) => println!(
                "Restored {} into {}",
                path.display(),
                linkage.path().display()
            ),
            None => println!("No session saved for '{}'.", target.augmentation),
        },
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({ "opened": opened }))?
            );
        }
    }
    Ok(())
}
