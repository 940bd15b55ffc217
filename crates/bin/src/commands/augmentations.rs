use scholar_sync::{AugmentationKind, Workspace, transfer::FieldSources};

use crate::{
    cli::{AugmentationArgs, ProjectRef},
    output::{OutputFormat, print_report, print_table},
};

pub async fn select(
    workspace: &Workspace,
    args: &AugmentationArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind: AugmentationKind = args.kind.parse().map_err(scholar_sync::Error::from)?;
    let sources = FieldSources {
        model: args.model.clone(),
        target_image: args.target_image.clone(),
    };
    let target = &args.augmentation;
    let result = workspace
        .select_or_create_augmentation(
            &target.username,
            &target.project,
            &target.augmentation,
            kind,
            &sources,
        )
        .await?;
    let selection = &result.selection;
    let record = &selection.record;

    match format {
        OutputFormat::Human => {
            let verb = if selection.created { "Created" } else { "Selected" };
            println!("{verb} augmentation '{}' ({})", record.title, record.remote_id);
            if !selection.created && (args.model.is_some() || args.target_image.is_some()) {
                println!("  files were not uploaded; use `scholar upload` for existing augmentations");
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({
                    "augmentation": record,
                    "created": selection.created,
                    "synced": selection.synced,
                }))?
            );
        }
    }

    match &result.initial_upload {
        Some(report) => print_report(report, format),
        None => Ok(()),
    }
}

pub async fn list(
    workspace: &Workspace,
    args: &ProjectRef,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let augmentations = workspace
        .augmentations(&args.username, &args.project)
        .await?;

    match format {
        OutputFormat::Human => {
            if augmentations.is_empty() {
                println!("No augmentations found.");
                return Ok(());
            }
            let flag = |set: bool| (if set { "yes" } else { "-" }).to_string();
            let rows: Vec<Vec<String>> = augmentations
                .iter()
                .map(|a| {
                    vec![
                        a.title.clone(),
                        a.remote_id.to_string(),
                        flag(a.has_model_file),
                        flag(a.has_target_image),
                        flag(a.has_session),
                        a.tracking_score
                            .map(|s| format!("{s:.1}"))
                            .unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect();
            print_table(
                &["TITLE", "ID", "MODEL", "TARGET", "SESSION", "TRACKING"],
                &rows,
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&augmentations)?);
        }
    }
    Ok(())
}
