use scholar_sync::{ProjectType, Workspace};

use crate::{
    cli::{ProjectArgs, UserArg},
    output::{OutputFormat, print_table},
};

pub async fn select(
    workspace: &Workspace,
    args: &ProjectArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let project_type: ProjectType = args
        .project_type
        .parse()
        .map_err(scholar_sync::Error::from)?;
    let selection = workspace
        .select_or_create_project(
            &args.project.username,
            &args.project.project,
            project_type,
            &args.url,
        )
        .await?;
    let record = &selection.record;

    match format {
        OutputFormat::Human => {
            let verb = if selection.created { "Created" } else { "Selected" };
            println!("{verb} project '{}' ({})", record.title, record.remote_id);
            if let Some(synced) = &selection.synced {
                for title in &synced.added {
                    println!("  new augmentation: {title}");
                }
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({
                    "project": record,
                    "created": selection.created,
                    "synced": selection.synced,
                }))?
            );
        }
    }
    Ok(())
}

pub async fn list(
    workspace: &Workspace,
    args: &UserArg,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let projects = workspace.projects(&args.username).await?;

    match format {
        OutputFormat::Human => {
            if projects.is_empty() {
                println!("No projects found.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = projects
                .iter()
                .map(|p| {
                    vec![
                        p.title.clone(),
                        p.project_type.label().to_string(),
                        p.remote_id.to_string(),
                        p.url.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(&["TITLE", "TYPE", "ID", "URL"], &rows);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&projects)?);
        }
    }
    Ok(())
}
