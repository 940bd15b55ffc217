use scholar_sync::Workspace;

use crate::{
    cli::{CleanArgs, LoginArgs, UserArg},
    output::{OutputFormat, print_table},
};

pub async fn login(
    workspace: &Workspace,
    args: &LoginArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = workspace
        .login(&args.username, args.token.as_deref())
        .await?;

    match format {
        OutputFormat::Human => {
            let verb = if report.new_user { "Added" } else { "Logged in" };
            println!("{verb} user '{}'", report.alias);
            for title in &report.projects.added {
                println!("  new project: {title}");
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({
                    "alias": report.alias,
                    "new_user": report.new_user,
                    "projects": report.projects,
                }))?
            );
        }
    }
    Ok(())
}

pub async fn list(workspace: &Workspace, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let users = workspace.users().await?;

    match format {
        OutputFormat::Human => {
            if users.is_empty() {
                println!("No users found. Run `scholar login <username> <token>` first.");
                return Ok(());
            }
            for user in &users {
                println!("{user}");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&users)?);
        }
    }
    Ok(())
}

pub async fn remove(
    workspace: &Workspace,
    args: &UserArg,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    workspace.remove_user(&args.username).await?;

    match format {
        OutputFormat::Human => {
            println!("Removed local data of '{}'", args.username);
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({ "removed": args.username }))?
            );
        }
    }
    Ok(())
}

pub async fn clean(
    workspace: &Workspace,
    args: &CleanArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = workspace.clean_local(args.username.as_deref()).await?;

    match format {
        OutputFormat::Human => {
            if report.removed_count() == 0 && report.skipped.is_empty() {
                println!("Nothing to clean.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = report
                .removed_projects
                .iter()
                .map(|e| ("project", e))
                .chain(
                    report
                        .removed_augmentations
                        .iter()
                        .map(|e| ("augmentation", e)),
                )
                .map(|(kind, e)| {
                    vec![
                        kind.to_string(),
                        e.scope.clone(),
                        e.remote_id.to_string(),
                        e.title.clone().unwrap_or_else(|| "(untracked)".to_string()),
                    ]
                })
                .collect();
            print_table(&["REMOVED", "SCOPE", "ID", "TITLE"], &rows);
            for skipped in &report.skipped {
                println!("skipped {}: {}", skipped.scope, skipped.reason);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&report)?);
        }
    }
    Ok(())
}
