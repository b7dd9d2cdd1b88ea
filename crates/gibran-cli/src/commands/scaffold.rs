//! `gibran scaffold` (alias `startproject`): create the standard layout.

use std::path::{Path, PathBuf};

use tracing::instrument;

use gibran_adapters::LocalFilesystem;
use gibran_core::{
    application::{ScaffoldService, ScaffoldSummary},
    domain::ScaffoldManifest,
    error::GibranError,
};

use crate::{
    cli::{OutputFormat, ScaffoldArgs},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(name = %args.name))]
pub fn execute(args: ScaffoldArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let parent = args.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let markers = config.markers(None)?;
    let manifest = ScaffoldManifest::standard(&markers).map_err(GibranError::from)?;

    let service = ScaffoldService::new(Box::new(LocalFilesystem::new()), manifest);
    let summary = service.scaffold(&args.name, &parent)?;

    if output.format() == OutputFormat::Json {
        output.json(&serde_json::json!({
            "root": summary.root,
            "created": summary.created,
            "existing": summary.existing,
        }))?;
        return Ok(());
    }
    report(&summary, &args.name, &output)
}

fn report(summary: &ScaffoldSummary, name: &str, output: &OutputManager) -> CliResult<()> {
    if summary.is_noop() {
        output.info(&format!(
            "{} is already scaffolded, nothing to do",
            summary.root.display()
        ))?;
        return Ok(());
    }

    output.success(&format!(
        "Created project '{name}' at {}",
        summary.root.display()
    ))?;
    for path in &summary.created {
        output.print(&format!("  + {}", display_relative(&summary.root, path)))?;
    }
    if !summary.existing.is_empty() {
        output.print(&format!(
            "  ({} existing entries left unchanged)",
            summary.existing.len()
        ))?;
    }

    output.print("")?;
    output.header("Next steps:")?;
    output.print(&format!("  cd {}", summary.root.display()))?;
    output.print("  gibran run")?;
    Ok(())
}

fn display_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_paths_are_shown_relative_to_the_project() {
        let root = Path::new("/work/shop");
        assert_eq!(display_relative(root, &root.join("models/user.go")), "models/user.go");
        assert_eq!(display_relative(root, Path::new("/elsewhere")), "/elsewhere");
    }
}
