//! Command handlers.
//!
//! Each handler converts clap arguments into core parameters, calls the
//! planner and renders the result's `Display` output as markdown.

use std::{fs, path::Path, sync::Arc};

use anyhow::{bail, Context, Result};
use cairn_core::{
    models::Step, params::*, DryRunExecutor, Planner, RetryPolicy, Scheduler, SchedulerConfig,
};
use log::{debug, info};

use crate::{
    args::{BranchCommands, PlanCommands, RunArgs, StepSource, VersionCommands},
    renderer::TerminalRenderer,
};

pub struct Cli {
    planner: Planner,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(planner: Planner, renderer: TerminalRenderer) -> Self {
        Self { planner, renderer }
    }

    fn show(&self, value: impl std::fmt::Display) -> Result<()> {
        self.renderer.render(&value.to_string())
    }

    pub async fn handle_plan_command(&self, command: PlanCommands) -> Result<()> {
        match command {
            PlanCommands::Create(mut args) => {
                load_steps(&mut args.source)?;
                let result = self.planner.create_plan_result(&args.into()).await?;
                self.show(result)
            }
            PlanCommands::Update(mut args) => {
                load_steps(&mut args.source)?;
                let result = self.planner.update_plan_result(&args.into()).await?;
                self.show(result)
            }
            PlanCommands::List => self.list_plans().await,
            PlanCommands::Show(args) => {
                let plan = self.planner.show_plan(&args.into()).await?;
                self.show(plan)
            }
            PlanCommands::Deps(args) => {
                let report = self.planner.analyze_dependencies(&args.into()).await?;
                self.show(report)
            }
            PlanCommands::Fork(args) => {
                let plan = self.planner.fork_plan(&args.into()).await?;
                self.show(plan)
            }
            PlanCommands::Run(args) => self.run(args).await,
            PlanCommands::Version { command } => self.handle_version_command(command).await,
            PlanCommands::Branch { command } => self.handle_branch_command(command).await,
            PlanCommands::Merge(args) => {
                let version = self.planner.merge(&args.into()).await?;
                self.show(version)
            }
            PlanCommands::Tag(args) => {
                let status = self.planner.tag_version_status(&args.into()).await?;
                self.show(status)
            }
            PlanCommands::Annotate(args) => {
                let status = self.planner.annotate_version_status(&args.into()).await?;
                self.show(status)
            }
        }
    }

    async fn handle_version_command(&self, command: VersionCommands) -> Result<()> {
        match command {
            VersionCommands::Create(args) => {
                let result = self.planner.create_version_result(&args.into()).await?;
                self.show(result)
            }
            VersionCommands::List(args) => {
                let versions = self.planner.list_versions_display(&args.into()).await?;
                self.show(versions)
            }
            VersionCommands::Get(args) => {
                let version = self.planner.get_version(&args.into()).await?;
                self.show(version)
            }
            VersionCommands::Active(args) => {
                let params = PlanId::from(args);
                match self.planner.get_active_version(&params).await? {
                    Some(version) => self.show(version),
                    None => self.renderer.render(&format!(
                        "Plan '{}' has no versions yet.\n",
                        params.plan_id
                    )),
                }
            }
            VersionCommands::Compare(args) => {
                let diff = self.planner.compare_versions(&args.into()).await?;
                self.show(diff)
            }
            VersionCommands::Rollback(args) => {
                let version = self.planner.rollback(&args.into()).await?;
                self.show(version)
            }
            VersionCommands::Export(args) => {
                let document = self.planner.export_version(&args.into()).await?;
                // Raw JSON, never styled.
                println!("{}", serde_json::to_string_pretty(&document)?);
                Ok(())
            }
        }
    }

    async fn handle_branch_command(&self, command: BranchCommands) -> Result<()> {
        match command {
            BranchCommands::Create(args) => {
                let result = self.planner.create_branch_result(&args.into()).await?;
                self.show(result)
            }
            BranchCommands::List(args) => {
                let branches = self.planner.list_branches_display(&args.into()).await?;
                self.show(branches)
            }
            BranchCommands::Checkout(args) => {
                let plan = self.planner.checkout(&args.into()).await?;
                self.show(plan)
            }
        }
    }

    pub async fn list_plans(&self) -> Result<()> {
        let plans = self.planner.list_plans_display().await?;
        self.show(plans)
    }

    /// Runs a version with the dry-run executor. Ctrl-C cancels the run.
    async fn run(&self, args: RunArgs) -> Result<()> {
        let retry = RetryPolicy::default()
            .with_max_attempts(args.max_attempts)
            .with_base_delay(std::time::Duration::from_millis(args.base_delay_ms));
        let mut config = SchedulerConfig::default()
            .with_concurrency_limit(args.concurrency)
            .with_retry(retry);
        if args.fail_fast {
            config = config.fail_fast();
        }

        let scheduler = Scheduler::new(config);
        let token = scheduler.cancellation_token();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, cancelling run");
                token.cancel();
            }
        });

        let params = ExecuteVersion::from(&args);
        let outcome = self
            .planner
            .execute_version_with(&params, &scheduler, Arc::new(DryRunExecutor))
            .await;
        interrupt.abort();

        let result = outcome?;
        self.show(&result)?;
        if !result.is_success() {
            bail!("run {}", result.outcome.as_str());
        }
        Ok(())
    }
}

/// Fills `source.steps` from `source.steps_file` when one is given.
fn load_steps(source: &mut StepSource) -> Result<()> {
    if let Some(path) = source.steps_file.take() {
        source.steps = read_steps_file(&path)?;
        debug!("Loaded {} steps from {}", source.steps.len(), path.display());
    }
    Ok(())
}

fn read_steps_file(path: &Path) -> Result<Vec<Step>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read steps file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse steps file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_steps_file_uses_document_format() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "1", "description": "Research"}},
                {{"id": "2", "description": "Write", "dependencies": ["1"]}}]"#
        )
        .unwrap();

        let mut source = StepSource {
            steps: Vec::new(),
            steps_file: Some(file.path().to_path_buf()),
        };
        load_steps(&mut source).unwrap();

        assert_eq!(source.steps.len(), 2);
        assert!(source.steps[1].dependency_step_ids.contains("1"));
        assert!(source.steps_file.is_none());
    }

    #[test]
    fn test_unreadable_steps_file() {
        let mut source = StepSource {
            steps: Vec::new(),
            steps_file: Some("/nonexistent/steps.json".into()),
        };
        let err = load_steps(&mut source).unwrap_err();
        assert!(err.to_string().contains("Failed to read steps file"));
    }
}
