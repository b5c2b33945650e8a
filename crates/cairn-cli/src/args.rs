//! Command-line argument definitions using clap.
//!
//! Argument structs carry the clap derives; each converts into the matching
//! interface-free parameter type of `cairn_core::params` with a `From` impl:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Planner
//! ```
//!
//! Step lists come either from repeated `--step ID:DESCRIPTION[:DEP,DEP]`
//! flags or from a JSON file holding an array of steps in the version
//! document format; reading that file happens in the command handlers.

use std::{collections::BTreeMap, path::PathBuf};

use cairn_core::{models::Step, params::*};
use clap::{Args as ClapArgs, Parser, Subcommand};

/// Versioned plans with dependency-aware execution
///
/// Plans hold a working copy of steps. Snapshots of the working copy become
/// immutable versions that can be compared, rolled back, branched and
/// merged, and any version can be executed as a task graph.
#[derive(Parser)]
#[command(version, about, name = "cairn")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/cairn/cairn.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage plans, their versions and branches
    #[command(alias = "p")]
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a new plan
    #[command(alias = "c")]
    Create(CreatePlanArgs),
    /// Edit a plan's working copy
    #[command(alias = "u")]
    Update(UpdatePlanArgs),
    /// List all plans
    #[command(aliases = ["l", "ls"])]
    List,
    /// Show a plan and its working copy
    #[command(alias = "s")]
    Show(PlanIdArgs),
    /// Analyze the dependency structure of a version or the working copy
    Deps(DepsArgs),
    /// Copy a version into a new plan
    Fork(ForkArgs),
    /// Execute a version with the dry-run executor
    Run(RunArgs),
    /// Manage versions
    #[command(alias = "v")]
    Version {
        #[command(subcommand)]
        command: VersionCommands,
    },
    /// Manage branches
    #[command(alias = "b")]
    Branch {
        #[command(subcommand)]
        command: BranchCommands,
    },
    /// Three-way merge one branch into another
    Merge(MergeArgs),
    /// Tag a version
    Tag(TagArgs),
    /// Set a key/value annotation on a version
    Annotate(AnnotateArgs),
}

#[derive(Subcommand)]
pub enum VersionCommands {
    /// Snapshot the working copy as a new version
    #[command(alias = "c")]
    Create(CreateVersionArgs),
    /// List a plan's versions
    #[command(aliases = ["l", "ls"])]
    List(PlanIdArgs),
    /// Show one version
    #[command(alias = "show")]
    Get(VersionRefArgs),
    /// Show the active version
    Active(PlanIdArgs),
    /// Diff two versions
    Compare(CompareArgs),
    /// Restore an earlier version as a new version
    Rollback(VersionRefArgs),
    /// Print the JSON document of a version
    Export(VersionRefArgs),
}

#[derive(Subcommand)]
pub enum BranchCommands {
    /// Create a branch at a version
    #[command(alias = "c")]
    Create(CreateBranchArgs),
    /// List a plan's branches
    #[command(aliases = ["l", "ls"])]
    List(PlanIdArgs),
    /// Make a branch current and load its tip
    #[command(alias = "co")]
    Checkout(BranchRefArgs),
}

/// Parses `ID:DESCRIPTION[:DEP,DEP]`.
pub fn parse_step(value: &str) -> Result<Step, String> {
    let mut parts = value.splitn(3, ':');
    let id = parts.next().unwrap_or_default().trim();
    let description = parts.next().map(str::trim).unwrap_or_default();
    if id.is_empty() || description.is_empty() {
        return Err(format!(
            "invalid step '{value}': expected ID:DESCRIPTION[:DEP,DEP]"
        ));
    }

    let dependencies = parts
        .next()
        .into_iter()
        .flat_map(|deps| deps.split(','))
        .map(str::trim)
        .filter(|dep| !dep.is_empty());
    Ok(Step::new(id, description).depends_on(dependencies))
}

/// Parses `KEY=VALUE`.
pub fn parse_metadata(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), val.to_string()))
        }
        _ => Err(format!("invalid metadata '{value}': expected KEY=VALUE")),
    }
}

/// Step sources shared by `create` and `update`.
#[derive(ClapArgs)]
pub struct StepSource {
    /// Step as ID:DESCRIPTION[:DEP,DEP]; repeat for each step
    #[arg(long = "step", value_parser = parse_step)]
    pub steps: Vec<Step>,
    /// JSON file with an array of steps
    #[arg(long, conflicts_with = "steps")]
    pub steps_file: Option<PathBuf>,
}

/// Create a new plan
#[derive(ClapArgs)]
pub struct CreatePlanArgs {
    /// Unique plan identifier, e.g. plan_1
    pub id: String,
    /// Title of the plan
    pub title: String,
    #[arg(short, long, help = "Optional description of the plan")]
    pub description: Option<String>,
    #[command(flatten)]
    pub source: StepSource,
    /// Metadata entry as KEY=VALUE; repeatable
    #[arg(long = "meta", value_parser = parse_metadata)]
    pub metadata: Vec<(String, String)>,
}

impl From<CreatePlanArgs> for CreatePlan {
    fn from(val: CreatePlanArgs) -> Self {
        CreatePlan {
            id: val.id,
            title: val.title,
            description: val.description,
            steps: val.source.steps,
            metadata: val.metadata.into_iter().collect(),
        }
    }
}

/// Edit a plan's working copy
///
/// Steps given with --step or --steps-file replace the whole working copy.
/// Nothing is versioned until `plan version create` is run.
#[derive(ClapArgs)]
pub struct UpdatePlanArgs {
    pub plan_id: String,
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[command(flatten)]
    pub source: StepSource,
    /// Metadata entry as KEY=VALUE; repeatable
    #[arg(long = "meta", value_parser = parse_metadata)]
    pub metadata: Vec<(String, String)>,
}

impl From<UpdatePlanArgs> for UpdatePlan {
    fn from(val: UpdatePlanArgs) -> Self {
        let steps = if val.source.steps.is_empty() {
            None
        } else {
            Some(val.source.steps)
        };
        UpdatePlan {
            plan_id: val.plan_id,
            title: val.title,
            description: val.description,
            steps,
            metadata: val.metadata.into_iter().collect::<BTreeMap<_, _>>(),
        }
    }
}

#[derive(ClapArgs)]
pub struct PlanIdArgs {
    pub plan_id: String,
}

impl From<PlanIdArgs> for PlanId {
    fn from(val: PlanIdArgs) -> Self {
        PlanId {
            plan_id: val.plan_id,
        }
    }
}

#[derive(ClapArgs)]
pub struct DepsArgs {
    pub plan_id: String,
    /// Version to analyze; the working copy when omitted
    #[arg(long)]
    pub version: Option<String>,
}

impl From<DepsArgs> for AnalyzeDependencies {
    fn from(val: DepsArgs) -> Self {
        AnalyzeDependencies {
            plan_id: val.plan_id,
            version_id: val.version,
        }
    }
}

#[derive(ClapArgs)]
pub struct ForkArgs {
    pub plan_id: String,
    /// ID of the new plan
    pub new_plan_id: String,
    /// Version to copy; the active version when omitted
    #[arg(long)]
    pub version: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
}

impl From<ForkArgs> for ForkPlan {
    fn from(val: ForkArgs) -> Self {
        ForkPlan {
            plan_id: val.plan_id,
            version_id: val.version,
            new_plan_id: val.new_plan_id,
            title: val.title,
        }
    }
}

/// Execute a version
#[derive(ClapArgs)]
pub struct RunArgs {
    pub plan_id: String,
    /// Version to run; the active version when omitted
    #[arg(long)]
    pub version: Option<String>,
    /// Maximum number of tasks running at once
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,
    /// Executor invocations per task, first attempt included
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles for each further attempt
    #[arg(long, default_value_t = 1000)]
    pub base_delay_ms: u64,
    /// Stop dispatching after the first task failure
    #[arg(long)]
    pub fail_fast: bool,
    /// Split steps whose complexity exceeds this value into subtasks
    #[arg(long)]
    pub decompose_threshold: Option<u32>,
}

impl From<&RunArgs> for ExecuteVersion {
    fn from(val: &RunArgs) -> Self {
        ExecuteVersion {
            plan_id: val.plan_id.clone(),
            version_id: val.version.clone(),
            decompose_threshold: val.decompose_threshold,
        }
    }
}

#[derive(ClapArgs)]
pub struct CreateVersionArgs {
    pub plan_id: String,
    /// What changed in this snapshot
    pub description: String,
    /// Branch to extend; the current branch when omitted
    #[arg(long)]
    pub branch: Option<String>,
}

impl From<CreateVersionArgs> for CreateVersion {
    fn from(val: CreateVersionArgs) -> Self {
        CreateVersion {
            plan_id: val.plan_id,
            description: val.description,
            branch: val.branch,
        }
    }
}

#[derive(ClapArgs)]
pub struct VersionRefArgs {
    pub plan_id: String,
    /// Version ID, e.g. v2
    pub version_id: String,
}

impl From<VersionRefArgs> for VersionRef {
    fn from(val: VersionRefArgs) -> Self {
        VersionRef {
            plan_id: val.plan_id,
            version_id: val.version_id,
        }
    }
}

#[derive(ClapArgs)]
pub struct CompareArgs {
    pub plan_id: String,
    pub from_version_id: String,
    pub to_version_id: String,
}

impl From<CompareArgs> for CompareVersions {
    fn from(val: CompareArgs) -> Self {
        CompareVersions {
            plan_id: val.plan_id,
            from_version_id: val.from_version_id,
            to_version_id: val.to_version_id,
        }
    }
}

#[derive(ClapArgs)]
pub struct CreateBranchArgs {
    pub plan_id: String,
    pub name: String,
    /// Version the branch starts at; the active version when omitted
    #[arg(long)]
    pub from: Option<String>,
}

impl From<CreateBranchArgs> for CreateBranch {
    fn from(val: CreateBranchArgs) -> Self {
        CreateBranch {
            plan_id: val.plan_id,
            name: val.name,
            from_version_id: val.from,
        }
    }
}

#[derive(ClapArgs)]
pub struct BranchRefArgs {
    pub plan_id: String,
    pub name: String,
}

impl From<BranchRefArgs> for BranchRef {
    fn from(val: BranchRefArgs) -> Self {
        BranchRef {
            plan_id: val.plan_id,
            name: val.name,
        }
    }
}

#[derive(ClapArgs)]
pub struct MergeArgs {
    pub plan_id: String,
    /// Branch whose changes are merged
    pub source: String,
    /// Branch receiving the merge
    #[arg(long, default_value = "main")]
    pub into: String,
    /// Description of the merge version
    #[arg(short, long)]
    pub message: Option<String>,
}

impl From<MergeArgs> for MergeBranches {
    fn from(val: MergeArgs) -> Self {
        MergeBranches {
            plan_id: val.plan_id,
            target: val.into,
            source: val.source,
            description: val.message,
        }
    }
}

#[derive(ClapArgs)]
pub struct TagArgs {
    pub plan_id: String,
    pub version_id: String,
    pub tag: String,
}

impl From<TagArgs> for TagVersion {
    fn from(val: TagArgs) -> Self {
        TagVersion {
            plan_id: val.plan_id,
            version_id: val.version_id,
            tag: val.tag,
        }
    }
}

#[derive(ClapArgs)]
pub struct AnnotateArgs {
    pub plan_id: String,
    pub version_id: String,
    pub key: String,
    pub value: String,
}

impl From<AnnotateArgs> for AnnotateVersion {
    fn from(val: AnnotateArgs) -> Self {
        AnnotateVersion {
            plan_id: val.plan_id,
            version_id: val.version_id,
            key: val.key,
            value: val.value,
        }
    }
}
