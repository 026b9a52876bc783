mod core;
pub mod entrypoint;
mod feedback;
pub mod staleness;
pub mod workspace;

pub use self::core::{
    BuildJob, BuildPlan, BuildReport, BuildResult, BuildStatus, build_all, plan, plan_jobs,
    run_jobs,
};
