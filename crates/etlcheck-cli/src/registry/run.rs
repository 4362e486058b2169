use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use etlcheck_validate::PipelineReport;

use super::{RegistryError, RegistryResult};
use crate::config::ResolvedConfig;

/// Identity of one `run` invocation.
#[derive(Debug, Clone)]
pub struct RunMeta {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub run_dir: PathBuf,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
struct RunConfig<'a> {
    run_id: &'a str,
    started_at: String,
    etlcheck_version: &'static str,
    config: &'a ResolvedConfig<'a>,
    git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
struct GitInfo {
    commit: Option<String>,
    dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub logs_path: PathBuf,
    pub result_path: PathBuf,
    pub report_path: PathBuf,
}

pub fn start_run(meta: &RunMeta, config: &ResolvedConfig<'_>) -> RegistryResult<RunPaths> {
    let timestamp = meta.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = meta.run_dir.join(format!("{timestamp}__run_{}", meta.run_id));
    create_dir_all(&root)?;

    let logs_path = root.join("logs.ndjson");
    let run_config = RunConfig {
        run_id: &meta.run_id,
        started_at: meta.started_at.to_rfc3339(),
        etlcheck_version: env!("CARGO_PKG_VERSION"),
        config,
        git: collect_git_info(),
    };
    write_json(&root.join("config.json"), &run_config)?;

    OpenOptions::new().create(true).append(true).open(&logs_path)?;

    Ok(RunPaths {
        result_path: root.join("result.json"),
        report_path: root.join("report.md"),
        logs_path,
        root,
    })
}

pub fn write_result(paths: &RunPaths, report: &PipelineReport) -> RegistryResult<()> {
    write_json(&paths.result_path, report)
}

pub fn write_report(paths: &RunPaths, markdown: &str) -> RegistryResult<()> {
    std::fs::write(&paths.report_path, markdown)?;
    Ok(())
}

fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> RegistryResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}
