use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;

use crate::domain::model::{HDFS_NAMENODE, YARN_RM};
use crate::domain::ports::ClusterPods;
use crate::utils::error::{DwvError, Result};
use crate::utils::retry::RetryPolicy;

pub const YARN_LIST_CMD: &str = "yarn application -list -appStates ALL";

/// How the ingest run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The data file was already present in the namenode pod; nothing was
    /// submitted.
    AlreadyLoaded,
    Completed,
}

/// Pull the per-application states out of a `yarn application -list` listing.
///
/// The listing opens with three preamble lines, then a tab-separated header
/// row naming a `State` column, then one row per application.
pub fn parse_yarn_states(listing: &str) -> Result<Vec<String>> {
    let cleaned = Regex::new(r" +").unwrap().replace_all(listing, "");
    let mut lines = cleaned.lines().skip(3);

    let header = lines.next().ok_or_else(|| DwvError::IngestError {
        message: "unexpected yarn application listing: no header row".to_string(),
    })?;
    let state_idx = header
        .split('\t')
        .position(|column| column == "State")
        .ok_or_else(|| DwvError::IngestError {
            message: "unexpected yarn application listing: no State column".to_string(),
        })?;

    Ok(lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split('\t').nth(state_idx).unwrap_or("").to_string())
        .collect())
}

/// Current states of every Yarn application known to the resource manager.
pub async fn application_states(pods: &dyn ClusterPods, namespace: &str) -> Result<Vec<String>> {
    let listing = pods.exec(YARN_RM, namespace, YARN_LIST_CMD).await?;
    parse_yarn_states(&listing)
}

/// Block until a new Yarn application has shown up relative to the baseline
/// and every application reports `FINISHED`. Rechecks every 5 seconds for up
/// to 3 minutes.
pub async fn check_app_statuses(
    pods: &dyn ClusterPods,
    namespace: &str,
    baseline_num_apps: usize,
) -> Result<()> {
    let policy = RetryPolicy {
        max_tries: None,
        time_limit: Some(Duration::from_secs(180)),
        delay: Duration::from_secs(5),
    };
    policy
        .run(|| async {
            let statuses = application_states(pods, namespace).await?;
            tracing::info!("MapReduce App Status: {:?}", statuses);

            if statuses.len() == baseline_num_apps {
                return Err(DwvError::IngestError {
                    message: "Never got a new Yarn application.".to_string(),
                });
            }
            if statuses.iter().any(|status| status != "FINISHED") {
                return Err(DwvError::IngestError {
                    message: "One or more Yarn applications failed, meaning Ingest was not successful."
                        .to_string(),
                });
            }
            Ok(())
        })
        .await
}

/// Whether `filename` is already sitting in the namenode pod's `/tmp`.
pub async fn check_for_file(
    pods: &dyn ClusterPods,
    namespace: &str,
    filename: &str,
) -> Result<bool> {
    tracing::info!("Checking the test data file got copied to pod...");
    let listing = pods.exec(HDFS_NAMENODE, namespace, "ls tmp").await?;
    tracing::debug!("{}", listing);
    Ok(listing.contains(filename))
}

/// Submit a data file for ingest: copy it into the HDFS namenode pod, push it
/// into HDFS under the data type's directory, then wait for the resulting
/// Yarn application to finish.
pub async fn ingest_file(
    pods: &dyn ClusterPods,
    namespace: &str,
    file: &Path,
    data_type: &str,
) -> Result<IngestOutcome> {
    let filename = file
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| DwvError::ConfigError {
            message: format!("cannot determine a file name from {}", file.display()),
        })?;

    let baseline_num_apps = application_states(pods, namespace).await?.len();

    if check_for_file(pods, namespace, filename).await? {
        tracing::warn!(
            "Data file was already found in tmp of pod, assuming data has already been loaded. Not proceeding."
        );
        return Ok(IngestOutcome::AlreadyLoaded);
    }

    copy_file_to_pod(pods, namespace, file, filename).await?;

    if !check_for_file(pods, namespace, filename).await? {
        return Err(DwvError::IngestError {
            message: "Test data file was not found inside hadoop pod. Cannot continue with ingest."
                .to_string(),
        });
    }

    tracing::info!("Running copy into HDFS...");
    let cmd = format!(
        "hdfs dfs -put /tmp/{} hdfs://hdfs-nn:9000/data/{}",
        filename, data_type
    );
    let output = pods.exec(HDFS_NAMENODE, namespace, &cmd).await?;
    tracing::info!("{}", output);
    tracing::info!("copy into HDFS complete...");

    check_app_statuses(pods, namespace, baseline_num_apps).await?;
    Ok(IngestOutcome::Completed)
}

async fn copy_file_to_pod(
    pods: &dyn ClusterPods,
    namespace: &str,
    file: &Path,
    filename: &str,
) -> Result<()> {
    let pod = pods.lookup(HDFS_NAMENODE, namespace).await?;
    let target = format!("{}:/tmp/{}", pod.name, filename);

    tracing::info!("Running kubectl copy...");
    let status = Command::new("kubectl")
        .args(["cp", "-n", namespace])
        .arg(file)
        .arg(&target)
        .status()
        .await?;
    if !status.success() {
        return Err(DwvError::IngestError {
            message: format!("kubectl cp exited with {}", status),
        });
    }
    Ok(())
}

/// Verify the external commands this subcommand shells out to are installed.
pub fn check_required_cmds(cmds: &[&str]) -> Result<()> {
    for cmd in cmds {
        if !command_available(cmd) {
            return Err(DwvError::ConfigError {
                message: format!(
                    "Cannot find `{}`. Please verify installations and try again.",
                    cmd
                ),
            });
        }
    }
    Ok(())
}

fn command_available(cmd: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(cmd).is_file()))
        .unwrap_or(false)
}
