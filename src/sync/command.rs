//! Hook backed by an external executable

use super::{HookRequest, HookResult, SyncHook};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs a configured executable once per commit.
///
/// Request fields are passed as named arguments. The secret is written to
/// the child's stdin so it never shows up in the process list.
#[derive(Debug, Clone)]
pub struct CommandHook {
    program: PathBuf,
}

impl CommandHook {
    /// Hook running `program`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Executable this hook runs
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn args(request: &HookRequest) -> Vec<(&'static str, String)> {
        vec![
            ("--project", request.project.clone()),
            ("--repo-path", request.repo_path.display().to_string()),
            ("--change-ref", request.change_ref.clone()),
            ("--branch", request.branch.clone()),
            ("--ticket", request.ticket.clone()),
            ("--account", request.account.id.to_string()),
            (
                "--account-name",
                request.account.full_name.clone().unwrap_or_default(),
            ),
            (
                "--account-email",
                request.account.preferred_email.clone().unwrap_or_default(),
            ),
            ("--external-user", request.external_user.clone()),
            ("--old-rev", request.old_rev.to_string()),
            ("--new-rev", request.new_rev.to_string()),
        ]
    }
}

#[async_trait]
impl SyncHook for CommandHook {
    async fn invoke(&self, request: &HookRequest) -> Option<HookResult> {
        let mut cmd = Command::new(&self.program);
        for (flag, value) in Self::args(request) {
            cmd.arg(flag).arg(value);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            program = %self.program.display(),
            commit = %request.new_rev,
            ticket = %request.ticket,
            "running external sync hook"
        );

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %self.program.display(), error = %e, "cannot spawn hook");
                return None;
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            let secret = format!("{}\n", request.external_secret);
            // The hook may exit without reading stdin.
            if let Err(e) = stdin.write_all(secret.as_bytes()).await {
                debug!(error = %e, "hook did not read the secret");
            }
        }

        let output = match child.wait_with_output().await {
            Ok(output) => output,
            Err(e) => {
                warn!(program = %self.program.display(), error = %e, "hook did not finish");
                return None;
            }
        };

        // Killed by a signal: there is no exit code to report.
        let Some(exit_code) = output.status.code() else {
            warn!(program = %self.program.display(), "hook terminated by signal");
            return None;
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!(exit_code, "external sync hook finished");
        Some(HookResult {
            exit_code,
            output: combined.trim_end().to_string(),
        })
    }
}
