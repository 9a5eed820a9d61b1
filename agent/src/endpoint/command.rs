//! 外部プロセスエンドポイント
//!
//! テスト対象のプロセスを起動し、ウォームアップ時間だけ待ってから戻る。
//! 停止はキャンセル → SIGTERM → 猶予後にKILLの順で行う。

use crate::registry::Endpoint;
use async_trait::async_trait;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use test_agent_common::error::{AgentError, AgentResult};
use test_agent_common::protocol::InitCommandRequest;
use test_agent_common::types::is_blank;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// SIGTERM送信後、KILLするまでの猶予
pub const STOP_GRACE: Duration = Duration::from_secs(5);

/// `warmup_millis` が0の場合のウォームアップ
pub const DEFAULT_WARMUP: Duration = Duration::from_millis(1);

enum CommandState {
    Created,
    Running {
        pid: Option<u32>,
        cancel: CancellationToken,
        supervisor: JoinHandle<io::Result<ExitStatus>>,
    },
    Stopped,
}

/// 外部プロセスエンドポイント
pub struct CommandEndpoint {
    name: String,
    argv: Vec<String>,
    warmup: Duration,
    state: Mutex<CommandState>,
}

impl CommandEndpoint {
    /// エンドポイントを作成する（`Created` 状態）
    pub fn new(init: &InitCommandRequest) -> AgentResult<Self> {
        if is_blank(&init.name) {
            return Err(AgentError::InvalidConfig(
                "cannot create command endpoint - name is empty".to_string(),
            ));
        }
        match init.cmd_components.first() {
            Some(program) if !is_blank(program) => {}
            _ => {
                return Err(AgentError::InvalidConfig(format!(
                    "cannot create command endpoint [{}] - cmd is empty",
                    init.name
                )))
            }
        }

        let warmup = match init.warmup_millis {
            0 => DEFAULT_WARMUP,
            millis => Duration::from_millis(millis),
        };

        Ok(Self {
            name: init.name.clone(),
            argv: init.cmd_components.clone(),
            warmup,
            state: Mutex::new(CommandState::Created),
        })
    }

    /// 実行中プロセスのPID
    pub async fn pid(&self) -> Option<u32> {
        match &*self.state.lock().await {
            CommandState::Running { pid, .. } => *pid,
            _ => None,
        }
    }

    /// プロセスを起動し、ウォームアップ時間だけ待つ
    pub async fn start(&self) -> AgentResult<()> {
        {
            let mut state = self.state.lock().await;
            match &*state {
                CommandState::Created => {}
                CommandState::Running { .. } => return Ok(()),
                CommandState::Stopped => {
                    return Err(AgentError::LaunchFailed(format!(
                        "cannot start command endpoint [{}] - already stopped",
                        self.name
                    )))
                }
            }

            let mut child = Command::new(&self.argv[0])
                .args(&self.argv[1..])
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| {
                    AgentError::LaunchFailed(format!(
                        "cannot start command endpoint [{}] - {}",
                        self.name, e
                    ))
                })?;

            let pid = child.id();
            if let Some(stdout) = child.stdout.take() {
                forward_output(self.name.clone(), "stdout", stdout);
            }
            if let Some(stderr) = child.stderr.take() {
                forward_output(self.name.clone(), "stderr", stderr);
            }

            let cancel = CancellationToken::new();
            let supervisor = tokio::spawn(supervise(self.name.clone(), child, cancel.clone()));
            *state = CommandState::Running {
                pid,
                cancel,
                supervisor,
            };
            info!(endpoint = %self.name, pid = ?pid, argv = ?self.argv, "command started");
        }

        tokio::time::sleep(self.warmup).await;
        debug!(endpoint = %self.name, warmup = ?self.warmup, "command warmed up");
        Ok(())
    }
}

#[async_trait]
impl Endpoint for CommandEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    async fn shutdown(&self) -> AgentResult<()> {
        let previous = std::mem::replace(&mut *self.state.lock().await, CommandState::Stopped);
        let CommandState::Running {
            pid,
            cancel,
            supervisor,
        } = previous
        else {
            return Ok(());
        };

        cancel.cancel();
        let failure = match supervisor.await {
            Ok(Ok(status)) => {
                info!(endpoint = %self.name, %status, "command endpoint stopped");
                return Ok(());
            }
            Ok(Err(err)) => err.to_string(),
            Err(err) => err.to_string(),
        };

        warn!(
            endpoint = %self.name,
            "error while waiting for command to stop - {} - killing",
            failure
        );
        if let Some(pid) = pid {
            if let Err(err) = kill_process(pid) {
                warn!(endpoint = %self.name, pid, "could not kill command - {}", err);
            }
        }
        Err(AgentError::ShutdownTimeout(format!(
            "command endpoint [{}] did not stop cleanly - {}",
            self.name, failure
        )))
    }
}

impl Drop for CommandEndpoint {
    fn drop(&mut self) {
        if let CommandState::Running { cancel, .. } = self.state.get_mut() {
            cancel.cancel();
        }
    }
}

/// プロセスの終了かキャンセルを待つ
async fn supervise(
    name: String,
    mut child: Child,
    cancel: CancellationToken,
) -> io::Result<ExitStatus> {
    tokio::select! {
        status = child.wait() => {
            let status = status?;
            info!(endpoint = %name, %status, "command exited");
            return Ok(status);
        }
        _ = cancel.cancelled() => {}
    }

    stop_child(&name, &mut child).await
}

async fn stop_child(name: &str, child: &mut Child) -> io::Result<ExitStatus> {
    if let Some(pid) = child.id() {
        debug!(endpoint = %name, pid, "terminating command");
        if let Err(err) = terminate_process(pid) {
            warn!(endpoint = %name, pid, "could not terminate command - {}", err);
            child.start_kill()?;
        }
    }

    match tokio::time::timeout(STOP_GRACE, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!(
                endpoint = %name,
                "command did not stop within {:?} - killing",
                STOP_GRACE
            );
            child.kill().await?;
            child.wait().await
        }
    }
}

/// 出力を1行ずつdebugログに流す
fn forward_output<R>(name: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => debug!(endpoint = %name, stream, "{}", line),
                Ok(None) => break,
                Err(err) => {
                    debug!(endpoint = %name, stream, "output closed - {}", err);
                    break;
                }
            }
        }
    });
}

/// SIGTERMを送信する
#[cfg(unix)]
fn terminate_process(pid: u32) -> io::Result<()> {
    signal_process(pid, nix::sys::signal::Signal::SIGTERM)
}

/// SIGKILLを送信する
#[cfg(unix)]
fn kill_process(pid: u32) -> io::Result<()> {
    signal_process(pid, nix::sys::signal::Signal::SIGKILL)
}

#[cfg(unix)]
fn signal_process(pid: u32, signal: nix::sys::signal::Signal) -> io::Result<()> {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), signal).map_err(|e| io::Error::other(e.to_string()))
}

#[cfg(not(unix))]
fn terminate_process(_pid: u32) -> io::Result<()> {
    Err(io::Error::other("graceful termination is not supported"))
}

#[cfg(not(unix))]
fn kill_process(_pid: u32) -> io::Result<()> {
    Err(io::Error::other("kill by pid is not supported"))
}
