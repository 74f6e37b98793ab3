//! Signer collaborator: a long-lived external process exchanging NDJSON
//! lines on stdio. Keeping EIP-712 signing in a separate process rather
//! than pulling a signing crate into this binary keeps signing entirely
//! out of the Hyperliquid adapter itself — the adapter only ever talks
//! to this bridge.

use crate::error::{CoreError, CoreResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::error;

#[derive(Debug, Clone, Serialize)]
pub struct SignRequest {
    pub id: u64,
    pub private_key: String,
    pub action: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vault_address: Option<String>,
    pub nonce: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_after: Option<u64>,
    pub is_mainnet: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignResponse {
    pub id: u64,
    #[serde(default)]
    pub r: Option<String>,
    #[serde(default)]
    pub s: Option<String>,
    #[serde(default)]
    pub v: Option<u8>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Signature {
    pub r: String,
    pub s: String,
    pub v: u8,
}

/// Process handle plus its stdio pipes, guarded by one mutex: requests
/// are correlated by `id`, but the adapter only ever issues one signing
/// call at a time per in-flight action, so a full round trip under the
/// lock is simpler than a pending-request table and costs nothing on
/// the signing path (never the ingress/publish hot path).
pub struct Signer {
    child: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    stdout: Mutex<BufReader<ChildStdout>>,
    next_id: AtomicU64,
}

impl Signer {
    /// Spawn the external signer process, at the paths given by
    /// `LATENTSPEED_HL_SIGNER_PYTHON` / `LATENTSPEED_HL_SIGNER_SCRIPT`.
    pub fn spawn(python: &str, script: &str) -> CoreResult<Self> {
        let mut child = Command::new(python)
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| CoreError::Signer(format!("failed to spawn signer process: {e}")))?;

        let stdin = child.stdin.take().ok_or_else(|| CoreError::Signer("signer process has no stdin".into()))?;
        let stdout = child.stdout.take().ok_or_else(|| CoreError::Signer("signer process has no stdout".into()))?;

        Ok(Self {
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(BufReader::new(stdout)),
            next_id: AtomicU64::new(1),
        })
    }

    /// Sign one action. Blocking; run from an adapter's private I/O
    /// thread, never from `T_ingress`/`T_publish`.
    pub fn sign(
        &self,
        private_key: &str,
        action: serde_json::Value,
        vault_address: Option<String>,
        nonce: u64,
        expires_after: Option<u64>,
        is_mainnet: bool,
    ) -> CoreResult<Signature> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = SignRequest {
            id,
            private_key: private_key.to_string(),
            action,
            vault_address,
            nonce,
            expires_after,
            is_mainnet,
        };
        let line = serde_json::to_string(&request).map_err(CoreError::Parse)?;

        {
            let mut stdin = self.stdin.lock();
            writeln!(stdin, "{line}").map_err(|e| CoreError::Signer(format!("failed to write to signer stdin: {e}")))?;
            stdin.flush().map_err(|e| CoreError::Signer(format!("failed to flush signer stdin: {e}")))?;
        }

        let mut response_line = String::new();
        {
            let mut stdout = self.stdout.lock();
            let n = stdout
                .read_line(&mut response_line)
                .map_err(|e| CoreError::Signer(format!("failed to read signer stdout: {e}")))?;
            if n == 0 {
                return Err(CoreError::Signer("signer process closed stdout".into()));
            }
        }

        let response: SignResponse = serde_json::from_str(response_line.trim()).map_err(CoreError::Parse)?;
        if response.id != id {
            error!(expected = id, got = response.id, "signer response id mismatch");
            return Err(CoreError::Signer("signer response id mismatch".into()));
        }
        if let Some(err) = response.error {
            return Err(CoreError::Signer(err));
        }
        match (response.r, response.s, response.v) {
            (Some(r), Some(s), Some(v)) => Ok(Signature { r, s, v }),
            _ => Err(CoreError::Signer("signer response missing r/s/v".into())),
        }
    }

    pub fn shutdown(&self) {
        let _ = self.child.lock().kill();
    }
}

impl Drop for Signer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
