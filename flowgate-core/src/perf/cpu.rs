//! CPU affinity and real-time scheduling for the ingress/publish
//! threads, driven by the `--cpu-pin`/`--realtime` flags.

use anyhow::Result;
use core_affinity::CoreId;

/// Pin the current thread to a specific core, preventing OS migration and
/// the cache evictions that come with it.
pub fn pin_to_core(core: usize) -> Result<()> {
    let core_id = CoreId { id: core };
    if core_affinity::set_for_current(core_id) {
        tracing::info!(core, "pinned thread to core");
        Ok(())
    } else {
        anyhow::bail!("failed to pin thread to core {core}")
    }
}

/// Set `SCHED_FIFO` real-time priority (Linux only). Requires
/// `CAP_SYS_NICE` or root; failures are returned, never panicked on.
#[cfg(target_os = "linux")]
pub fn set_realtime_priority(priority: i32) -> Result<()> {
    use libc::{sched_param, sched_setscheduler, SCHED_FIFO};

    unsafe {
        let param = sched_param { sched_priority: priority };
        if sched_setscheduler(0, SCHED_FIFO, &param) == 0 {
            tracing::info!(priority, "set SCHED_FIFO priority");
            Ok(())
        } else {
            anyhow::bail!("failed to set SCHED_FIFO priority (need CAP_SYS_NICE or root)")
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn set_realtime_priority(_priority: i32) -> Result<()> {
    tracing::warn!("real-time priority is only supported on Linux");
    Ok(())
}

pub fn num_cores() -> usize {
    core_affinity::get_core_ids().map(|ids| ids.len()).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_cores_is_nonzero() {
        assert!(num_cores() > 0);
    }
}
