use rama::telemetry::tracing;

pub use libc::rlim_t;

/// Raise the soft limit of open file descriptors towards `target`,
/// capped by the hard limit. Every accepted connection holds one.
pub fn raise_nofile(target: rlim_t) -> std::io::Result<()> {
    use std::{io, mem};

    // SAFETY: `lim` is a plain C struct fully written by `getrlimit`
    // before it is read, and only passed by valid pointer.
    unsafe {
        let mut lim: libc::rlimit = mem::zeroed();
        if libc::getrlimit(libc::RLIMIT_NOFILE, &mut lim) != 0 {
            return Err(io::Error::last_os_error());
        }

        let new_soft = target.min(lim.rlim_max);
        if lim.rlim_cur >= new_soft {
            tracing::info!(
                "ulimit: keep current limit ({}) as it is not below the requested soft limit ({new_soft})",
                lim.rlim_cur,
            );
            return Ok(());
        }

        let previous_value = lim.rlim_cur;
        lim.rlim_cur = new_soft;
        if libc::setrlimit(libc::RLIMIT_NOFILE, &lim) != 0 {
            return Err(io::Error::last_os_error());
        }
        tracing::info!("ulimit: raised soft limit to {new_soft}; previous value = {previous_value}");
    }

    Ok(())
}
