use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Which of the two proxied handles can be read without blocking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readiness {
    pub input: bool,
    pub output: bool,
}

/// Wait up to `timeout` for the controlling input (if still open) or the PTY
/// master to become readable.
///
/// Uses `select()` rather than `poll()`: `poll()` does not work on
/// terminal devices on macOS. A signal arriving during the wait returns an
/// empty [`Readiness`] so the caller can check its signal flags.
pub fn wait_readable(input: Option<RawFd>, master: RawFd, timeout: Duration) -> io::Result<Readiness> {
    let fds = [input, Some(master)];
    for fd in fds.iter().flatten() {
        if *fd < 0 || *fd >= libc::FD_SETSIZE as RawFd {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("descriptor {} out of select() range", fd),
            ));
        }
    }
    let nfds = fds.iter().flatten().copied().max().unwrap_or(master) + 1;

    unsafe {
        let mut read_fds: libc::fd_set = std::mem::zeroed();
        libc::FD_ZERO(&mut read_fds);
        for fd in fds.iter().flatten() {
            libc::FD_SET(*fd, &mut read_fds);
        }

        let mut tv = libc::timeval {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_usec: timeout.subsec_micros() as libc::suseconds_t,
        };

        let ret = libc::select(
            nfds,
            &mut read_fds,
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            &mut tv,
        );
        if ret < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Readiness::default());
            }
            return Err(err);
        }
        if ret == 0 {
            return Ok(Readiness::default());
        }

        Ok(Readiness {
            input: match input {
                Some(fd) => libc::FD_ISSET(fd, &read_fds),
                None => false,
            },
            output: libc::FD_ISSET(master, &read_fds),
        })
    }
}
