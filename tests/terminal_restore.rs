mod common;

#[cfg(unix)]
mod terminal_restore {
    use super::common::{sh, FakeTerminal};
    use autoyes::proxy::start_session;
    use autoyes::pty::{snapshot, Session};
    use std::os::fd::AsRawFd;

    #[test]
    fn session_switches_to_raw_and_restores_on_close() {
        let terminal = FakeTerminal::open().expect("openpty");
        let fd = terminal.slave.as_raw_fd();
        let before = snapshot(fd).expect("snapshot before");
        assert_ne!(before.c_lflag & libc::ICANON, 0);

        let mut session = Session::open_on("sh", &sh("exit 3"), fd).expect("open session");
        assert!(session.is_raw());
        let during = snapshot(fd).expect("snapshot during");
        assert_eq!(during.c_lflag & (libc::ICANON | libc::ECHO | libc::ISIG), 0);

        assert_eq!(session.close(), Some(3));

        let after = snapshot(fd).expect("snapshot after");
        assert_eq!(after.c_lflag, before.c_lflag);
        assert_eq!(after.c_iflag, before.c_iflag);
        assert_eq!(after.c_oflag, before.c_oflag);
        assert_eq!(after.c_cflag, before.c_cflag);
        assert_eq!(after.c_cc, before.c_cc);
    }

    #[test]
    fn dropping_a_session_restores_the_terminal() {
        let terminal = FakeTerminal::open().expect("openpty");
        let fd = terminal.slave.as_raw_fd();
        let before = snapshot(fd).expect("snapshot before");

        {
            let _session = Session::open_on("sh", &sh("sleep 5"), fd).expect("open session");
        }

        let after = snapshot(fd).expect("snapshot after");
        assert_eq!(after.c_lflag, before.c_lflag);
    }

    #[test]
    fn close_is_idempotent() {
        let terminal = FakeTerminal::open().expect("openpty");
        let fd = terminal.slave.as_raw_fd();
        let mut session = Session::open_on("sh", &sh("exit 7"), fd).expect("open session");
        assert_eq!(session.close(), Some(7));
        assert_eq!(session.close(), Some(7));
        assert!(!session.is_raw());
    }

    #[test]
    fn missing_command_fails_to_spawn() {
        let terminal = FakeTerminal::open().expect("openpty");
        let fd = terminal.slave.as_raw_fd();
        let before = snapshot(fd).expect("snapshot before");

        let result = Session::open_on("autoyes-definitely-missing-command", &[], fd);
        assert!(result.is_err());

        let after = snapshot(fd).expect("snapshot after");
        assert_eq!(after.c_lflag, before.c_lflag);
    }

    #[test]
    fn non_terminal_control_fd_is_not_touched() {
        let file = tempfile::tempfile().expect("temp file");
        let mut session =
            Session::open_on("sh", &sh("exit 0"), file.as_raw_fd()).expect("open session");
        assert!(!session.is_raw());
        assert_eq!(session.close(), Some(0));
    }

    #[test]
    fn termination_signal_while_raw_is_caught() {
        let terminal = FakeTerminal::open().expect("openpty");
        let fd = terminal.slave.as_raw_fd();
        let before = snapshot(fd).expect("snapshot before");

        let (mut session, signals) =
            start_session("sh", &sh("sleep 5"), fd).expect("start session");
        assert!(session.is_raw());

        assert_eq!(unsafe { libc::raise(libc::SIGTERM) }, 0);
        assert!(signals.is_shutting_down());

        session.close();
        let after = snapshot(fd).expect("snapshot after");
        assert_eq!(after.c_lflag, before.c_lflag);
    }
}
