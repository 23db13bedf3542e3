//! Assertion macros shared by test helpers and integration tests.

/// Await a receive future and panic with contextual diagnostics on failure.
#[macro_export]
macro_rules! recv_expect {
    ($fut:expr) => {{
        $fut.await
            .expect(concat!("recv failed at ", file!(), ":", line!()))
    }};
    ($fut:expr, $msg:expr) => {{
        let m = ::std::format!("{msg} at {}:{}", file!(), line!(), msg = $msg);
        $fut.await.expect(&m)
    }};
}

/// Assert that the recorded writes hold only the given payloads and heartbeats.
#[macro_export]
macro_rules! assert_writes_within {
    ($writes:expr, $payloads:expr) => {{
        let payloads: ::std::vec::Vec<::std::string::String> = $payloads
            .iter()
            .map(|p| ::std::format!("{p}\n"))
            .collect();
        let heartbeat = ::std::format!("{}\n", ::flowframe::HEARTBEAT_MARKER);
        for write in &$writes {
            assert!(
                *write == heartbeat || payloads.contains(write),
                "unexpected write {write:?} at {}:{}",
                file!(),
                line!()
            );
        }
    }};
}

pub use crate::{assert_writes_within, recv_expect};
