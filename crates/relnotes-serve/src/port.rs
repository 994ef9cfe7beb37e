//! Port selection and server URL helpers.

use std::net::TcpListener;

use relnotes_core::Port;

use crate::{Error, Result};

/// Ask the OS for a free port on the loopback interface.
pub fn get_available_port() -> Option<u16> {
    TcpListener::bind(("127.0.0.1", 0))
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .ok()
}

/// Returns `true` if `port` can be bound on the loopback interface.
pub fn port_is_available(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok()
}

/// Resolve the configured port to a concrete, currently free one.
pub fn setup_port(port: &Port) -> Result<u16> {
    match port {
        Port::Random => get_available_port().ok_or(Error::NoAvailablePort),
        Port::Value(port) if port_is_available(*port) => Ok(*port),
        Port::Value(port) => Err(Error::PortUnavailable { port: *port }),
    }
}

/// Join host and port into a URL, adding `http://` when no scheme is given.
///
/// ```rust
/// use relnotes_serve::setup_server_url;
///
/// assert_eq!(setup_server_url("127.0.0.1", 8080), "http://127.0.0.1:8080");
/// assert_eq!(setup_server_url("https://localhost", 443), "https://localhost:443");
/// ```
pub fn setup_server_url(host: &str, port: u16) -> String {
    let url = format!("{host}:{port}");
    if url.starts_with("http") {
        url
    } else {
        format!("http://{url}")
    }
}

/// The `host:port` part of a server URL, suitable for binding.
pub fn bind_address(url: &str) -> &str {
    url.strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .unwrap_or(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_get_available_port() {
        let port = get_available_port().unwrap();
        assert_ne!(port, 0);
    }

    #[test]
    fn test_port_in_use_is_unavailable() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(!port_is_available(port));
        assert!(matches!(
            setup_port(&Port::Value(port)),
            Err(Error::PortUnavailable { port: p }) if p == port
        ));

        drop(listener);
        assert!(port_is_available(port));
        assert_eq!(setup_port(&Port::Value(port)).unwrap(), port);
    }

    #[test]
    fn test_setup_random_port() {
        let port = setup_port(&Port::Random).unwrap();
        assert_ne!(port, 0);
    }

    #[test]
    fn test_setup_server_url() {
        assert_eq!(setup_server_url("localhost", 4000), "http://localhost:4000");
        assert_eq!(
            setup_server_url("http://0.0.0.0", 4000),
            "http://0.0.0.0:4000"
        );
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(bind_address("http://127.0.0.1:8080"), "127.0.0.1:8080");
        assert_eq!(bind_address("https://localhost:443"), "localhost:443");
        assert_eq!(bind_address("127.0.0.1:8080"), "127.0.0.1:8080");
    }

    fn host() -> impl Strategy<Value = String> {
        (
            prop_oneof![Just(""), Just("http://"), Just("https://")],
            "[a-z0-9]{1,12}(\\.[a-z0-9]{1,12}){0,3}",
        )
            .prop_map(|(scheme, name)| format!("{scheme}{name}"))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10_000))]

        #[test]
        fn test_server_url_carries_port(host in host(), port in any::<u16>()) {
            let url = setup_server_url(&host, port);
            let suffix = format!(":{port}");
            prop_assert!(url.starts_with("http"));
            prop_assert!(url.contains(&suffix));
            prop_assert!(bind_address(&url).ends_with(&suffix));
            prop_assert!(!bind_address(&url).contains("://"));
        }
    }
}
