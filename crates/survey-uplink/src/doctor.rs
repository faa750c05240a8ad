use anyhow::{Context, Result};

use crate::parse_endpoint;

pub fn check_endpoint(endpoint: &str, timeout_ms: u64) -> Result<()> {
    parse_endpoint(endpoint).with_context(|| format!("uplink.endpoint invalid: {}", endpoint))?;
    anyhow::ensure!(timeout_ms >= 100, "uplink.timeout_ms too small; set >= 100");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_tcp_endpoint() {
        check_endpoint("tcp://10.0.0.2:5000", 2000).unwrap();
    }

    #[test]
    fn rejects_bad_endpoints() {
        assert!(check_endpoint("tls://10.0.0.2:5000", 2000).is_err());
        assert!(check_endpoint("tcp://:5000", 2000).is_err());
        assert!(check_endpoint("tcp://10.0.0.2:5000", 10).is_err());
    }
}
