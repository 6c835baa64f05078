//! Public address discovery
//!
//! "What is my IP" endpoints are occasionally down or answer with garbage, so
//! every answer is trimmed, parsed and checked for global routability before
//! it is accepted. A rejected answer costs one attempt; running out of
//! attempts is fatal.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::DEFAULT_MAX_ATTEMPTS;
use crate::error::{Error, Result};
use crate::traits::AddressLookup;

/// Address family accepted by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    /// IPv4 only
    #[default]
    V4,
    /// IPv6 only
    V6,
    /// Either family
    Any,
}

impl IpVersion {
    fn accepts(self, ip: &IpAddr) -> bool {
        match self {
            IpVersion::V4 => ip.is_ipv4(),
            IpVersion::V6 => ip.is_ipv6(),
            IpVersion::Any => true,
        }
    }
}

/// Bounded-retry public address resolver
#[derive(Debug, Clone)]
pub struct PublicAddressResolver {
    max_attempts: u32,
    version: IpVersion,
    retry_delay: Duration,
}

impl Default for PublicAddressResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl PublicAddressResolver {
    /// Create a resolver that tries up to `max_attempts` times (at least once)
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            version: IpVersion::V4,
            retry_delay: Duration::ZERO,
        }
    }

    /// Restrict accepted answers to an address family
    pub fn with_version(mut self, version: IpVersion) -> Self {
        self.version = version;
        self
    }

    /// Wait this long between failed attempts
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Attempt budget
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Ask `lookup` for the public address until a valid one comes back
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: A globally routable address of the configured family
    /// - `Err(Error::AddressDiscovery)`: Every attempt failed
    pub async fn resolve(&self, lookup: &dyn AddressLookup) -> Result<IpAddr> {
        for attempt in 1..=self.max_attempts {
            info!(
                "Getting public IP address from {}: attempt {}",
                lookup.endpoint(),
                attempt
            );

            match lookup.fetch().await {
                Ok(body) => match self.validate(&body) {
                    Ok(ip) => {
                        info!("Found our actual public IP to be {}", ip);
                        return Ok(ip);
                    }
                    Err(reason) => warn!("Attempt {}: {}", attempt, reason),
                },
                Err(e) => warn!("Attempt {}: lookup failed: {}", attempt, e),
            }

            if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(Error::address_discovery(self.max_attempts))
    }

    /// Turn a response body into an acceptable address, or say why not
    fn validate(&self, body: &str) -> std::result::Result<IpAddr, String> {
        let candidate = body.trim();

        let ip: IpAddr = candidate
            .parse()
            .map_err(|_| format!("'{}' does not appear to be an IP address", candidate))?;

        if !is_global(&ip) {
            return Err(format!("'{}' does not appear to be a public IP address", ip));
        }

        if !self.version.accepts(&ip) {
            return Err(format!("'{}' is not of the expected address family", ip));
        }

        Ok(ip)
    }
}

/// Whether `ip` is globally routable
///
/// Rejects unspecified, loopback, private, shared (CGNAT), link-local,
/// multicast, broadcast and reserved ranges. The IPv4 documentation ranges
/// are accepted; the IPv6 documentation range is not.
pub fn is_global(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_global_v4(v4),
        IpAddr::V6(v6) => is_global_v6(v6),
    }
}

fn is_global_v4(ip: &Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();

    let this_network = a == 0;
    let shared = a == 100 && (b & 0b1100_0000) == 64;
    let protocol_assignments = a == 192 && b == 0 && c == 0;
    let benchmarking = a == 198 && (b & 0xfe) == 18;
    let reserved = a >= 240;

    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast()
        || this_network
        || shared
        || protocol_assignments
        || benchmarking
        || reserved)
}

fn is_global_v6(ip: &Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_global_v4(&mapped);
    }

    let segments = ip.segments();
    let unique_local = (segments[0] & 0xfe00) == 0xfc00;
    let link_local = (segments[0] & 0xffc0) == 0xfe80;
    let discard_only = segments[0] == 0x0100 && segments[1..4] == [0, 0, 0];
    let nat64 = segments[0] == 0x0064 && segments[1] == 0xff9b;
    let documentation = segments[0] == 0x2001 && segments[1] == 0x0db8;
    let six_to_four = segments[0] == 0x2002;
    let protocol_assignments = segments[0] == 0x2001 && segments[1] < 0x0200 && {
        // Globally reachable carve-outs of 2001::/23
        let anycast = segments[1] == 0x0001 && segments[2..7] == [0; 5] && segments[7] <= 2;
        let amt = segments[1] == 0x0003;
        let as112 = segments[1] == 0x0004 && segments[2] == 0x0112;
        let orchid_v2 = (0x0020..=0x002f).contains(&segments[1]);
        !(anycast || amt || as112 || orchid_v2)
    };

    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_multicast()
        || unique_local
        || link_local
        || discard_only
        || nat64
        || documentation
        || six_to_four
        || protocol_assignments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_non_global_v4() {
        for s in [
            "10.0.0.5",
            "127.0.0.1",
            "169.254.1.1",
            "172.16.4.4",
            "192.168.1.1",
            "100.64.0.1",
            "0.0.0.0",
            "224.0.0.1",
            "255.255.255.255",
            "240.0.0.1",
            "198.18.0.1",
        ] {
            assert!(!is_global(&ip(s)), "{} should not be global", s);
        }
    }

    #[test]
    fn test_global_v4() {
        for s in ["203.0.113.7", "8.8.8.8", "1.2.3.4", "100.128.0.1", "172.32.0.1"] {
            assert!(is_global(&ip(s)), "{} should be global", s);
        }
    }

    #[test]
    fn test_v6_classification() {
        assert!(is_global(&ip("2606:4700:4700::1111")));
        assert!(!is_global(&ip("::1")));
        assert!(!is_global(&ip("fe80::1")));
        assert!(!is_global(&ip("fd00::1")));
        assert!(!is_global(&ip("ff02::1")));
        assert!(!is_global(&ip("::ffff:10.0.0.1")));
        assert!(is_global(&ip("::ffff:8.8.8.8")));
    }

    #[test]
    fn test_v6_special_purpose_ranges() {
        for s in [
            "2001:db8::1",
            "2001::1",
            "2001:100::1",
            "64:ff9b::808:808",
            "2002:cb00:7107::1",
            "100::1",
        ] {
            assert!(!is_global(&ip(s)), "{} should not be global", s);
        }

        for s in ["2001:4860:4860::8888", "2001:1::1", "2001:3::1", "2001:20::1", "2a00:1450::1"] {
            assert!(is_global(&ip(s)), "{} should be global", s);
        }
    }

    #[test]
    fn test_ip_version_names() {
        let version: IpVersion = serde_json::from_str(r#""v6""#).unwrap();
        assert_eq!(version, IpVersion::V6);
        assert_eq!(serde_json::to_string(&IpVersion::Any).unwrap(), r#""any""#);
    }

    #[test]
    fn test_validate_trims_and_filters_family() {
        let resolver = PublicAddressResolver::new(1);
        assert_eq!(resolver.validate("203.0.113.7\n").unwrap(), ip("203.0.113.7"));
        assert!(resolver.validate("<html>oops</html>").is_err());
        assert!(resolver.validate("2606:4700:4700::1111").is_err());

        let resolver = PublicAddressResolver::new(1).with_version(IpVersion::Any);
        assert!(resolver.validate("2606:4700:4700::1111").is_ok());
    }

    #[test]
    fn test_attempt_budget_is_at_least_one() {
        assert_eq!(PublicAddressResolver::new(0).max_attempts(), 1);
        assert_eq!(PublicAddressResolver::default().max_attempts(), 5);
    }
}
