//! Hostname lookup for nameserver registration.

use std::net::IpAddr;

use arsys_error::RegistrarError;
use trust_dns_resolver::TokioAsyncResolver;

/// Resolves a nameserver host to the address registered alongside it.
#[async_trait::async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> Result<IpAddr, RegistrarError>;
}

/// Resolver backed by the system DNS configuration.
pub struct SystemResolver {
    resolver: TokioAsyncResolver,
}

impl SystemResolver {
    pub fn from_system_conf() -> Result<Self, RegistrarError> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|e| RegistrarError::Config(format!("cannot load resolver configuration: {}", e)))?;
        Ok(Self { resolver })
    }
}

#[async_trait::async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<IpAddr, RegistrarError> {
        let host = host.trim();
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }

        let lookup = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| RegistrarError::Lookup {
                host: host.to_string(),
                message: e.to_string(),
            })?;

        let addresses: Vec<IpAddr> = lookup.iter().collect();
        pick_address(&addresses).ok_or_else(|| RegistrarError::Lookup {
            host: host.to_string(),
            message: "no address records".to_string(),
        })
    }
}

/// IPv4 first, as a nameserver registration expects one.
fn pick_address(addresses: &[IpAddr]) -> Option<IpAddr> {
    addresses
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addresses.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_ipv4() {
        let v6: IpAddr = "2001:db8::1".parse().expect("v6");
        let v4: IpAddr = "192.0.2.10".parse().expect("v4");
        assert_eq!(pick_address(&[v6, v4]), Some(v4));
        assert_eq!(pick_address(&[v6]), Some(v6));
        assert_eq!(pick_address(&[]), None);
    }
}
