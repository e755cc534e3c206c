//! Configuration structs for `Exporter`/`Collector`, deserializable with
//! `serde` and validated against §6's bounds before use.

use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::exporter::ExporterConfig;

const MIN_TEMPLATE_REFRESH_SECONDS: f64 = 1.0;
const MAX_TEMPLATE_REFRESH_SECONDS: f64 = 86400.0;

#[derive(Debug, Clone, Deserialize)]
pub struct ExporterSettings {
    pub local_ip: IpAddr,
    pub server_ip: IpAddr,
    pub server_port: u32,
    pub transport: String,
    pub template_refresh_timeout: f64,
}

impl ExporterSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_port(self.server_port)?;
        validate_transport(&self.transport)?;
        if !(MIN_TEMPLATE_REFRESH_SECONDS..=MAX_TEMPLATE_REFRESH_SECONDS).contains(&self.template_refresh_timeout) {
            return Err(ConfigError::InvalidRefreshTimeout(self.template_refresh_timeout));
        }
        Ok(())
    }

    pub fn into_exporter_config(self) -> Result<ExporterConfig, ConfigError> {
        self.validate()?;
        Ok(ExporterConfig {
            local_ip: self.local_ip,
            server_ip: self.server_ip,
            server_port: self.server_port as u16,
            template_refresh_interval: Duration::from_secs_f64(self.template_refresh_timeout),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorSettings {
    pub listen_ip: IpAddr,
    pub listen_port: u32,
    pub transport: String,
}

impl CollectorSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_port(self.listen_port)?;
        validate_transport(&self.transport)
    }

    pub fn into_collector_config(self) -> Result<crate::collector::CollectorConfig, ConfigError> {
        self.validate()?;
        Ok(crate::collector::CollectorConfig {
            listen_ip: self.listen_ip,
            listen_port: self.listen_port as u16,
        })
    }
}

fn validate_port(port: u32) -> Result<(), ConfigError> {
    if port == 0 || port > 65535 {
        return Err(ConfigError::InvalidPort(port));
    }
    Ok(())
}

fn validate_transport(transport: &str) -> Result<(), ConfigError> {
    if transport != "udp" {
        return Err(ConfigError::TransportReserved(transport.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn rejects_out_of_range_refresh_timeout() {
        let settings = ExporterSettings {
            local_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            server_ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            server_port: 4739,
            transport: "udp".to_string(),
            template_refresh_timeout: 100_000.0,
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_tcp_transport() {
        let settings = CollectorSettings {
            listen_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: 4739,
            transport: "tcp".to_string(),
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn accepts_well_formed_exporter_settings() {
        let settings = ExporterSettings {
            local_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            server_ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            server_port: 4739,
            transport: "udp".to_string(),
            template_refresh_timeout: 300.0,
        };
        assert!(settings.into_exporter_config().is_ok());
    }
}
