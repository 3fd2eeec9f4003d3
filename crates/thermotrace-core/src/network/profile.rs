use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, SubmitError};

/// Connection metadata for one participating organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrganizationProfile {
    /// Membership service provider identity, e.g. `ManufacturerMSP`.
    pub msp_id: String,
    /// TLS root certificate of the organization's peer.
    pub tls_root_cert: String,
    /// Admin MSP directory used to sign the proposal.
    pub msp_config_path: String,
    /// `host:port` of the organization's peer.
    pub peer_address: String,
}

/// Ordering service endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrdererConfig {
    pub address: String,
    pub tls_ca_file: String,
}

/// Ledger channel topology.
///
/// Certificate and config paths may reference `$PWD`; they are expanded by
/// the shell that runs the generated script, not by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    pub channel: String,
    pub chaincode: String,
    pub fabric_cfg_path: String,
    /// Organizations whose peers must endorse every submission, in the
    /// order they appear on the command line.
    pub endorsers: Vec<String>,
    pub orderer: OrdererConfig,
    pub organizations: BTreeMap<String, OrganizationProfile>,
}

impl Default for NetworkConfig {
    /// The ThermoTrace two-organization inspection channel.
    fn default() -> Self {
        let orgs = [("manufacturer", "ManufacturerMSP", 9051), ("mrolab", "MROLabMSP", 7051)];

        let organizations = orgs
            .into_iter()
            .map(|(name, msp_id, port)| {
                let domain = format!("{name}.thermotrace.com");
                let profile = OrganizationProfile {
                    msp_id: msp_id.to_string(),
                    tls_root_cert: format!(
                        "${{PWD}}/organizations/peerOrganizations/{domain}/peers/peer0.{domain}/tls/ca.crt"
                    ),
                    msp_config_path: format!(
                        "${{PWD}}/organizations/peerOrganizations/{domain}/users/Admin@{domain}/msp"
                    ),
                    peer_address: format!("peer0.{domain}:{port}"),
                };
                (name.to_string(), profile)
            })
            .collect();

        Self {
            channel: "inspection-channel".to_string(),
            chaincode: "aidefectinspection".to_string(),
            fabric_cfg_path: "${PWD}/config".to_string(),
            endorsers: vec!["manufacturer".to_string(), "mrolab".to_string()],
            orderer: OrdererConfig {
                address: "orderer1.thermotrace.com:7050".to_string(),
                tls_ca_file: "${PWD}/organizations/ordererOrganizations/thermotrace.com/orderers/orderer1.thermotrace.com/msp/tlscacerts/tlsca.thermotrace.com-cert.pem".to_string(),
            },
            organizations,
        }
    }
}

impl NetworkConfig {
    /// Load a topology from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SubmitError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SubmitError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the endorsement set is non-empty and fully defined.
    pub fn validate(&self) -> Result<()> {
        if self.endorsers.is_empty() {
            return Err(SubmitError::Config(
                "at least one endorsing organization is required".to_string(),
            ));
        }
        for name in &self.endorsers {
            if !self.organizations.contains_key(name) {
                return Err(SubmitError::Config(format!(
                    "endorser {name:?} has no organization profile"
                )));
            }
        }
        Ok(())
    }

    /// Look up the profile of a submitting organization.
    pub fn resolve(&self, name: &str) -> Result<&OrganizationProfile> {
        self.organizations
            .get(name)
            .ok_or_else(|| SubmitError::UnknownOrganization {
                name: name.to_string(),
                known: self.organization_names().join(", "),
            })
    }

    /// Profiles of every organization whose endorsement is required.
    pub fn endorsing_profiles(&self) -> Result<Vec<&OrganizationProfile>> {
        self.endorsers
            .iter()
            .map(|name| {
                self.organizations.get(name).ok_or_else(|| {
                    SubmitError::Config(format!("endorser {name:?} has no organization profile"))
                })
            })
            .collect()
    }

    pub fn organization_names(&self) -> Vec<&str> {
        self.organizations.keys().map(String::as_str).collect()
    }
}
