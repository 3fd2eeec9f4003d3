//! Chaincode invocation command construction.
//!
//! The command is assembled as structured data (environment assignments,
//! program, argument list) and only turned into shell text by
//! [`InvokeCommand::to_shell`]. Nothing here executes the command.

use serde_json::json;

use crate::error::Result;
use crate::network::profile::NetworkConfig;
use crate::record::InspectionRecord;

/// Chaincode function that records an inspection.
pub const INVOKE_FUNCTION: &str = "AddDefectInspection";

/// A single shell word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellArg {
    /// Passed through verbatim; quoted so the shell performs no expansion.
    Literal(String),
    /// May contain `$VAR` references that the shell should expand.
    Expand(String),
}

impl ShellArg {
    pub fn literal(s: impl Into<String>) -> Self {
        Self::Literal(s.into())
    }

    pub fn expand(s: impl Into<String>) -> Self {
        Self::Expand(s.into())
    }

    /// The unquoted value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(s) | Self::Expand(s) => s,
        }
    }

    /// Render as a single POSIX shell word.
    pub fn quoted(&self) -> String {
        match self {
            Self::Literal(s) => quote_literal(s),
            Self::Expand(s) => quote_expandable(s),
        }
    }
}

/// A `peer chaincode invoke` call plus the environment it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeCommand {
    pub env: Vec<(String, ShellArg)>,
    pub program: String,
    pub args: Vec<ShellArg>,
}

impl InvokeCommand {
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Unquoted argument vector, program first.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(ShellArg::as_str))
            .collect()
    }

    /// Value following the first occurrence of `flag`.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a.as_str() == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(ShellArg::as_str)
    }

    /// Every value following each occurrence of `flag`.
    pub fn flag_values(&self, flag: &str) -> Vec<&str> {
        self.args
            .windows(2)
            .filter(|w| w[0].as_str() == flag)
            .map(|w| w[1].as_str())
            .collect()
    }

    /// Serialize to shell text: one `export` per environment entry, then
    /// the command with each option on its own continuation line.
    pub fn to_shell(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.env {
            out.push_str(&format!("export {key}={}\n", value.quoted()));
        }

        out.push_str(&quote_literal(&self.program));
        for arg in &self.args {
            let word = arg.quoted();
            if arg.as_str().starts_with('-') {
                out.push_str(" \\\n    ");
            } else {
                out.push(' ');
            }
            out.push_str(&word);
        }
        out.push('\n');
        out
    }
}

/// Build the invocation that submits `record` as organization `home`.
///
/// The environment identifies the submitting organization. The argument
/// list names the peer and TLS root certificate of every endorsing
/// organization, because the channel's endorsement policy requires all of
/// them to co-sign. A record that fails
/// [`InspectionRecord::check_consistency`] is rejected before anything is
/// composed.
pub fn compose_invoke(
    record: &InspectionRecord,
    network: &NetworkConfig,
    home: &str,
) -> Result<InvokeCommand> {
    let profile = network.resolve(home)?;
    let endorsers = network.endorsing_profiles()?;

    record.check_consistency()?;
    let payload = serde_json::to_string(&json!({
        "Args": [INVOKE_FUNCTION, record.to_compact_json()?],
    }))?;

    let env = vec![
        ("FABRIC_CFG_PATH".to_string(), ShellArg::expand(&network.fabric_cfg_path)),
        ("CORE_PEER_TLS_ENABLED".to_string(), ShellArg::literal("true")),
        ("CORE_PEER_LOCALMSPID".to_string(), ShellArg::literal(&profile.msp_id)),
        (
            "CORE_PEER_TLS_ROOTCERT_FILE".to_string(),
            ShellArg::expand(&profile.tls_root_cert),
        ),
        (
            "CORE_PEER_MSPCONFIGPATH".to_string(),
            ShellArg::expand(&profile.msp_config_path),
        ),
        ("CORE_PEER_ADDRESS".to_string(), ShellArg::literal(&profile.peer_address)),
    ];

    let mut args = vec![
        ShellArg::literal("chaincode"),
        ShellArg::literal("invoke"),
        ShellArg::literal("-o"),
        ShellArg::literal(&network.orderer.address),
        ShellArg::literal("--tls"),
        ShellArg::literal("--cafile"),
        ShellArg::expand(&network.orderer.tls_ca_file),
        ShellArg::literal("-C"),
        ShellArg::literal(&network.channel),
        ShellArg::literal("-n"),
        ShellArg::literal(&network.chaincode),
        ShellArg::literal("-c"),
        ShellArg::Literal(payload),
    ];
    for endorser in endorsers {
        args.push(ShellArg::literal("--peerAddresses"));
        args.push(ShellArg::literal(&endorser.peer_address));
        args.push(ShellArg::literal("--tlsRootCertFiles"));
        args.push(ShellArg::expand(&endorser.tls_root_cert));
    }

    Ok(InvokeCommand {
        env,
        program: "peer".to_string(),
        args,
    })
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c)
}

/// Quote `s` so the shell treats it as one word with no expansion.
pub fn quote_literal(s: &str) -> String {
    if !s.is_empty() && s.chars().all(is_shell_safe) {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Quote `s` as one word, leaving `$` expansion enabled.
pub fn quote_expandable(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::model::fixtures::sample_record;

    fn compose(home: &str) -> InvokeCommand {
        compose_invoke(&sample_record(), &NetworkConfig::default(), home).unwrap()
    }

    #[test]
    fn manufacturer_environment_identifies_manufacturer() {
        let cmd = compose("manufacturer");

        assert_eq!(cmd.env_value("CORE_PEER_LOCALMSPID"), Some("ManufacturerMSP"));
        assert!(cmd.env_value("CORE_PEER_ADDRESS").unwrap().ends_with(":9051"));
        assert_eq!(cmd.env_value("CORE_PEER_TLS_ENABLED"), Some("true"));
    }

    #[test]
    fn mrolab_environment_identifies_mrolab() {
        let cmd = compose("mrolab");

        assert_eq!(cmd.env_value("CORE_PEER_LOCALMSPID"), Some("MROLabMSP"));
        assert!(cmd.env_value("CORE_PEER_ADDRESS").unwrap().ends_with(":7051"));
        assert!(
            cmd.env_value("CORE_PEER_MSPCONFIGPATH")
                .unwrap()
                .contains("Admin@mrolab.thermotrace.com")
        );
    }

    #[test]
    fn every_endorser_is_referenced_regardless_of_submitter() {
        let network = NetworkConfig::default();
        let expected_certs: Vec<&str> = network
            .endorsing_profiles()
            .unwrap()
            .iter()
            .map(|p| p.tls_root_cert.as_str())
            .collect();

        for home in ["manufacturer", "mrolab"] {
            let cmd = compose(home);
            assert_eq!(cmd.flag_values("--tlsRootCertFiles"), expected_certs);
            assert_eq!(
                cmd.flag_values("--peerAddresses"),
                vec![
                    "peer0.manufacturer.thermotrace.com:9051",
                    "peer0.mrolab.thermotrace.com:7051"
                ]
            );
        }
    }

    #[test]
    fn targets_channel_chaincode_and_orderer() {
        let cmd = compose("manufacturer");

        assert_eq!(&cmd.argv()[..3], &["peer", "chaincode", "invoke"]);
        assert_eq!(cmd.flag_value("-C"), Some("inspection-channel"));
        assert_eq!(cmd.flag_value("-n"), Some("aidefectinspection"));
        assert_eq!(cmd.flag_value("-o"), Some("orderer1.thermotrace.com:7050"));
        assert!(cmd.argv().contains(&"--tls"));
    }

    #[test]
    fn payload_embeds_record_as_json_string_argument() {
        let record = sample_record();
        let cmd = compose_invoke(&record, &NetworkConfig::default(), "manufacturer").unwrap();

        let payload: serde_json::Value =
            serde_json::from_str(cmd.flag_value("-c").unwrap()).unwrap();
        let args = payload["Args"].as_array().unwrap();

        assert_eq!(args.len(), 2);
        assert_eq!(args[0], INVOKE_FUNCTION);
        let embedded: InspectionRecord =
            serde_json::from_str(args[1].as_str().unwrap()).unwrap();
        assert_eq!(embedded, record);
    }

    #[test]
    fn inconsistent_record_is_not_composed() {
        let mut record = sample_record();
        record.defect_detected = false;

        let err = compose_invoke(&record, &NetworkConfig::default(), "manufacturer");
        assert!(matches!(
            err,
            Err(crate::error::SubmitError::InconsistentRecord(_))
        ));
    }

    #[test]
    fn unknown_home_organization_is_rejected() {
        let err = compose_invoke(&sample_record(), &NetworkConfig::default(), "airline");
        assert!(matches!(
            err,
            Err(crate::error::SubmitError::UnknownOrganization { .. })
        ));
    }

    #[test]
    fn shell_text_lists_exports_then_command() {
        let text = compose("mrolab").to_shell();

        assert!(text.starts_with("export FABRIC_CFG_PATH=\"${PWD}/config\"\n"));
        assert!(text.contains("export CORE_PEER_LOCALMSPID=MROLabMSP\n"));
        assert!(text.contains("peer chaincode invoke \\\n    -o orderer1.thermotrace.com:7050"));
        assert!(text.contains(" \\\n    --peerAddresses peer0.manufacturer.thermotrace.com:9051"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn quote_literal_passes_safe_words_through() {
        assert_eq!(quote_literal("peer0.org:7051"), "peer0.org:7051");
        assert_eq!(quote_literal("--tls"), "--tls");
    }

    #[test]
    fn quote_literal_wraps_and_escapes_single_quotes() {
        assert_eq!(quote_literal(""), "''");
        assert_eq!(quote_literal("a b"), "'a b'");
        assert_eq!(quote_literal("O'Brien"), r"'O'\''Brien'");
        assert_eq!(quote_literal("$HOME"), "'$HOME'");
    }

    #[test]
    fn quote_expandable_escapes_only_double_quote_specials() {
        assert_eq!(quote_expandable("${PWD}/x"), "\"${PWD}/x\"");
        assert_eq!(quote_expandable(r#"a"b\c`d"#), r#""a\"b\\c\`d""#);
    }

    #[cfg(unix)]
    #[test]
    fn shell_parses_payload_back_to_original_bytes() {
        let mut record = sample_record();
        record.inspector = r#"O'Brien "Doc" `whoami` $HOME \n"#.into();
        let cmd = compose_invoke(&record, &NetworkConfig::default(), "manufacturer").unwrap();
        let payload = cmd.flag_value("-c").unwrap().to_string();

        let echo = InvokeCommand {
            env: vec![],
            program: "printf".into(),
            args: vec![ShellArg::literal("%s"), ShellArg::Literal(payload.clone())],
        };
        let output = std::process::Command::new("sh")
            .arg("-c")
            .arg(echo.to_shell())
            .output()
            .unwrap();

        assert!(output.status.success());
        assert_eq!(String::from_utf8(output.stdout).unwrap(), payload);
    }
}
