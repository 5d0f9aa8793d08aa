//! `qrtool`: encode, classify and scan QR payloads from the command line.

use clap::{Parser, Subcommand};
use qr_payload::config::RemoteConfig;
use qr_payload::error::RemoteServiceError;
use qr_payload::scan::{ScanPipeline, ScanState, tier::standard_local_tiers};
use qr_payload::{
    EscapePolicy, FieldSet, ImageFile, PayloadEncoder, PayloadType, ResultPresenter, classify,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qrtool", version, about = "QR payload encoder, classifier and scanner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode form fields into a QR payload
    Encode {
        /// Payload type (url, text, wifi, vcard, email, sms, phone, geo, event, bitcoin, upi)
        #[arg(long = "type")]
        payload_type: PayloadType,
        /// Field as key=value; repeatable
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
        /// Backslash-escape delimiters inside free-text values
        #[arg(long)]
        escape: bool,
    },
    /// Classify scanned text and print its fields
    Classify {
        /// Scanned text
        text: String,
        /// Print the classification as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode a QR image file on-device, falling back to the remote decoder
    Scan {
        #[arg(long)]
        image: PathBuf,
        /// Skip the consent prompt and allow the upload
        #[arg(long)]
        yes: bool,
        /// Never offer the remote decoder
        #[arg(long, conflicts_with = "yes")]
        offline: bool,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Encode {
            payload_type,
            fields,
            escape,
        } => encode_cmd(payload_type, fields, escape),
        Command::Classify { text, json } => classify_cmd(&text, json),
        Command::Scan {
            image,
            yes,
            offline,
        } => scan_cmd(&image, yes, offline),
    }
}

fn encode_cmd(payload_type: PayloadType, fields: Vec<(String, String)>, escape: bool) -> ExitCode {
    let policy = if escape {
        EscapePolicy::Escaped
    } else {
        EscapePolicy::Compatible
    };
    let fields: FieldSet = fields.into_iter().collect();
    for (key, _) in fields.iter() {
        if !payload_type.field_keys().contains(&key) {
            eprintln!("warning: {payload_type} has no field {key:?}; ignored");
        }
    }
    println!("{}", PayloadEncoder::with_escape_policy(policy).encode(payload_type, &fields));
    ExitCode::SUCCESS
}

fn classify_cmd(text: &str, json: bool) -> ExitCode {
    let result = classify(text);
    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(out) => println!("{out}"),
            Err(err) => {
                eprintln!("Failed to serialize result: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", ResultPresenter::new().present(&result));
    }
    ExitCode::SUCCESS
}

/// Local tiers first; the remote tier only when allowed
fn build_pipeline(config: &RemoteConfig, offline: bool) -> Result<ScanPipeline, RemoteServiceError> {
    if offline {
        Ok(ScanPipeline::new(standard_local_tiers()))
    } else {
        ScanPipeline::with_standard_tiers(config)
    }
}

fn scan_cmd(path: &Path, yes: bool, offline: bool) -> ExitCode {
    let image = match ImageFile::from_path(path) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("Failed to read image {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let mut pipeline = match build_pipeline(&RemoteConfig::from_env(), offline) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            eprintln!("Failed to set up remote decoder: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = pipeline.scan_file(image) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    if let Some(prompt) = pipeline.consent_prompt() {
        let allowed = yes || ask(&prompt);
        let step = if allowed {
            pipeline.grant_consent()
        } else {
            pipeline.decline_consent()
        };
        if let Err(err) = step {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    }

    match pipeline.state() {
        ScanState::Success(text) => {
            println!("Scanned: {text}");
            if let Some(result) = pipeline.decoded_result() {
                print!("{}", ResultPresenter::new().present(result));
            }
            ExitCode::SUCCESS
        }
        ScanState::Failed(failure) => {
            eprintln!("{}", failure.message);
            ExitCode::FAILURE
        }
        other => {
            eprintln!("Scan stopped while {}", other.name());
            ExitCode::FAILURE
        }
    }
}

fn ask(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qr_payload::scan::DecoderTier;

    #[test]
    fn test_scan_tries_local_tiers_first() {
        let config = RemoteConfig {
            service_name: "Test Decoder".to_string(),
            ..RemoteConfig::default()
        };
        let pipeline = build_pipeline(&config, false).unwrap();
        let tiers = pipeline.tiers();
        let labels: Vec<DecoderTier> = tiers.iter().map(|t| t.tier()).collect();
        assert_eq!(
            labels,
            vec![DecoderTier::Primary, DecoderTier::Secondary, DecoderTier::Remote]
        );
        assert!(!tiers[0].requires_consent());
        assert!(!tiers[1].requires_consent());
        assert_eq!(tiers[2].consent_service(), Some("Test Decoder"));
    }

    #[test]
    fn test_offline_scan_has_no_remote_tier() {
        let pipeline = build_pipeline(&RemoteConfig::default(), true).unwrap();
        assert!(pipeline.tiers().iter().all(|t| !t.requires_consent()));
        assert_eq!(pipeline.tiers().len(), 2);
    }

    #[test]
    fn test_scan_flags_parse() {
        let cli = Cli::try_parse_from(["qrtool", "scan", "--image", "a.png", "--offline"]).unwrap();
        assert!(matches!(cli.command, Command::Scan { offline: true, yes: false, .. }));
        assert!(Cli::try_parse_from(["qrtool", "scan", "--image", "a.png", "--offline", "--yes"]).is_err());
    }
}
