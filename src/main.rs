mod analyser;
mod error;
mod ui;

use analyser::detect::DetectorConfig;
use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::{fs, net::IpAddr, path::Path, process::ExitCode};
use ui::output;

/// tunniff scores packet captures for the tunnel-in-tunnel signature
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// pcap/pcapng file to analyze
    #[arg(value_parser)]
    file: String,

    /// Address of the observed client; its packets count as outbound
    #[arg(long, default_value = analyser::utils::DEFAULT_CLIENT_IP, value_parser)]
    client_ip: IpAddr,

    /// Also report Shannon entropy of the TCP/UDP payload bytes
    #[arg(short = 'e', long)]
    entropy: bool,

    /// Directory to write analysis.json into
    #[arg(short = 'o', long, value_parser)]
    output_dir: Option<String>,

    /// Display output as formatted JSON
    #[arg(short = 'j', long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(err) = SimpleLogger::new().with_level(LevelFilter::Warn).env().init() {
        eprintln!("Logger already initialised: {err}");
    }

    let args = Args::parse();

    if let Some(out_dir) = args.output_dir.as_deref() {
        log::info!("Output directory {out_dir}");
        if let Err(err) = fs::create_dir_all(out_dir) {
            log::error!("Could not create {out_dir}: {err}");
            return ExitCode::FAILURE;
        }
    }

    let packets = match analyser::utils::load_file(&args.file, args.client_ip) {
        Ok(packets) => packets,
        Err(err) => {
            log::error!("{err}");
            Vec::new()
        }
    };
    if packets.is_empty() {
        eprintln!("No packets found or error parsing file");
        return ExitCode::FAILURE;
    }

    let mut analysis = analyser::core::analyse(&packets, &DetectorConfig::default());

    if args.entropy {
        match analyser::utils::load_payload_bytes(&args.file) {
            Ok(payload) => analysis.payload_entropy = Some(analyser::entropy::shannon_entropy(&payload)),
            Err(err) => log::error!("Skipping payload entropy: {err}"),
        }
    }

    // ---- Output ----
    if args.json || args.output_dir.is_some() {
        let json = match output::data_as_json(&analysis) {
            Ok(json) => json,
            Err(err) => {
                log::error!("Could not serialise analysis: {err}");
                return ExitCode::FAILURE;
            }
        };
        if let Some(out_dir) = args.output_dir.as_deref() {
            if let Err(err) = output::data_to_file(json.clone(), &Path::new(out_dir).join("analysis.json")) {
                log::error!("Could not write analysis: {err}");
            }
        }
        if args.json {
            println!("{json}");
        }
    }
    if !args.json {
        output::print_results(&args.file, packets.first().map(|p| p.timestamp), &analysis);
    }

    ExitCode::SUCCESS
}
