//! ledger-runner: headless runner for the value-based payment ledger.
//!
//! Usage:
//!   ledger-runner --config program.json --tracks eckm,ckm --json
//!   ledger-runner --data-dir ./data
//!   ledger-runner --ipc-mode

use anyhow::Result;
use serde::Serialize;
use std::env;
use std::io::{self, BufRead, Write};
use vbp_core::{
    command::ConfigEdit,
    config::ProgramConfig,
    engine::{LedgerEngine, LedgerReport},
    types::Track,
};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Run,
    GetConfig,
    Edit { edit: ConfigEdit },
    SetTracks { tracks: Vec<Track> },
    Quit,
}

#[derive(Serialize)]
struct Envelope<'a> {
    generated_at: String,
    report: &'a LedgerReport,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let json = args.iter().any(|a| a == "--json");
    let config_path = flag_value(&args, "--config");
    let data_dir = flag_value(&args, "--data-dir");
    let tracks = match flag_value(&args, "--tracks") {
        Some(list) => parse_tracks(list)?,
        None => Vec::new(),
    };

    let config = match (config_path, data_dir) {
        (Some(path), _) => ProgramConfig::load(path)?,
        (None, Some(dir)) => ProgramConfig::load_dir(dir)?,
        (None, None) => {
            log::info!("No --config given, using default program assumptions");
            ProgramConfig::default()
        }
    };

    if ipc_mode {
        return run_ipc_loop(config, tracks);
    }

    let report = LedgerEngine::new(config).run(&tracks)?;
    if json {
        let envelope = Envelope {
            generated_at: chrono::Utc::now().to_rfc3339(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn run_ipc_loop(mut config: ProgramConfig, mut tracks: Vec<Track>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                reply_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetConfig => {
                writeln!(stdout, "{}", serde_json::to_string(&config)?)?;
            }
            IpcCommand::SetTracks { tracks: next } => {
                tracks = next;
                writeln!(stdout, "{}", serde_json::json!({ "tracks": tracks }))?;
            }
            IpcCommand::Edit { edit } => match config.apply(&edit) {
                Ok(next) => {
                    config = next;
                    writeln!(stdout, "{}", serde_json::to_string(&config)?)?;
                }
                Err(e) => reply_error(&mut stdout, &e.to_string())?,
            },
            IpcCommand::Run => match LedgerEngine::new(config.clone()).run(&tracks) {
                Ok(report) => writeln!(stdout, "{}", serde_json::to_string(&report)?)?,
                Err(e) => reply_error(&mut stdout, &e.to_string())?,
            },
        }
        stdout.flush()?;
    }
    Ok(())
}

fn reply_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    writeln!(stdout, "{}", serde_json::json!({ "error": message }))?;
    stdout.flush()?;
    Ok(())
}

fn print_summary(report: &LedgerReport) {
    let labels: Vec<&str> = report.tracks.iter().map(|t| t.label()).collect();
    let s = &report.summary.three_year;

    println!("=== THREE-YEAR SUMMARY ===");
    println!("  tracks:          {}", labels.join(", "));
    println!("  gross revenue:   ${:.0}", s.gross_revenue);
    println!("  net revenue:     ${:.0}", s.net_revenue);
    println!("  vendor revenue:  ${:.0}", s.vendor_revenue);
    println!("  peak enrolled:   {:.0}", s.peak_enrolled);
    println!("  blended adj:     {:.2}%", s.blended_adjustment * 100.0);

    println!();
    println!("=== BY YEAR ===");
    for (i, y) in report.summary.years.iter().enumerate() {
        println!(
            "  Y{} | Gross: ${:.0} | Net: ${:.0} | Vendor: ${:.0} | Peak: {:.0} | Adj: {:.2}%",
            i + 1,
            y.gross_revenue,
            y.net_revenue,
            y.vendor_revenue,
            y.peak_enrolled,
            y.blended_adjustment * 100.0
        );
    }

    println!();
    println!("=== ADJUSTMENTS ===");
    for (track, a) in &report.adjustments {
        println!(
            "  {:<5} early {:.2}% | late {:.2}% | driver {:?}",
            track.label(),
            a.applied_early * 100.0,
            a.applied_late * 100.0,
            a.driver
        );
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_tracks(list: &str) -> Result<Vec<Track>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|code| Track::parse(code).ok_or_else(|| anyhow::anyhow!("Unknown track '{code}'")))
        .collect()
}
