//! `agrismart` command line: inspect the request lifecycle and simulate a
//! scan request end to end.

use agrismart_core::{
    can_transition, status_color, status_label, verify_graph, Coordinates, Location,
    NewScanRequest, PaymentStatus, Priority, RequestStatus,
};
use agrismart_pipeline::{
    CancellationToken, InMemoryRepository, LifecycleConfig, ScanRequestService,
};
use anyhow::Context;
use chrono::{Days, Utc};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Command::new("agrismart")
        .version(agrismart_pipeline::VERSION)
        .about("AgriSmart scan-request lifecycle")
        .subcommand_required(true)
        .subcommand(
            Command::new("graph")
                .about("Print every status with its label, color and successors")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("check").about("Verify the transition graph invariants"))
        .subcommand(
            Command::new("can-transition")
                .about("Check whether a single transition is allowed")
                .arg(
                    Arg::new("from")
                        .required(true)
                        .value_parser(value_parser!(RequestStatus)),
                )
                .arg(
                    Arg::new("to")
                        .required(true)
                        .value_parser(value_parser!(RequestStatus)),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Drive a sample request through the whole pipeline")
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("instant")
                        .long("instant")
                        .action(ArgAction::SetTrue)
                        .help("Skip all simulated delays"),
                )
                .arg(
                    Arg::new("reject")
                        .long("reject")
                        .action(ArgAction::SetTrue)
                        .help("Reject the request instead of approving it"),
                ),
        );

    match cli.get_matches().subcommand() {
        Some(("graph", args)) => print_graph(args.get_flag("json")),
        Some(("check", _)) => check(),
        Some(("can-transition", args)) => {
            let from = *args
                .get_one::<RequestStatus>("from")
                .context("missing FROM status")?;
            let to = *args
                .get_one::<RequestStatus>("to")
                .context("missing TO status")?;
            let allowed = can_transition(from, to);
            println!("{from} -> {to}: {}", if allowed { "allowed" } else { "not allowed" });
            if !allowed {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(("simulate", args)) => simulate(args).await,
        _ => Ok(()),
    }
}

fn print_graph(json: bool) -> anyhow::Result<()> {
    if json {
        let rows: Vec<_> = RequestStatus::ALL
            .into_iter()
            .map(|status| {
                serde_json::json!({
                    "status": status,
                    "label": status_label(status),
                    "color": status_color(status),
                    "terminal": status.is_terminal(),
                    "successors": status.successors(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{:<20} {:<18} {:<8} SUCCESSORS", "STATUS", "LABEL", "COLOR");
    for status in RequestStatus::ALL {
        let successors: Vec<&str> = status.successors().iter().map(|s| s.as_str()).collect();
        println!(
            "{:<20} {:<18} {:<8} {}",
            status.as_str(),
            status_label(status),
            status_color(status).as_str(),
            if successors.is_empty() {
                "(terminal)".to_string()
            } else {
                successors.join(", ")
            }
        );
    }
    Ok(())
}

fn check() -> anyhow::Result<()> {
    match verify_graph() {
        Ok(report) => {
            println!("Transition graph: PASS");
            println!("  Statuses: {}", report.statuses);
            println!("  Transitions: {}", report.transitions);
            let terminals: Vec<&str> = report.terminals.iter().map(|s| s.as_str()).collect();
            println!("  Terminals: {}", terminals.join(", "));
            Ok(())
        }
        Err(e) => {
            println!("Transition graph: FAIL ({e})");
            std::process::exit(1);
        }
    }
}

async fn simulate(args: &ArgMatches) -> anyhow::Result<()> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => LifecycleConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LifecycleConfig::default(),
    };
    if args.get_flag("instant") {
        let instant = LifecycleConfig::instant();
        config = config
            .with_delays(instant.delays)
            .with_progress(instant.progress);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let service = ScanRequestService::new(config, Arc::new(InMemoryRepository::new()));
    let request = service.submit(sample_order()).await?;
    let id = request.id.clone();
    println!("Submitted {id} ({})", request.status().label());

    if args.get_flag("reject") {
        let rejected = service.reject(&id).await?;
        println!("Status: {}", rejected.status().label());
    } else {
        service.approve(&id).await?;
        let date = Utc::now()
            .date_naive()
            .checked_add_days(Days::new(3))
            .context("date out of range")?;
        service.schedule(&id, date, "OP-002").await?;
        service.start_scan(&id).await?;

        let mut upload = |p: u8| println!("  upload   {p:>3}%");
        service.upload_images(&id, 48, &mut upload, &cancel).await?;

        let mut analysis = |p: u8| println!("  analysis {p:>3}%");
        service.run_analysis(&id, &mut analysis, &cancel).await?;

        service.request_validation(&id).await?;
        let completed = service.validate(&id, "AGR-001").await?;
        println!("Status: {}", completed.status().label());
    }

    let final_record = service.get(&id).await?;
    println!("{}", serde_json::to_string_pretty(&final_record)?);

    println!();
    println!("Activity:");
    for entry in service.activity().entries() {
        println!(
            "  [{}] {:<10} {}",
            &entry.hash_hex()[..8],
            format!("{:?}", entry.kind).to_lowercase(),
            entry.message
        );
    }
    match service.activity().verify_integrity() {
        Ok(()) => println!("Activity log integrity: VALID"),
        Err(e) => println!("Activity log integrity: INVALID ({e})"),
    }

    Ok(())
}

fn sample_order() -> NewScanRequest {
    NewScanRequest {
        farmer_id: "FRM-101".to_string(),
        farmer_name: "Emmanuel Fotso".to_string(),
        farmer_phone: "+237 6 70 11 22 33".to_string(),
        farm_name: "Fotso Tomato Gardens".to_string(),
        location: Location {
            region: "West".to_string(),
            coordinates: Coordinates { lat: 5.478, lng: 10.418 },
            address: "Dschang, Menoua".to_string(),
        },
        hectares: 6.5,
        crop_type: "Tomato".to_string(),
        payment_amount: 97_500,
        payment_status: PaymentStatus::Paid,
        priority: Priority::High,
        notes: None,
    }
}
