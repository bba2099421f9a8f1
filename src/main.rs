//! simlink - capture replay tool
//!
//! Memutar ulang file capture lewat Session lengkap (pump, decoder, queue)
//! dan mencetak satu baris per message, lalu statistik pump.
//!
//! Usage:
//!   simlink <capture-file> [--queue N] [--best-effort] [--pin CORE] [--verbose]

use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use std::time::Duration;

use simlink::core::RecvTimeoutError;
use simlink::host::ReplayHost;
use simlink::protocol::{InputValue, LayoutSource, TypedMessage};
use simlink::{BridgeConfig, Session, UnknownStridePolicy};

const RECV_TICK: Duration = Duration::from_millis(20);

struct Args {
    capture: PathBuf,
    config: BridgeConfig,
    verbose: bool,
}

fn print_help() {
    println!("simlink - replay a frame capture through the dispatch pipeline\n");
    println!("Usage: simlink <CAPTURE> [OPTIONS]\n");
    println!("Options:");
    println!("  -q, --queue <N>     Message queue capacity (default: 256)");
    println!("      --best-effort   Decode unknown list strides with the widest fitting layout");
    println!("      --pin <CORE>    Pin the dispatch pump to a CPU core (Linux)");
    println!("  -v, --verbose       Debug logging (overridden by RUST_LOG)");
    println!("  -h, --help          Show this help");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = std::env::args().collect();
    let mut capture = None;
    let mut config = BridgeConfig::default();
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--queue" | "-q" => {
                let value = args.get(i + 1).ok_or("--queue needs a value")?;
                let capacity = value
                    .parse()
                    .map_err(|_| format!("invalid queue capacity: {value}"))?;
                config = config.with_queue_capacity(capacity);
                i += 1;
            }
            "--pin" => {
                let value = args.get(i + 1).ok_or("--pin needs a value")?;
                let core = value.parse().map_err(|_| format!("invalid core: {value}"))?;
                config = config.with_pin_to_core(core);
                i += 1;
            }
            "--best-effort" => {
                config = config.with_unknown_stride(UnknownStridePolicy::BestEffort);
            }
            "--verbose" | "-v" => {
                verbose = true;
            }
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            other if other.starts_with('-') => return Err(format!("unknown option: {other}")),
            other => capture = Some(PathBuf::from(other)),
        }
        i += 1;
    }

    let capture = capture.ok_or("missing capture file (see --help)")?;
    Ok(Args {
        capture,
        config,
        verbose,
    })
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "simlink=debug,info" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn describe(message: &TypedMessage) -> String {
    match message {
        TypedMessage::Open(open) => format!(
            "OPEN        app={:?} host={}.{}",
            open.application_name, open.host_version.major, open.host_version.minor
        ),
        TypedMessage::Quit => "QUIT".to_string(),
        TypedMessage::Exception(e) => format!(
            "EXCEPTION   code={} send_id={} index={}",
            e.exception, e.send_id, e.index
        ),
        TypedMessage::Event(e) => format!(
            "EVENT       group={} event={} data={}",
            e.group_id, e.event_id, e.data
        ),
        TypedMessage::FacilityList(list) => {
            let source = match list.layout_source {
                LayoutSource::Known => "",
                LayoutSource::BestEffort => " (best-effort)",
            };
            let first = list
                .entries
                .first()
                .map(|e| format!(" first={} {:.6},{:.6}", e.ident, e.latitude, e.longitude))
                .unwrap_or_default();
            format!(
                "{:<11} req={} packet={}/{} entries={} stride={}{}{}",
                format!("{:?}", list.kind).to_uppercase(),
                list.request_id,
                list.paging.packet_index.saturating_add(1),
                list.paging.total_packets,
                list.entries.len(),
                list.stride,
                source,
                first
            )
        }
        TypedMessage::InputEventList(list) => format!(
            "INPUTEVENTS req={} entries={} stride={}",
            list.request_id,
            list.entries.len(),
            list.stride
        ),
        TypedMessage::InputEventValue(v) => {
            let value = match &v.value {
                InputValue::Double(d) => d.to_string(),
                InputValue::String(s) => format!("{s:?}"),
                InputValue::Raw(raw) => format!("{} raw bytes", raw.len()),
            };
            format!("INPUTVALUE  req={} value={}", v.request_id, value)
        }
        TypedMessage::Unknown(header) => format!(
            "UNKNOWN     tag={} size={} version={}",
            header.tag, header.size, header.version
        ),
        TypedMessage::Undecodable(frame) => format!(
            "UNDECODABLE tag={} error={}",
            frame.header.tag, frame.error
        ),
        other => {
            let request = other
                .request_id()
                .map(|id| format!(" req={id}"))
                .unwrap_or_default();
            format!("{:<11}{}", format!("{:?}", other.kind()).to_uppercase(), request)
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let host = ReplayHost::open_file(&args.capture)?;
    let finished = host.finished_flag();

    tracing::info!(capture = %args.capture.display(), "replaying capture");
    let (session, stream) = Session::connect(host, args.config)?;

    let mut count = 0u64;
    loop {
        match stream.recv_timeout(RECV_TICK) {
            Ok(message) => {
                count += 1;
                println!("{count:>6}  {}", describe(&message));
            }
            // Flag diset setelah frame terakhir di-push; queue kosong = selesai
            Err(RecvTimeoutError::Timeout) => {
                if finished.load(Ordering::Acquire) && stream.is_empty() {
                    break;
                }
            }
            Err(RecvTimeoutError::Closed) => break,
        }
    }

    let stats = session.stats();
    session.disconnect()?;

    println!("\n📊 Pump statistics ({count} messages)");
    println!("{stats}");
    Ok(())
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("❌ {e}");
            process::exit(2);
        }
    };
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("❌ simlink error: {e}");
        process::exit(1);
    }
}
