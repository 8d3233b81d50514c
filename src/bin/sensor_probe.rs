//! Sensor wiring check
//!
//! Lists serial ports, or opens one and prints raw lines next to the parsed
//! reading and the door state they map to.

use clap::Parser;
use garage_monitor::domain::SensorMode;
use garage_monitor::infra::logging;
use garage_monitor::io::serial::{find_board_port, list_ports, parse_frame, SerialSensor};
use garage_monitor::services::DoorStateMachine;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "sensor-probe", about = "Door sensor wiring check")]
struct Args {
    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Serial device (auto-detected when omitted)
    #[arg(short, long)]
    port: Option<String>,

    #[arg(short, long, default_value_t = 9600)]
    baud: u32,

    /// Line value (0/1) a switch reports when triggered
    #[arg(long, default_value_t = 1)]
    triggered_state: u8,

    /// Number of lines to read (0 = until Ctrl+C)
    #[arg(short = 'n', long, default_value_t = 10)]
    count: u64,

    #[arg(long, default_value_t = 2000)]
    startup_delay_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_stdout();
    let args = Args::parse();

    if args.list_ports {
        let ports = list_ports()?;
        if ports.is_empty() {
            println!("no serial ports found");
        }
        for p in ports {
            println!(
                "{:<20} {:<10} {}{}",
                p.device,
                p.vid_pid.as_deref().unwrap_or("-"),
                p.description,
                if p.looks_like_board { "  <- sensor board" } else { "" }
            );
        }
        return Ok(());
    }

    let device = match args.port {
        Some(port) => port,
        None => find_board_port()?.ok_or_else(|| anyhow::anyhow!("no sensor board found, use --port"))?,
    };
    let triggered = args.triggered_state == 1;

    let mut sensor = SerialSensor::open_device(
        &device,
        args.baud,
        Duration::from_millis(args.startup_delay_ms),
        Duration::from_secs(2),
        triggered,
    )
    .await?;
    let machine = DoorStateMachine::new(SensorMode::Dual);

    println!("reading from {} at {} baud", sensor.device(), args.baud);
    let mut n = 0u64;
    loop {
        if args.count > 0 && n >= args.count {
            break;
        }
        n += 1;

        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = sensor.read_line() => line,
        };
        match line {
            Ok(line) => match parse_frame(&line, triggered) {
                Ok(reading) => {
                    let state = machine.map_reading(reading)?;
                    println!("{:<12} reading={} state={}", line, reading, state);
                }
                Err(e) => println!("{:<12} {}", line, e),
            },
            Err(e) => println!("read error: {}", e),
        }
    }

    Ok(())
}
