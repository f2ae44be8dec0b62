mod logging;

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::oneshot;

use ev3_serial::devices::{self, SerialConfig};
use ev3_serial::{Ev3, InputPort, JobState, OutputPort};

use crate::logging::{init_logging, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "ev3", version, about = "Send direct commands to an EV3 brick")]
struct Cli {
    /// Serial port the brick is paired on.
    #[arg(long, env = "EV3_PORT", global = true)]
    port: Option<String>,

    /// Read timeout in milliseconds.
    #[arg(long, default_value_t = 5000, global = true)]
    timeout_ms: u64,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List serial ports, Bluetooth ones first.
    Ports,
    /// Play a tone.
    Tone {
        #[arg(long, default_value_t = 50)]
        volume: u8,
        #[arg(long, default_value_t = 440)]
        freq: i16,
        #[arg(long, default_value_t = 500)]
        duration: i16,
    },
    /// Set the power of a motor and start it.
    Motor {
        /// Motor port, A to D.
        output: OutputPort,
        #[arg(long, allow_hyphen_values = true)]
        speed: i8,
    },
    /// Read a sensor.
    Read {
        /// Sensor port, 1 to 4.
        #[arg(value_parser = clap::value_parser!(u8).range(1..=4))]
        input: u8,
        /// Sensor type code, 0 keeps whatever is connected.
        #[arg(long = "type", default_value_t = 0)]
        sensor_type: u8,
        #[arg(long, default_value_t = 0)]
        mode: u8,
        #[arg(long, default_value_t = 1)]
        count: u8,
        /// Read percentages instead of SI values.
        #[arg(long)]
        percent: bool,
    },
}

/// Opens the serial port named on the command line and starts a driver on it.
fn connect(port: Option<String>, timeout_ms: u64) -> anyhow::Result<Ev3> {
    let port = port.context("no serial port given, pass --port or set EV3_PORT")?;
    let config = SerialConfig::new(port).timeout(Duration::from_millis(timeout_ms));
    Ok(Ev3::new(devices::open_device(&config)?)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let ev3 = match cli.command {
        Command::Ports => {
            for port in devices::discover_ports()? {
                let kind = if port.bluetooth { "bluetooth" } else { "serial" };
                println!("{}\t{}", port.port_info.port_name, kind);
            }
            return Ok(());
        }
        Command::Tone {
            volume,
            freq,
            duration,
        } => {
            let ev3 = connect(cli.port, cli.timeout_ms)?;
            ev3.run(move |api| Ok(api.sound_tone(volume, freq, duration)?))?;
            ev3
        }
        Command::Motor { output, speed } => {
            let ev3 = connect(cli.port, cli.timeout_ms)?;
            ev3.run(move |api| Ok(api.set_output_speed(output, speed)?))?;
            ev3
        }
        Command::Read {
            input,
            sensor_type,
            mode,
            count,
            percent,
        } => {
            let input = InputPort::try_from(input - 1)?;
            let ev3 = connect(cli.port, cli.timeout_ms)?;
            let (tx, rx) = oneshot::channel::<Vec<String>>();
            ev3.run(move |api| {
                let values: Vec<String> = if percent {
                    api.get_percent_value(input, sensor_type, mode, count)
                        .wait()?
                        .iter()
                        .map(ToString::to_string)
                        .collect()
                } else {
                    api.get_si_value(input, sensor_type, mode, count)
                        .wait()?
                        .iter()
                        .map(ToString::to_string)
                        .collect()
                };
                let _ = tx.send(values);
                Ok(())
            })?;

            // The sender is dropped without a value when the job fails
            let values = rx.await.context("reading the sensor failed")?;
            println!("{}", values.join(" "));
            ev3
        }
    };

    // Queued commands are flushed once the job lets go of the channel
    while ev3.state() == JobState::Running {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    drop(ev3);

    Ok(())
}
