use clap::{Parser, Subcommand, ValueEnum};
use pan_tilt::constants::{DEFAULT_PAN_SERVO_ID, DEFAULT_TILT_SERVO_ID, MAX_RATE_OF_CHANGE};
use pan_tilt::{logging, spawn_line_reader, Actuator, ClientError, PanTiltClient, Scheduler, SimActuator};
use std::error::Error;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pan_tilt", version, about = "Two-axis pan-tilt servo controller")]
struct Cli {
    /// Where servo angles are written
    #[arg(long, value_enum, default_value_t = Backend::Sim)]
    backend: Backend,

    /// Bus-servo id of the pan axis (xarm backend)
    #[arg(long, default_value_t = DEFAULT_PAN_SERVO_ID)]
    pan_servo: u8,

    /// Bus-servo id of the tilt axis (xarm backend)
    #[arg(long, default_value_t = DEFAULT_TILT_SERVO_ID)]
    tilt_servo: u8,

    /// Pause between loop iterations in milliseconds; 0 spins
    #[arg(long, default_value_t = 1)]
    idle_ms: u64,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Read commands from stdin (default)
    Run,
    /// Calibrate, sweep tilt, pan briefly, then center
    Scan,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Sim,
    Xarm,
}

fn travel_time(degrees: f32) -> Duration {
    Duration::from_secs_f32(degrees / MAX_RATE_OF_CHANGE + 0.25)
}

async fn scan<W: AsyncWrite + Unpin>(client: &mut PanTiltClient<W>) -> Result<(), ClientError> {
    client.calibrate().await?;
    sleep(travel_time(360.0)).await;

    for tilt in (90..=180).step_by(30) {
        client.move_tilt(tilt).await?;
        sleep(travel_time(30.0)).await;
    }

    client.set_pan_velocity(-45.0).await?;
    sleep(Duration::from_secs(1)).await;
    client.stop_pan().await?;

    client.center().await?;
    sleep(travel_time(90.0)).await;
    Ok(())
}

async fn serve<A: Actuator + 'static>(actuator: A, mode: Mode, idle: Duration) -> Result<(), Box<dyn Error>> {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (feedback_tx, mut feedback_rx) = mpsc::unbounded_channel::<String>();
    let printer = tokio::spawn(async move {
        while let Some(line) = feedback_rx.recv().await {
            println!("{}", line);
        }
    });

    let scheduler = Scheduler::new(actuator, command_rx, feedback_tx);

    match mode {
        Mode::Run => {
            spawn_line_reader(tokio::io::stdin(), command_tx);
            tokio::select! {
                _ = scheduler.run(idle) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("shutting down, servos hold their last angle");
                }
            }
        }
        Mode::Scan => {
            let (writer, reader) = tokio::io::duplex(256);
            spawn_line_reader(reader, command_tx);
            let control = tokio::spawn(scheduler.run(idle));

            let mut client = PanTiltClient::new(writer);
            println!("Running scan movements...");
            scan(&mut client).await?;
            control.abort();
            let _ = control.await;
            let _ = printer.await;
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init_tracing();
    let cli = Cli::parse();
    let mode = cli.mode.unwrap_or(Mode::Run);
    let idle = Duration::from_millis(cli.idle_ms);
    info!(backend = ?cli.backend, ?mode, "starting");

    match cli.backend {
        Backend::Sim => serve(SimActuator::echoing(), mode, idle).await,
        Backend::Xarm => {
            #[cfg(feature = "xarm")]
            {
                let actuator = pan_tilt::xarm::XArmActuator::connect(cli.pan_servo, cli.tilt_servo).await?;
                serve(actuator, mode, idle).await
            }
            #[cfg(not(feature = "xarm"))]
            {
                Err(format!(
                    "servo ids {}/{} need a build with the `xarm` feature",
                    cli.pan_servo, cli.tilt_servo
                )
                .into())
            }
        }
    }
}
