//! Keyboard PTZ control for a single camera. Reads one key per line from stdin.

use clap::{Command, Arg, ArgAction};
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use clustervms_ptz_relay::config::Settings;
use clustervms_ptz_relay::dispatcher::{PtzDispatcher, ReqwestTransport};
use clustervms_ptz_relay::lifecycle::{key_from_line, ControlCommand, ControlLoop};



const COMMAND_QUEUE: usize = 32;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let matches = Command::new("ptz-console")
		.version("0.0.4")
		.about("Drive a camera's pan, tilt and zoom from the keyboard.")
		.arg(
			Arg::new("config")
				.action(ArgAction::Append)	// Allow argument to be specified multiple times
				.short('c')
				.long("config")
				.help("TOML file with PTZ relay config")
		)
		.get_matches();

	let settings = match matches.get_many::<String>("config") {
		Some(filenames) => Settings::read_config(&filenames.collect::<Vec<_>>())?,
		None => Settings::read_default_config_files()?,
	};

	let console = &settings.console;
	let target = console.target()?;
	let speeds = console.speeds();
	let dispatcher = PtzDispatcher::new(ReqwestTransport::new(settings.ptz.request_timeout())?);
	let control = ControlLoop::new(dispatcher, target.clone(), console.move_dwell(), console.poll_interval());

	let (commands, receiver) = mpsc::channel(COMMAND_QUEUE);
	let control_task = tokio::spawn(control.run(receiver));

	info!("Controlling {} camera at {}", target.vendor_type, target.host_address);
	info!("w/s: tilt up/down, a/d: pan left/right, z/x: zoom in/out, space or 'stop': stop, q: quit");
	info!("Type a key and press Enter. Movement stops by itself {}ms after the last key.", console.move_dwell_ms);

	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	loop {
		let line = match lines.next_line().await {
			Ok(Some(line)) => line,
			Ok(None) => break,
			Err(err) => {
				error!("Failed to read from stdin; error was {}", err);
				break;
			}
		};
		let Some(key) = key_from_line(&line) else {
			continue;
		};
		match speeds.command_for_key(key) {
			Some(ControlCommand::Quit) => break,
			Some(command) => {
				if commands.send(command).await.is_err() {
					error!("Control loop exited unexpectedly");
					break;
				}
			},
			None => warn!("Unknown key '{}'", key),
		}
	}

	// Quit stops any movement still in progress before the loop exits
	let _ = commands.send(ControlCommand::Quit).await;
	control_task.await?;
	info!("Bye");

	anyhow::Ok(())
}
