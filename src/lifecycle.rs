//! Dead-man's switch for continuous PTZ motion.
//!
//! A ContinuousMove keeps the camera turning until something tells it to
//! stop. The control loop sends that Stop itself when no fresh move has
//! arrived within the dwell time.

use std::time::Duration;

use log::info;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::common::{PtzIntent, PtzRequestContext, VendorType};
use crate::dispatcher::{PtzDispatcher, SoapTransport};



pub const DEFAULT_MOVE_DWELL: Duration = Duration::from_millis(400);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct MoveStopLifecycle {
	dwell: Duration,
	moving: bool,
	last_move: Option<Instant>,
}

impl MoveStopLifecycle {
	pub fn new(dwell: Duration) -> Self {
		Self {
			dwell,
			moving: false,
			last_move: None,
		}
	}

	pub fn record_move(&mut self, now: Instant) {
		self.moving = true;
		self.last_move = Some(now);
	}

	pub fn record_stop(&mut self) {
		self.moving = false;
	}

	pub fn is_moving(&self) -> bool {
		self.moving
	}

	/// Returns `true` exactly once when the outstanding move has outlived the dwell time.
	pub fn poll(&mut self, now: Instant) -> bool {
		let expired = match self.last_move {
			Some(last_move) => self.moving && now.saturating_duration_since(last_move) > self.dwell,
			None => false,
		};
		if expired {
			self.moving = false;
		}
		expired
	}
}

#[derive(Clone, Copy)]
#[derive(Debug, PartialEq)]
pub enum ControlCommand {
	Move {
		pan: f64,
		tilt: f64,
		zoom: f64,
	},
	Stop,
	Quit,
}

/// Speeds used when translating keys into moves.
#[derive(Clone, Copy)]
#[derive(Debug)]
pub struct ControlSpeeds {
	pub pan: f64,
	pub tilt: f64,
	pub zoom: f64,
	pub invert_tilt: bool,
}

impl ControlSpeeds {
	pub fn command_for_key(&self, key: &str) -> Option<ControlCommand> {
		let up = if self.invert_tilt { -self.tilt } else { self.tilt };
		let command = match key {
			"w" => ControlCommand::Move { pan: 0.0, tilt: up, zoom: 0.0 },
			"s" => ControlCommand::Move { pan: 0.0, tilt: -up, zoom: 0.0 },
			"a" => ControlCommand::Move { pan: -self.pan, tilt: 0.0, zoom: 0.0 },
			"d" => ControlCommand::Move { pan: self.pan, tilt: 0.0, zoom: 0.0 },
			"z" => ControlCommand::Move { pan: 0.0, tilt: 0.0, zoom: self.zoom },
			"x" => ControlCommand::Move { pan: 0.0, tilt: 0.0, zoom: -self.zoom },
			" " | "stop" => ControlCommand::Stop,
			"q" => ControlCommand::Quit,
			_ => return None,
		};
		Some(command)
	}
}

/// Pull the key out of one line of console input. A line of only spaces is the
/// space key; an empty line is nothing.
pub fn key_from_line(line: &str) -> Option<&str> {
	if line.is_empty() {
		None
	} else if line.trim().is_empty() {
		Some(" ")
	} else {
		Some(line.trim())
	}
}

/// The camera a control loop drives.
#[derive(Clone)]
pub struct CameraTarget {
	pub host_address: String,
	pub vendor_type: VendorType,
	pub username: String,
	pub password: String,
}

impl CameraTarget {
	fn request(&self, intent: PtzIntent) -> PtzRequestContext {
		PtzRequestContext {
			host_address: self.host_address.clone(),
			vendor_type: self.vendor_type.name().to_string(),
			username: self.username.clone(),
			password: self.password.clone(),
			intent,
		}
	}
}

pub struct ControlLoop<T: SoapTransport> {
	dispatcher: PtzDispatcher<T>,
	target: CameraTarget,
	lifecycle: MoveStopLifecycle,
	poll_interval: Duration,
}

impl<T: SoapTransport> ControlLoop<T> {
	pub fn new(dispatcher: PtzDispatcher<T>, target: CameraTarget, dwell: Duration, poll_interval: Duration) -> Self {
		Self {
			dispatcher,
			target,
			lifecycle: MoveStopLifecycle::new(dwell),
			poll_interval,
		}
	}

	/// Runs until `Quit` arrives or every sender is dropped. A move still in flight at that point is stopped first.
	pub async fn run(mut self, mut commands: mpsc::Receiver<ControlCommand>) {
		let mut ticker = time::interval(self.poll_interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				command = commands.recv() => match command {
					Some(ControlCommand::Move { pan, tilt, zoom }) => {
						self.lifecycle.record_move(Instant::now());
						self.send(PtzIntent::Move { pan, tilt, zoom }).await;
					},
					Some(ControlCommand::Stop) => {
						self.lifecycle.record_stop();
						self.send(PtzIntent::Stop).await;
					},
					Some(ControlCommand::Quit) | None => {
						if self.lifecycle.is_moving() {
							self.lifecycle.record_stop();
							self.send(PtzIntent::Stop).await;
						}
						break;
					},
				},
				_ = ticker.tick() => {
					if self.lifecycle.poll(Instant::now()) {
						info!("Auto-stopping PTZ movement");
						self.send(PtzIntent::Stop).await;
					}
				},
			}
		}
	}

	async fn send(&self, intent: PtzIntent) {
		let result = self.dispatcher.dispatch(&self.target.request(intent)).await;
		info!("{}", result.message);
	}
}



#[cfg(test)]
mod tests {
	use super::*;
	use crate::dispatcher::tests::MockTransport;

	fn stop_count(transport: &MockTransport) -> usize {
		transport.recorded.lock().unwrap().iter().filter(|call| call.body.contains("<tptz:Stop>")).count()
	}

	fn move_count(transport: &MockTransport) -> usize {
		transport.recorded.lock().unwrap().iter().filter(|call| call.body.contains("<tptz:ContinuousMove>")).count()
	}

	fn start_loop(transport: &MockTransport) -> (mpsc::Sender<ControlCommand>, tokio::task::JoinHandle<()>) {
		let target = CameraTarget {
			host_address: "192.168.0.167".to_string(),
			vendor_type: VendorType::Ycc365,
			username: "admin".to_string(),
			password: "123456".to_string(),
		};
		let control = ControlLoop::new(PtzDispatcher::new(transport.clone()), target, DEFAULT_MOVE_DWELL, DEFAULT_POLL_INTERVAL);
		let (tx, rx) = mpsc::channel(16);
		(tx, tokio::spawn(control.run(rx)))
	}

	const MOVE: ControlCommand = ControlCommand::Move { pan: 0.5, tilt: 0.0, zoom: 0.0 };

	#[test]
	fn poll_fires_once_after_dwell() {
		let start = Instant::now();
		let mut lifecycle = MoveStopLifecycle::new(Duration::from_millis(400));
		assert!(!lifecycle.poll(start));

		lifecycle.record_move(start);
		assert!(lifecycle.is_moving());
		assert!(!lifecycle.poll(start + Duration::from_millis(399)));
		assert!(!lifecycle.poll(start + Duration::from_millis(400)));
		assert!(lifecycle.poll(start + Duration::from_millis(401)));
		assert!(!lifecycle.is_moving());
		assert!(!lifecycle.poll(start + Duration::from_millis(900)));
	}

	#[test]
	fn new_move_or_stop_resets_deadline() {
		let start = Instant::now();
		let mut lifecycle = MoveStopLifecycle::new(Duration::from_millis(400));

		lifecycle.record_move(start);
		lifecycle.record_move(start + Duration::from_millis(300));
		assert!(!lifecycle.poll(start + Duration::from_millis(450)));
		assert!(lifecycle.poll(start + Duration::from_millis(701)));

		lifecycle.record_move(start + Duration::from_millis(800));
		lifecycle.record_stop();
		assert!(!lifecycle.poll(start + Duration::from_millis(2000)));
	}

	#[test]
	fn keys_map_to_commands() {
		let speeds = ControlSpeeds { pan: 0.5, tilt: 0.4, zoom: 0.3, invert_tilt: false };
		assert_eq!(speeds.command_for_key("w"), Some(ControlCommand::Move { pan: 0.0, tilt: 0.4, zoom: 0.0 }));
		assert_eq!(speeds.command_for_key("s"), Some(ControlCommand::Move { pan: 0.0, tilt: -0.4, zoom: 0.0 }));
		assert_eq!(speeds.command_for_key("a"), Some(ControlCommand::Move { pan: -0.5, tilt: 0.0, zoom: 0.0 }));
		assert_eq!(speeds.command_for_key("d"), Some(ControlCommand::Move { pan: 0.5, tilt: 0.0, zoom: 0.0 }));
		assert_eq!(speeds.command_for_key("z"), Some(ControlCommand::Move { pan: 0.0, tilt: 0.0, zoom: 0.3 }));
		assert_eq!(speeds.command_for_key("x"), Some(ControlCommand::Move { pan: 0.0, tilt: 0.0, zoom: -0.3 }));
		assert_eq!(speeds.command_for_key(" "), Some(ControlCommand::Stop));
		assert_eq!(speeds.command_for_key("q"), Some(ControlCommand::Quit));
		assert_eq!(speeds.command_for_key("k"), None);

		let inverted = ControlSpeeds { invert_tilt: true, ..speeds };
		assert_eq!(inverted.command_for_key("w"), Some(ControlCommand::Move { pan: 0.0, tilt: -0.4, zoom: 0.0 }));
	}

	#[test]
	fn console_lines_become_keys() {
		assert_eq!(key_from_line(""), None);
		assert_eq!(key_from_line(" "), Some(" "));
		assert_eq!(key_from_line("   "), Some(" "));
		assert_eq!(key_from_line("w"), Some("w"));
		assert_eq!(key_from_line("  stop \t"), Some("stop"));

		let speeds = ControlSpeeds { pan: 0.5, tilt: 0.5, zoom: 0.5, invert_tilt: false };
		assert_eq!(key_from_line("  ").and_then(|key| speeds.command_for_key(key)), Some(ControlCommand::Stop));
		assert_eq!(key_from_line(" q").and_then(|key| speeds.command_for_key(key)), Some(ControlCommand::Quit));
	}

	#[tokio::test(start_paused = true)]
	async fn unattended_move_is_stopped_once() {
		let transport = MockTransport::replying(200, "");
		let (tx, handle) = start_loop(&transport);

		tx.send(MOVE).await.unwrap();
		time::sleep(Duration::from_millis(399)).await;
		assert_eq!(move_count(&transport), 1);
		assert_eq!(stop_count(&transport), 0);

		time::sleep(Duration::from_millis(101)).await;
		assert_eq!(stop_count(&transport), 1);

		time::sleep(Duration::from_secs(2)).await;
		assert_eq!(stop_count(&transport), 1);

		tx.send(ControlCommand::Quit).await.unwrap();
		handle.await.unwrap();
		assert_eq!(stop_count(&transport), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn second_move_postpones_auto_stop() {
		let transport = MockTransport::replying(200, "");
		let (tx, handle) = start_loop(&transport);

		tx.send(MOVE).await.unwrap();
		time::sleep(Duration::from_millis(300)).await;
		tx.send(MOVE).await.unwrap();
		time::sleep(Duration::from_millis(300)).await;
		assert_eq!(move_count(&transport), 2);
		assert_eq!(stop_count(&transport), 0);

		time::sleep(Duration::from_millis(300)).await;
		assert_eq!(stop_count(&transport), 1);

		drop(tx);
		handle.await.unwrap();
		assert_eq!(stop_count(&transport), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn explicit_stop_cancels_auto_stop() {
		let transport = MockTransport::replying(200, "");
		let (tx, handle) = start_loop(&transport);

		tx.send(MOVE).await.unwrap();
		time::sleep(Duration::from_millis(200)).await;
		tx.send(ControlCommand::Stop).await.unwrap();
		time::sleep(Duration::from_secs(1)).await;
		assert_eq!(stop_count(&transport), 1);

		tx.send(ControlCommand::Quit).await.unwrap();
		handle.await.unwrap();
		assert_eq!(stop_count(&transport), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn quit_while_moving_stops_first() {
		let transport = MockTransport::replying(200, "");
		let (tx, handle) = start_loop(&transport);

		tx.send(MOVE).await.unwrap();
		tx.send(ControlCommand::Quit).await.unwrap();
		handle.await.unwrap();
		assert_eq!(move_count(&transport), 1);
		assert_eq!(stop_count(&transport), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn failed_dispatch_still_arms_auto_stop() {
		let transport = MockTransport::failing("timed out");
		let (tx, handle) = start_loop(&transport);

		tx.send(MOVE).await.unwrap();
		time::sleep(Duration::from_millis(500)).await;
		assert_eq!(stop_count(&transport), 1);

		tx.send(ControlCommand::Quit).await.unwrap();
		handle.await.unwrap();
	}
}
