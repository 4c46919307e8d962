#[macro_use] extern crate rocket;

use clap::{Command, Arg, ArgAction};
use clustervms_ptz_relay::config::Settings;
use clustervms_ptz_relay::rest_api;
use rocket::{Request, Response};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};



// The control page is served from elsewhere, so browsers need CORS headers to reach us.
pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
	fn info(&self) -> Info {
		Info {
			name: "Add CORS headers to responses",
			kind: Kind::Response
		}
	}

	async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
		response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
		response.set_header(Header::new("Access-Control-Allow-Methods", "POST, GET, OPTIONS"));
		response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
		response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
	}
}

/// Answers browser preflight requests; the CORS fairing adds the headers.
#[options("/<_..>")]
fn preflight() -> Status {
	Status::NoContent
}


#[rocket::main]
async fn main() -> anyhow::Result<()> {
	let matches = Command::new("clustervms-ptz-relay")
		.version("0.0.4")
		.about("ONVIF PTZ and video relay for ClusterVMS.")
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

	rocket::build()
		.mount("/", routes![preflight])
		.attach(rest_api::stage(settings))
		.attach(CORS)
		.launch()
		.await?;

	anyhow::Ok(())
}
