#[macro_use]
extern crate log;

use avro_value::{Shape, Value};
use clap::Parser;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[clap(about, version, author)]
struct Args {
  /// Address of the server to connect to, e.g. `127.0.0.1:9090`.
  address: String,
  /// RPC method name to call.
  method: String,
  /// A single string argument, sent as the call's payload.
  payload: String,
  /// Protocol description bytes used for the handshake. Both sides must
  /// agree on these to get a `BOTH` match; a mismatch still completes the
  /// call, logged at debug level.
  #[clap(long, default_value = "avro_rpc_cli/1")]
  protocol: String,
}

fn main() -> ExitCode {
  env_logger::init();
  let args = Args::parse();

  match run(args) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      error!("{e}");
      ExitCode::FAILURE
    }
  }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
  info!("connecting to {}", args.address);
  let mut client = avro_rpc::dial(&args.address, args.protocol.into_bytes())?;

  client.write_request(1, &args.method, &Value::String(args.payload))?;
  let xid = client.read_response_header()?;
  debug!("response header for xid {xid}");

  let result = client.read_response_body([Shape::String, Shape::String])?;
  match result.selected() {
    Some(Value::String(s)) if result.idx == 0 => println!("{s}"),
    Some(Value::String(s)) => {
      eprintln!("server error: {s}");
      client.close()?;
      return Err("call returned an error".into());
    }
    _ => return Err("unexpected response shape".into()),
  }

  client.close()?;
  Ok(())
}
