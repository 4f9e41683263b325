use osod_payload::decode_frame;

use crate::cmd::DecodeArgs;
use crate::exit::{payload_error, CliError, CliResult, DATA_INVALID, FAILURE, SUCCESS};
use crate::output::{print_payload, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = parse_hex(&args.hex)?;
    match decode_frame(&frame).map_err(|err| payload_error("decode failed", err))? {
        Some(payload) => {
            print_payload(&payload, format);
            Ok(SUCCESS)
        }
        None => Err(CliError::new(
            FAILURE,
            format!("unrecognized tag: {}", frame[0]),
        )),
    }
}

fn parse_hex(groups: &[String]) -> CliResult<Vec<u8>> {
    let joined: String = groups
        .iter()
        .flat_map(|group| group.split_whitespace())
        .map(|group| group.trim_start_matches("0x"))
        .collect();
    hex::decode(&joined).map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex: {err}")))
}
