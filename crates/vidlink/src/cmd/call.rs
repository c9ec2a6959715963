use serde_json::Value;
use vidlink_channel::uds;
use vidlink_proto::{ClientMessage, WorkerMessage};
use vidlink_rpc::Client;

use crate::cmd::{parse_timeout, CallArgs};
use crate::exit::{channel_error, rpc_error, CliError, CliResult, SUCCESS, TIMEOUT, USAGE};
use crate::output::{print_value, OutputFormat};

pub async fn run(args: CallArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_timeout(&args.timeout)?;
    let call_args = parse_args(args.args.as_deref())?;

    let endpoint = uds::connect::<ClientMessage, WorkerMessage>(&args.socket)
        .await
        .map_err(|err| channel_error("connect failed", err))?;
    let client = Client::connect(endpoint)
        .await
        .map_err(|err| rpc_error("handshake failed", err))?;

    let reply = tokio::time::timeout(timeout, client.call(args.method.as_str(), call_args)).await;
    client.close().await;

    match reply {
        Ok(Ok(result)) => {
            print_value(&result, format);
            Ok(SUCCESS)
        }
        Ok(Err(err)) => Err(rpc_error("call failed", err)),
        Err(_) => Err(CliError::new(
            TIMEOUT,
            format!("call timed out after {timeout:?}"),
        )),
    }
}

fn parse_args(raw: Option<&str>) -> CliResult<Vec<Value>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| CliError::new(USAGE, format!("ARGS_JSON must be a JSON array: {err}")))?;
    match value {
        Value::Array(items) => Ok(items),
        other => Err(CliError::new(
            USAGE,
            format!("ARGS_JSON must be a JSON array, got: {other}"),
        )),
    }
}
