//! Registry wiring for the four remote operations.
//!
//! Each operation unpacks its positional string arguments, runs the engine
//! method, and maps any failure to the error value that crosses the wire.
//! Argument problems never reach the engine; they are answered with an
//! `invalid arguments` error value directly.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;
use vidlink_rpc::OperationRegistry;

use crate::engine::MediaEngine;
use crate::error::MediaError;

/// Install the media operations into a registry.
pub fn register_operations(registry: &mut OperationRegistry, engine: Arc<MediaEngine>) {
    let dump = Arc::clone(&engine);
    registry.register_fn("dumpMetaData", move |args| {
        let engine = Arc::clone(&dump);
        async move {
            let (store, name) = two_strings("dumpMetaData", &args)?;
            engine
                .dump_metadata(&store, &name)
                .await
                .map_err(|err| op_failed("dumpMetaData", err))?;
            Ok(Value::Null)
        }
    });

    let read = Arc::clone(&engine);
    registry.register_fn("readMetaData", move |args| {
        let engine = Arc::clone(&read);
        async move {
            let (store, name) = two_strings("readMetaData", &args)?;
            let meta = engine
                .read_metadata(&store, &name)
                .await
                .map_err(|err| op_failed("readMetaData", err))?;
            serde_json::to_value(&meta).map_err(|err| {
                warn!(error = %err, "metadata serialization failed");
                Value::String(MediaError::Metadata.to_string())
            })
        }
    });

    let transcode = Arc::clone(&engine);
    registry.register_fn("transcodeRotation", move |args| {
        let engine = Arc::clone(&transcode);
        async move {
            let (store, src, dst) = three_strings("transcodeRotation", &args)?;
            engine
                .transcode_rotation(&store, &src, &dst)
                .await
                .map_err(|err| op_failed("transcodeRotation", err))?;
            Ok(Value::Null)
        }
    });

    registry.register_fn("transmuxStripMeta", move |args| {
        let engine = Arc::clone(&engine);
        async move {
            let (store, src, dst) = three_strings("transmuxStripMeta", &args)?;
            engine
                .transmux_strip_meta(&store, &src, &dst)
                .await
                .map_err(|err| op_failed("transmuxStripMeta", err))?;
            Ok(Value::Null)
        }
    });
}

fn op_failed(method: &str, err: MediaError) -> Value {
    warn!(%method, error = ?err, "operation failed");
    Value::String(err.to_string())
}

fn invalid_args(method: &str, expected: usize) -> Value {
    Value::String(format!(
        "invalid arguments: {method} expects {expected} string arguments"
    ))
}

fn arg_string(
    method: &str,
    args: &[Value],
    index: usize,
    expected: usize,
) -> Result<String, Value> {
    args.get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid_args(method, expected))
}

fn two_strings(method: &str, args: &[Value]) -> Result<(String, String), Value> {
    if args.len() != 2 {
        return Err(invalid_args(method, 2));
    }
    Ok((
        arg_string(method, args, 0, 2)?,
        arg_string(method, args, 1, 2)?,
    ))
}

fn three_strings(method: &str, args: &[Value]) -> Result<(String, String, String), Value> {
    if args.len() != 3 {
        return Err(invalid_args(method, 3));
    }
    Ok((
        arg_string(method, args, 0, 3)?,
        arg_string(method, args, 1, 3)?,
        arg_string(method, args, 2, 3)?,
    ))
}
