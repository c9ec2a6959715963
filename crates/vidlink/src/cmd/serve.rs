use std::sync::Arc;

use tracing::info;
use vidlink_channel::uds::UdsListener;
use vidlink_media::{worker, MediaEngine, MediaStore};
use vidlink_proto::{ClientMessage, WorkerMessage};

use crate::cmd::ServeArgs;
use crate::exit::{channel_error, media_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::OutputFormat;

pub async fn run(args: ServeArgs, _format: OutputFormat) -> CliResult<i32> {
    let store = MediaStore::open(&args.store_root)
        .await
        .map_err(|err| media_error("store setup failed", err))?;
    let engine = Arc::new(MediaEngine::new(store));

    let listener =
        UdsListener::bind(&args.socket).map_err(|err| channel_error("bind failed", err))?;
    info!(
        socket = %args.socket.display(),
        store_root = %args.store_root.display(),
        "worker listening"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                if let Err(err) = signal {
                    return Err(CliError::new(
                        INTERNAL,
                        format!("signal handler failed: {err}"),
                    ));
                }
                info!("received ctrl-c, shutting down");
                return Ok(SUCCESS);
            }
            accepted = listener.accept::<WorkerMessage, ClientMessage>() => {
                match accepted {
                    Ok(endpoint) => {
                        worker::spawn(engine.clone(), endpoint);
                    }
                    Err(err) => return Err(channel_error("accept failed", err)),
                }
            }
        }
    }
}
