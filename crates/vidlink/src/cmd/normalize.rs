use crate::cmd::TransformArgs;
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_transform, OutputFormat};
use crate::scratch::ScratchWorker;

pub async fn run(args: TransformArgs, format: OutputFormat) -> CliResult<i32> {
    let session = ScratchWorker::start().await?;
    session.stage(ScratchWorker::INPUT, &args.src).await?;

    session
        .client()
        .transcode_rotation(ScratchWorker::STORE, ScratchWorker::INPUT, ScratchWorker::OUTPUT)
        .await
        .map_err(|err| client_error("normalize failed", err))?;

    let bytes = session.export(ScratchWorker::OUTPUT, &args.dst).await?;
    session.finish().await;

    print_transform("transcodeRotation", &args.src, &args.dst, bytes, format);
    Ok(SUCCESS)
}
