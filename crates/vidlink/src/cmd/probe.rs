use crate::cmd::{parse_timeout, ProbeArgs};
use crate::exit::{client_error, CliError, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_metadata, OutputFormat};
use crate::scratch::ScratchWorker;

pub async fn run(args: ProbeArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_timeout(&args.timeout)?;

    let session = ScratchWorker::start().await?;
    session.stage(ScratchWorker::INPUT, &args.file).await?;

    let reply = tokio::time::timeout(
        timeout,
        session
            .client()
            .read_metadata(ScratchWorker::STORE, ScratchWorker::INPUT),
    )
    .await;

    let metadata = match reply {
        Ok(result) => result.map_err(|err| client_error("probe failed", err))?,
        Err(_) => {
            return Err(CliError::new(
                TIMEOUT,
                format!("probe timed out after {timeout:?}"),
            ));
        }
    };
    session.finish().await;

    print_metadata(&args.file, &metadata, format);
    Ok(SUCCESS)
}
