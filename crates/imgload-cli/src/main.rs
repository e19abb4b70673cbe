use anyhow::Result;
use imgload_cli::{build_cli, init_tracing, log_settings, run};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    init_tracing(log_settings(&matches))?;

    let ok = run(&matches, &mut std::io::stdout().lock()).await?;
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
