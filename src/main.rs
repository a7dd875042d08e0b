use anyhow::Context;

fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    form_processor_handler::run(None).context("form processor handler failed")?;

    Ok(())
}
