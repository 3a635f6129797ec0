use anyhow::{bail, Context, Result};
use panverify::{Verifier, VerifierConfig};
use tracing_subscriber::EnvFilter;

fn parse_direction(arg: Option<String>, name: &str) -> Result<f64> {
    let raw = arg.with_context(|| format!("expected {}", name))?;
    let value: f64 = raw
        .parse()
        .with_context(|| format!("{} must be a number, got {:?}", name, raw))?;

    if !(0.0..360.0).contains(&value) {
        bail!("{} must be in [0, 360), got {}", name, value);
    }

    Ok(value)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args();
    let _ = args.next();
    let video = args
        .next()
        .context("usage: panverify <video> <direction> <second_direction> [config.json]")?;
    let direction = parse_direction(args.next(), "direction")?;
    let second_direction = parse_direction(args.next(), "second_direction")?;

    let config = match args.next() {
        Some(path) => VerifierConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path))?,
        None => VerifierConfig::default(),
    };

    let result = Verifier::new(config)
        .verify_file(&video, direction, second_direction)
        .with_context(|| format!("failed to decode {}", video))?;

    println!("{}", serde_json::to_string(&result)?);

    Ok(())
}
