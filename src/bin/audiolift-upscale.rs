//! Developer utility to upscale a single audio file.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use audiolift::audio::ChannelPolicy;
use audiolift::logging;
use audiolift::model::{Category, ModelRegistry, ModelStore};
use audiolift::pipeline::{CancelToken, EnhanceConfig, Orchestrator};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

struct Options {
    input: PathBuf,
    output: PathBuf,
    models_dir: Option<PathBuf>,
    config: EnhanceConfig,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let registry = match &options.models_dir {
        Some(dir) => ModelRegistry::load_or_default(&ModelStore::new(dir)),
        None => {
            let store = ModelStore::default_location().map_err(|err| err.to_string())?;
            ModelRegistry::load_or_default(&store)
        }
    }
    .map_err(|err| err.to_string())?;

    let orchestrator = Orchestrator::new(Arc::new(registry));
    let mut last_printed = 0u8;
    let outcome = orchestrator
        .upscale_file(
            &options.input,
            &options.output,
            &options.config,
            |percent| {
                if percent.saturating_sub(last_printed) >= 5 || percent == 100 {
                    last_printed = percent;
                    print!("\rUpscaling {percent}%");
                    let _ = std::io::stdout().flush();
                    if percent == 100 {
                        println!();
                    }
                }
            },
            &CancelToken::new(),
        )
        .map_err(|err| err.to_string())?;

    println!(
        "Done: {} (dominant {} v={:.2} m={:.2} a={:.2}, model {})",
        options.output.display(),
        outcome.classification.dominant.as_str(),
        outcome.classification.voice_confidence,
        outcome.classification.music_confidence,
        outcome.classification.ambient_confidence,
        outcome.category_used,
    );
    if !outcome.training_pairs.is_empty() {
        println!(
            "Collected {} training segment pairs",
            outcome.training_pairs.len()
        );
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Options, String> {
    let mut positional = Vec::new();
    let mut models_dir = None;
    let mut config = EnhanceConfig::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--pre" => config.use_preprocessing = true,
            "--post" => config.use_postprocessing = true,
            "--preserve-quality" => {
                config.use_postprocessing = true;
                config.preserve_quality = true;
            }
            "--train" => config.training_mode = true,
            "--per-channel" => config.channel_policy = ChannelPolicy::PerChannel,
            "--force" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--force requires a category".to_string())?;
                let category = Category::parse(&value)
                    .ok_or_else(|| format!("Unknown category: {value}"))?;
                config.forced_audio_type = Some(category);
            }
            "--models-dir" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--models-dir requires a path".to_string())?;
                models_dir = Some(PathBuf::from(value));
            }
            other if other.starts_with("--") => {
                return Err(format!("Unknown flag: {other}\n{USAGE}"));
            }
            other => positional.push(PathBuf::from(other)),
        }
    }
    if positional.len() != 2 {
        return Err(USAGE.to_string());
    }
    let mut positional = positional.into_iter();
    let input = positional.next().ok_or_else(|| USAGE.to_string())?;
    let output = positional.next().ok_or_else(|| USAGE.to_string())?;
    Ok(Options {
        input,
        output,
        models_dir,
        config,
    })
}

const USAGE: &str = "Usage: audiolift-upscale <input.wav|aiff> <output.wav> \
[--pre] [--post] [--preserve-quality] [--train] [--per-channel] \
[--force voice|music|ambient|general] [--models-dir <dir>]";
