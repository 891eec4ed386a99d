//! Developer utility to classify an audio file's content category.

use std::path::PathBuf;

use audiolift::classify::classify_path;
use audiolift::logging;
use audiolift::model::{ModelRegistry, ModelStore};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let (input, models_dir) = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let registry = match models_dir {
        Some(dir) => ModelRegistry::load_or_default(&ModelStore::new(dir)),
        None => {
            let store = ModelStore::default_location().map_err(|err| err.to_string())?;
            ModelRegistry::load_or_default(&store)
        }
    }
    .map_err(|err| err.to_string())?;
    let classifier = registry.classifier().map_err(|err| err.to_string())?;

    let result = classify_path(&input, &classifier);
    println!("{}", input.display());
    println!("  voice   {:.4}", result.voice_confidence);
    println!("  music   {:.4}", result.music_confidence);
    println!("  ambient {:.4}", result.ambient_confidence);
    println!("  dominant: {}", result.dominant.as_str());
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<(PathBuf, Option<PathBuf>), String> {
    let mut input = None;
    let mut models_dir = None;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--models-dir" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--models-dir requires a path".to_string())?;
                models_dir = Some(PathBuf::from(value));
            }
            other if other.starts_with("--") => {
                return Err(format!("Unknown flag: {other}"));
            }
            other => {
                if input.replace(PathBuf::from(other)).is_some() {
                    return Err("Expected exactly one input file".to_string());
                }
            }
        }
    }
    let input = input
        .ok_or_else(|| "Usage: audiolift-classify <input.wav|aiff> [--models-dir <dir>]".to_string())?;
    Ok((input, models_dir))
}
