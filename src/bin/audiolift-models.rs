//! Developer utility to inspect and initialize persisted models.

use std::path::PathBuf;

use audiolift::model::{Category, ClassifierMlp, EnhancerNet, ModelStore};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let (init, models_dir) = parse_args(std::env::args().skip(1).collect())?;
    let store = match models_dir {
        Some(dir) => ModelStore::new(dir),
        None => ModelStore::default_location().map_err(|err| err.to_string())?,
    };
    println!("Models directory: {}", store.dir().display());

    for category in Category::ALL {
        let persisted = store
            .load_enhancer(category)
            .map_err(|err| err.to_string())?
            .is_some();
        if persisted {
            println!("  enhancer_{category}: persisted");
        } else if init {
            store
                .save_enhancer(&EnhancerNet::fresh(category))
                .map_err(|err| err.to_string())?;
            println!("  enhancer_{category}: initialized fresh");
        } else {
            println!("  enhancer_{category}: missing (fresh default at runtime)");
        }
    }

    let classifier_persisted = store
        .load_classifier()
        .map_err(|err| err.to_string())?
        .is_some();
    if classifier_persisted {
        println!("  classifier: persisted");
    } else if init {
        store
            .save_classifier(&ClassifierMlp::fresh())
            .map_err(|err| err.to_string())?;
        println!("  classifier: initialized fresh");
    } else {
        println!("  classifier: missing (fresh default at runtime)");
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<(bool, Option<PathBuf>), String> {
    let mut init = false;
    let mut models_dir = None;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "init" => init = true,
            "--models-dir" => {
                let value = iter
                    .next()
                    .ok_or_else(|| "--models-dir requires a path".to_string())?;
                models_dir = Some(PathBuf::from(value));
            }
            other => {
                return Err(format!(
                    "Unknown argument: {other}\nUsage: audiolift-models [init] [--models-dir <dir>]"
                ));
            }
        }
    }
    Ok((init, models_dir))
}
