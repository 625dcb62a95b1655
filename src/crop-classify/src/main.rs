use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use crop_serve::DiseaseClassifier;

#[derive(Parser, Debug)]
#[command(
    name = "crop-classify",
    about = "CLI app to classify crop disease images"
)]
struct CmdArgs {
    #[arg(help = "Path to the TFLite model weights")]
    weights_path: PathBuf,

    #[arg(help = "Path to the class labels JSON file")]
    labels_path: PathBuf,

    #[arg(help = "Image file to classify")]
    image_path: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = CmdArgs::parse();

    let mut classifier = DiseaseClassifier::new();
    classifier.initialize(&args.weights_path, &args.labels_path)?;

    let data = fs::read(&args.image_path)?;
    let prediction = classifier.classify(&data)?;

    info!("Classified {}", args.image_path.display());
    println!("{}", serde_json::to_string(&prediction)?);

    Ok(())
}
