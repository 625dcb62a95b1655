use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

use crop_serve::{AdvisoryClient, DiseaseClassifier};

mod server;

use server::AppState;

#[derive(Parser, Debug)]
#[command(
    name = "crop-api",
    about = "Web API for crop disease detection and farming advice"
)]
struct CmdArgs {
    /// Path to the TFLite model weights
    #[arg(long, env = "CROP_WEIGHTS_PATH", default_value = "crop_classifier_v1.tflite")]
    weights: PathBuf,

    /// Path to the class labels JSON file
    #[arg(long, env = "CROP_LABELS_PATH", default_value = "class_labels.json")]
    labels: PathBuf,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 5001)]
    port: u16,

    /// API key for Gemini advisory text
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = CmdArgs::parse();

    let mut classifier = DiseaseClassifier::new();
    if let Err(e) = classifier.initialize(&args.weights, &args.labels) {
        // Keep serving; /api/detect reports the failure per request.
        error!("Error loading model: {}", e);
    }

    let advisor = match args.gemini_api_key {
        Some(key) => match AdvisoryClient::discover(key).await {
            Ok(client) => Some(client),
            Err(e) => {
                error!("Gemini unavailable: {}", e);
                None
            }
        },
        None => {
            warn!("GEMINI_API_KEY not set, advisory text disabled");
            None
        }
    };

    let state = Arc::new(AppState {
        classifier: Arc::new(classifier),
        advisor,
    });

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, server::app(state)).await?;

    Ok(())
}
