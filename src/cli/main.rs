use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use reqwest::Client;
use std::sync::Arc;
use symptoscan::{
    accounts::{AccountService, SignupRequest},
    catalog,
    config::Config,
    forms,
    ml::{ClassifierStore, PredictionService},
    models::DiseaseKind,
    state::create_store,
};

#[derive(Parser)]
#[command(name = "symptoscan-cli")]
#[command(about = "SymptoScan CLI", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train classifiers from their CSVs and write the artifacts
    Train {
        /// Disease slug, or "all"
        #[arg(value_name = "DISEASE", default_value = "all")]
        disease: String,
    },

    /// Assess one set of features locally, without the server
    Predict {
        #[arg(value_name = "DISEASE")]
        disease: String,

        /// Form fields as a JSON object
        #[arg(short, long)]
        features: String,
    },

    /// Create the disease catalog records
    Seed,

    /// Create a user account
    CreateUser {
        #[arg(short, long)]
        username: String,

        #[arg(short = 'm', long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        staff: bool,
    },

    /// Grant or revoke the staff flag
    MakeStaff {
        #[arg(value_name = "USERNAME")]
        username: String,

        #[arg(long)]
        revoke: bool,
    },

    /// Check server health
    Health,

    /// List diseases from a running server
    Diseases,

    /// Fetch mock statistics from a running server
    Stats {
        #[arg(value_name = "DISEASE")]
        disease: String,

        #[arg(short, long)]
        region: Option<String>,
    },
}

fn parse_disease(raw: &str) -> anyhow::Result<DiseaseKind> {
    DiseaseKind::from_slug(raw).ok_or_else(|| {
        let known: Vec<String> = DiseaseKind::all().iter().map(|k| k.slug()).collect();
        anyhow!("unknown disease '{}', expected one of: {}", raw, known.join(", "))
    })
}

fn load_config() -> anyhow::Result<Config> {
    Config::load().context("failed to load configuration")
}

async fn get_json(client: &Client, url: String) -> anyhow::Result<()> {
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;

    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "symptoscan=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Train { disease } => {
            let config = load_config()?;
            let kinds = if disease.eq_ignore_ascii_case("all") {
                DiseaseKind::all()
            } else {
                vec![parse_disease(&disease)?]
            };

            let predictions = PredictionService::new(Arc::new(ClassifierStore::new(config.models)));
            let mut failed = 0;
            for kind in kinds {
                print!("  {} ... ", kind);
                match predictions.retrain(kind).await {
                    Ok(metadata) => println!(
                        "OK (accuracy {:.3}, {} training rows)",
                        metadata.validation_metrics.accuracy, metadata.n_training_samples
                    ),
                    Err(e) => {
                        failed += 1;
                        println!("FAILED ({})", e);
                    }
                }
            }

            if failed > 0 {
                return Err(anyhow!("{} classifier(s) failed to train", failed));
            }
        }

        Commands::Predict { disease, features } => {
            let config = load_config()?;
            let kind = parse_disease(&disease)?;
            let body: serde_json::Value =
                serde_json::from_str(&features).context("features must be a JSON object")?;
            let input = forms::parse_form(kind, body)?;

            let predictions = PredictionService::new(Arc::new(ClassifierStore::new(config.models)));
            let assessment = predictions.assess(kind, input).await?;

            println!("{}", serde_json::to_string_pretty(&assessment)?);
            println!(
                "{} ({:.2}% confidence)",
                assessment.risk_level.label(),
                assessment.confidence
            );
        }

        Commands::Seed => {
            let config = load_config()?;
            let store = create_store(&config.state).await?;
            let classifiers = ClassifierStore::new(config.models);

            for disease in catalog::seed_diseases(store.as_ref(), &classifiers).await? {
                println!(
                    "  {} ({})",
                    disease.name,
                    disease.model_path.as_deref().unwrap_or("no artifact yet")
                );
            }
        }

        Commands::CreateUser {
            username,
            email,
            password,
            staff,
        } => {
            let config = load_config()?;
            let store = create_store(&config.state).await?;
            let accounts = AccountService::new(store, config.accounts);

            let mut user = accounts
                .signup(SignupRequest {
                    username,
                    email,
                    password,
                })
                .await?;
            if staff {
                user = accounts.set_staff(&user.username, true).await?;
            }
            println!("Created user {} ({}), staff: {}", user.username, user.id, user.is_staff);
        }

        Commands::MakeStaff { username, revoke } => {
            let config = load_config()?;
            let store = create_store(&config.state).await?;
            let accounts = AccountService::new(store, config.accounts);

            let user = accounts.set_staff(&username, !revoke).await?;
            println!("{} staff: {}", user.username, user.is_staff);
        }

        Commands::Health => {
            get_json(&client, format!("{}/health", cli.endpoint)).await?;
        }

        Commands::Diseases => {
            get_json(&client, format!("{}/v1/diseases", cli.endpoint)).await?;
        }

        Commands::Stats { disease, region } => {
            let kind = parse_disease(&disease)?;
            let url = match region {
                Some(region) => format!("{}/v1/diseases/{}/stats/{}", cli.endpoint, kind, region),
                None => format!("{}/v1/diseases/{}/stats", cli.endpoint, kind),
            };
            get_json(&client, url).await?;
        }
    }

    Ok(())
}
