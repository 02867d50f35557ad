use api_shared::{CardsRes, CdsHooksReq};
use cds_core::config::core_config_from_lookup;
use cds_core::constants::MEDICATION_ORDER_SELECT_SERVICE_ID;
use cds_core::rules::{repair_sctid, sctid::is_valid_sctid};
use cds_core::{CdsServiceRegistry, CoreConfig, RuleSet};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use terminology::{CachingResolver, FhirTerminologyClient, TerminologyResolver};

#[derive(Parser)]
#[command(name = "cds")]
#[command(about = "CDS Hooks medication safety engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every rule table and print what was loaded
    CheckRules,
    /// Run a CDS Hooks request file through a service and print the cards
    Evaluate {
        /// JSON file holding the CDS Hooks request
        file: PathBuf,
        /// Service id
        #[arg(long, default_value = MEDICATION_ORDER_SELECT_SERVICE_ID)]
        service: String,
    },
    /// Repair a SNOMED CT identifier mangled into scientific notation by a spreadsheet
    RepairSctid {
        /// Value such as 1.234567E+9
        value: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::CheckRules) => {
            let cfg = core_config_from_lookup(|name| std::env::var(name).ok())?;
            let terminology = terminology_for(&cfg)?;
            match RuleSet::load(&cfg, terminology.as_ref()) {
                Ok(rules) => {
                    println!("Drug-condition rules: {}", rules.drug_condition.len());
                    println!("Drug-drug rules: {}", rules.drug_drug.len());
                    println!("Dose form mappings: {}", rules.dose_forms.len());
                    println!(
                        "Substances with defined daily doses: {}",
                        rules.defined_daily_doses.substance_count()
                    );
                }
                Err(e) => eprintln!("Error loading rules: {}", e),
            }
        }
        Some(Commands::Evaluate { file, service }) => {
            let cfg = core_config_from_lookup(|name| std::env::var(name).ok())?;
            let terminology = terminology_for(&cfg)?;
            let rules = RuleSet::load(&cfg, terminology.as_ref())?;
            let registry = CdsServiceRegistry::standard(&cfg, rules, terminology);

            let content = std::fs::read_to_string(&file)?;
            let req: CdsHooksReq = serde_json::from_str(&content)?;
            match registry.call(&service, &req.into()) {
                Ok(cards) => {
                    println!("{}", serde_json::to_string_pretty(&CardsRes::from(cards))?)
                }
                Err(e) => eprintln!("Error evaluating {}: {}", file.display(), e),
            }
        }
        Some(Commands::RepairSctid { value }) => match repair_sctid(&value) {
            Some(sctid) => println!("{}", sctid),
            None if is_valid_sctid(&value) => println!("{} is already a valid identifier", value),
            None => eprintln!("Unable to repair {}", value),
        },
        None => {
            println!("Use 'cds --help' for commands");
        }
    }

    Ok(())
}

fn terminology_for(
    cfg: &CoreConfig,
) -> Result<Arc<dyn TerminologyResolver>, Box<dyn std::error::Error>> {
    let client =
        FhirTerminologyClient::new(cfg.terminology_url(), cfg.terminology_timeout_secs())?;
    Ok(Arc::new(CachingResolver::new(client)))
}
