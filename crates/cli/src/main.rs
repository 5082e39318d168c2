use clap::{Parser, Subcommand};
use fhir::{Bundle, BundleEntry, DateParam, IdType, Patient};
use fhirstarter_core::{CoreConfig, LogicalId, PatientError, PatientService, SearchParameters};

#[derive(Parser)]
#[command(name = "fhirstarter")]
#[command(about = "FHIR starter patient store CLI")]
struct Cli {
    /// Logical id given to the first seeded patient
    #[arg(long, default_value_t = 51)]
    first_id: u64,
    /// Number of demo patients to seed before running the command
    #[arg(long, default_value_t = 10)]
    seed_count: usize,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients
    List,
    /// Print a patient as FHIR JSON
    Read {
        /// Patient id, optionally versioned (`51` or `51/_history/0`)
        id: String,
    },
    /// Print every version of a patient, oldest first
    History {
        /// Patient id
        id: String,
    },
    /// Search patients and print a search-set Bundle
    Search {
        /// Exact family name (case-insensitive)
        #[arg(long)]
        family: Option<String>,
        /// Exact given name (case-insensitive)
        #[arg(long)]
        given: Option<String>,
        /// Birth date with optional prefix, e.g. ge2005-01-01
        #[arg(long)]
        birthdate: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let cfg = CoreConfig::new(LogicalId::new(cli.first_id), true, cli.seed_count)?;
    let service = PatientService::from_config(&cfg)?;

    match cli.command {
        Some(Commands::List) => {
            let patients = service.search(&SearchParameters::new());
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in &patients {
                    println!("{}", summary_line(patient));
                }
            }
        }
        Some(Commands::Read { id }) => {
            match IdType::parse(&id)
                .map_err(PatientError::from)
                .and_then(|id| service.read(&id))
            {
                Ok(patient) => println!("{}", patient.render()?),
                Err(e) => eprintln!("Error reading patient {}: {}", id, e),
            }
        }
        Some(Commands::History { id }) => {
            let versions = id
                .parse::<u64>()
                .map_err(|_| format!("Invalid ID {id} - Must be numeric"))
                .and_then(|n| {
                    service
                        .store()
                        .history(LogicalId::new(n))
                        .map_err(|e| e.to_string())
                });
            match versions {
                Ok(versions) => {
                    for version in versions {
                        println!(
                            "Version: {}, Updated: {}, {}",
                            version.version_label(),
                            version.last_updated().to_rfc3339(),
                            summary_line(version.record())
                        );
                    }
                }
                Err(e) => eprintln!("Error reading history of patient {}: {}", id, e),
            }
        }
        Some(Commands::Search {
            family,
            given,
            birthdate,
        }) => {
            let mut params = SearchParameters::new();
            if let Some(family) = family {
                params = params.family(family);
            }
            if let Some(given) = given {
                params = params.given(given);
            }
            if let Some(birthdate) = birthdate {
                params = params.birth_date_param(&DateParam::parse(&birthdate)?)?;
            }

            let entry = service
                .search(&params)
                .into_iter()
                .map(|patient| BundleEntry {
                    full_url: patient.id.as_ref().map(|id| format!("Patient/{}", id)),
                    resource: patient,
                })
                .collect();
            println!("{}", Bundle::searchset(entry).render()?);
        }
        None => {
            println!("Use 'fhirstarter --help' for commands");
        }
    }

    Ok(())
}

fn summary_line(patient: &Patient) -> String {
    let (given, family) = patient
        .name_first_rep()
        .map(|name| {
            (
                name.given.first().cloned().unwrap_or_default(),
                name.family.clone().unwrap_or_default(),
            )
        })
        .unwrap_or_default();
    let born = patient
        .birth_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "unknown".into());

    format!(
        "ID: {}, Name: {} {}, Born: {}",
        patient.id.as_deref().unwrap_or("-"),
        given,
        family,
        born
    )
}
