//! Schoolboard CLI - reshape school academic records
//!
//! # Main Commands
//!
//! ```bash
//! schoolboard serve                                  # Start HTTP server (port 3000)
//! schoolboard chart school.csv -s ELA --vocabulary ethnicity --school-type K8
//! schoolboard table school.csv -s Math -c Total --type-tab k8Tab --page-tab infoTab
//! schoolboard breakdown school.csv -s ELA --vocabulary grades --year 2024
//! schoolboard percentages school.json district.json --vocabulary ethnicity
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! schoolboard parse input.csv      # Parse records to typed JSON
//! ```
//!
//! Results go to stdout (or `--output`), progress goes to stderr.

use clap::{Args, Parser, Subcommand, ValueEnum};
use schoolboard::models::column::{categories, ETHNICITY, GRADES, GRADUATION_TOTALS, SUBGROUP, TOTAL};
use schoolboard::{
    analysis_chart, compare_percentages, info_chart, parse_file_auto, proficiency_breakdown, table,
    Record, SelectionContext, Settings, Subject,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "schoolboard")]
#[command(about = "Reshape school academic records into dashboard charts and tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV or JSON file and output typed records
    Parse {
        /// Input file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Chart data: multi-year series or school comparison
    Chart {
        #[command(flatten)]
        request: RequestArgs,

        /// Which chart to build
        #[arg(long, value_enum, default_value = "info")]
        view: ChartView,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Proficiency table (info or analysis, from --page-tab)
    Table {
        #[command(flatten)]
        request: RequestArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Proficiency band shares for one year
    Breakdown {
        #[command(flatten)]
        request: RequestArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Enrollment shares of a school against its comparison group
    Percentages {
        /// School enrollment counts (first record is used)
        school: PathBuf,

        /// Comparison group enrollment counts (first record is used)
        comparison: PathBuf,

        #[command(flatten)]
        categories: CategoryArgs,

        /// Minimum reported proportion
        #[arg(long, env = "SCHOOLBOARD_MIN_PROPORTION")]
        threshold: Option<f64>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "SCHOOLBOARD_PORT")]
        port: Option<u16>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ChartView {
    Info,
    Analysis,
}

#[derive(Clone, Copy, ValueEnum)]
enum Vocabulary {
    Grades,
    Ethnicity,
    Subgroup,
    Total,
    Graduation,
}

#[derive(Args)]
struct CategoryArgs {
    /// Target categories, comma separated
    #[arg(short, long, value_delimiter = ',', required_unless_present = "vocabulary")]
    categories: Vec<String>,

    /// Use a built-in category list
    #[arg(long, value_enum)]
    vocabulary: Option<Vocabulary>,
}

impl CategoryArgs {
    fn resolve(&self) -> Vec<String> {
        match self.vocabulary {
            Some(Vocabulary::Grades) => categories(&GRADES),
            Some(Vocabulary::Ethnicity) => categories(&ETHNICITY),
            Some(Vocabulary::Subgroup) => categories(&SUBGROUP),
            Some(Vocabulary::Total) => categories(&[TOTAL]),
            Some(Vocabulary::Graduation) => categories(&GRADUATION_TOTALS),
            None => self.categories.clone(),
        }
    }
}

#[derive(Args)]
struct RequestArgs {
    /// Input records (CSV or JSON array)
    input: PathBuf,

    /// Subject (ELA, Math, IREAD, EBRW, Graduation)
    #[arg(short, long)]
    subject: Subject,

    #[command(flatten)]
    categories: CategoryArgs,

    /// Selection context as a JSON file; flags below override its fields
    #[arg(long)]
    selection: Option<PathBuf>,

    #[arg(long)]
    school_id: Option<String>,

    /// K8, HS, K12 or AHS
    #[arg(long)]
    school_type: Option<String>,

    /// K8, HS or K12
    #[arg(long)]
    school_subtype: Option<String>,

    /// infoTab or analysisTab
    #[arg(long)]
    page_tab: Option<String>,

    /// k8Tab or hsTab
    #[arg(long)]
    type_tab: Option<String>,

    /// ilearnTab or ireadTab
    #[arg(long)]
    k8_tab: Option<String>,

    /// gradTab or satTab
    #[arg(long)]
    hs_tab: Option<String>,

    #[arg(long)]
    year: Option<i32>,
}

impl RequestArgs {
    /// Merge the selection file with the flags, then decode it the same way
    /// the HTTP API does.
    fn selection(&self) -> Result<SelectionContext, Box<dyn Error>> {
        let mut fields = match &self.selection {
            Some(path) => match serde_json::from_str(&fs::read_to_string(path)?)? {
                Value::Object(map) => map,
                _ => return Err(format!("{} is not a JSON object", path.display()).into()),
            },
            None => Map::new(),
        };

        let flags = [
            ("school_id", &self.school_id),
            ("school_type", &self.school_type),
            ("school_subtype", &self.school_subtype),
            ("page_tab", &self.page_tab),
            ("type_tab", &self.type_tab),
            ("k8_tab", &self.k8_tab),
            ("hs_tab", &self.hs_tab),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                fields.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        if let Some(year) = self.year {
            fields.insert("year".to_string(), Value::from(year));
        }

        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    fn records(&self) -> Result<Vec<Record>, Box<dyn Error>> {
        eprintln!("📄 Reading: {}", self.input.display());
        let parsed = parse_file_auto(&self.input)?;
        eprintln!("   Encoding: {}", parsed.encoding);
        if let Some(delimiter) = parsed.delimiter {
            eprintln!("   Delimiter: '{}'", format_delimiter(delimiter));
        }
        eprintln!("   Records: {}", parsed.records.len());
        Ok(parsed.records)
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    let settings = Settings::from_env();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),
        Commands::Chart {
            request,
            view,
            output,
        } => cmd_chart(&request, view, output.as_deref()),
        Commands::Table { request, output } => cmd_table(&request, output.as_deref()),
        Commands::Breakdown { request, output } => cmd_breakdown(&request, output.as_deref()),
        Commands::Percentages {
            school,
            comparison,
            categories,
            threshold,
            output,
        } => cmd_percentages(
            &school,
            &comparison,
            &categories.resolve(),
            threshold.unwrap_or(settings.min_proportion),
            output.as_deref(),
        ),
        Commands::Serve { port } => {
            cmd_serve(Settings {
                port: port.unwrap_or(settings.port),
                ..settings
            })
            .await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let parsed = parse_file_auto(input)?;

    eprintln!("   Encoding: {}", parsed.encoding);
    if let Some(delimiter) = parsed.delimiter {
        eprintln!("   Delimiter: '{}' (auto-detected)", format_delimiter(delimiter));
    }
    eprintln!("   Columns: {}", parsed.headers.len());
    let suppressed: usize = parsed
        .records
        .iter()
        .map(|r| r.iter().filter(|(_, v)| v.is_suppressed()).count())
        .sum();
    eprintln!("✅ Parsed {} records ({} suppressed cells)", parsed.records.len(), suppressed);

    write_json(&parsed.records, output)
}

fn cmd_chart(request: &RequestArgs, view: ChartView, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let records = request.records()?;
    let selection = request.selection()?;
    let categories = request.categories.resolve();

    match view {
        ChartView::Info => write_json(
            &info_chart(&records, &categories, request.subject, &selection)?,
            output,
        ),
        ChartView::Analysis => write_json(
            &analysis_chart(&records, &categories, request.subject, &selection)?,
            output,
        ),
    }
}

fn cmd_table(request: &RequestArgs, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let records = request.records()?;
    let selection = request.selection()?;
    let output_table = table(
        &records,
        &request.categories.resolve(),
        request.subject,
        &selection,
    )?;
    write_json(&output_table, output)
}

fn cmd_breakdown(request: &RequestArgs, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let records = request.records()?;
    let selection = request.selection()?;
    let breakdown = proficiency_breakdown(
        &records,
        &request.categories.resolve(),
        request.subject,
        &selection,
    )?;
    write_json(&breakdown, output)
}

fn cmd_percentages(
    school: &Path,
    comparison: &Path,
    categories: &[String],
    threshold: f64,
    output: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let school_counts = first_record(school)?;
    let comparison_counts = first_record(comparison)?;

    let shares = compare_percentages(&school_counts, &comparison_counts, categories, threshold);
    write_json(&shares, output)
}

async fn cmd_serve(settings: Settings) -> Result<(), Box<dyn Error>> {
    schoolboard::start_server(settings).await
}

fn first_record(path: &Path) -> Result<Record, Box<dyn Error>> {
    parse_file_auto(path)?
        .records
        .into_iter()
        .next()
        .ok_or_else(|| format!("{} has no records", path.display()).into())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let content = serde_json::to_string_pretty(value)?;
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
