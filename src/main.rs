use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde_json::json;

use docscope::{
    category_choice, dashboard, load_file, DisplayConfig, FilterSpec, PriceRange,
    TelemedicineFilter,
};

const USAGE: &str = "\
usage: docscope <dataset.csv|.json|.parquet> [options]

  --specialization <S>   exact specialization, or any (default: any)
  --city <C>             exact city, or any (default: any)
  --telemedicine <T>     yes | no | any (default: any)
  --min-price <N>        lower price bound (default: dataset minimum)
  --max-price <N>        upper price bound (default: dataset maximum)
  --search <TEXT>        case-insensitive search in name, city, specialization
  --config <FILE>        display settings (TOML)
  --options              print the available filter values and exit
  -h, --help             print this message and exit";

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    dataset: PathBuf,
    config: Option<PathBuf>,
    specialization: Option<String>,
    city: Option<String>,
    telemedicine: TelemedicineFilter,
    min_price: Option<f64>,
    max_price: Option<f64>,
    search: Option<String>,
    list_options: bool,
    show_help: bool,
}

fn parse_args<I>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut cli = CliArgs::default();
    let mut dataset = None;

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .with_context(|| format!("{flag} expects a value"))
        };
        match arg.as_str() {
            "--specialization" => cli.specialization = Some(value(&arg)?),
            "--city" => cli.city = Some(value(&arg)?),
            "--telemedicine" => cli.telemedicine = value(&arg)?.parse()?,
            "--min-price" => cli.min_price = Some(parse_price(&arg, &value(&arg)?)?),
            "--max-price" => cli.max_price = Some(parse_price(&arg, &value(&arg)?)?),
            "--search" => cli.search = Some(value(&arg)?),
            "--config" => cli.config = Some(PathBuf::from(value(&arg)?)),
            "--options" => cli.list_options = true,
            "-h" | "--help" => {
                return Ok(CliArgs {
                    show_help: true,
                    ..CliArgs::default()
                });
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n\n{USAGE}"),
            path => {
                if dataset.replace(PathBuf::from(path)).is_some() {
                    bail!("only one dataset may be given\n\n{USAGE}");
                }
            }
        }
    }

    cli.dataset = dataset.with_context(|| format!("missing dataset path\n\n{USAGE}"))?;
    Ok(cli)
}

fn parse_price(flag: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse()
        .with_context(|| format!("{flag}: '{raw}' is not a number"))
}

/// Layer the command-line selections on top of the store defaults.
fn build_spec(cli: &CliArgs, defaults: FilterSpec) -> Result<FilterSpec> {
    let mut spec = defaults;
    spec.specialization = cli.specialization.as_deref().and_then(category_choice);
    spec.city = cli.city.as_deref().and_then(category_choice);
    spec.telemedicine = cli.telemedicine;
    if let Some(search) = &cli.search {
        spec.search_term = search.clone();
    }

    if cli.min_price.is_some() || cli.max_price.is_some() {
        let (lo, hi) = spec
            .price_range
            .map(|r| (r.min(), r.max()))
            .unwrap_or((f64::MIN, f64::MAX));
        let range = PriceRange::new(cli.min_price.unwrap_or(lo), cli.max_price.unwrap_or(hi))?;
        spec.price_range = Some(range);
    }
    Ok(spec)
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = parse_args(std::env::args().skip(1))?;
    if cli.show_help {
        println!("{USAGE}");
        return Ok(());
    }
    let display = match &cli.config {
        Some(path) => DisplayConfig::load(path)?,
        None => DisplayConfig::default(),
    };

    let store = load_file(&cli.dataset)
        .with_context(|| format!("loading {}", cli.dataset.display()))?;

    if cli.list_options {
        let options = json!({
            "specializations": store.specializations(),
            "cities": store.cities(),
            "price_bounds": store.price_bounds(),
        });
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    let spec = build_spec(&cli, FilterSpec::defaults_for(&store))?;
    let result = dashboard(&store, &spec, &display);
    println!("{}", result.to_json()?);
    Ok(())
}
