mod checker;
mod config;
mod error;
mod external;
mod fstree;
mod report;
mod scanner;
mod schemes;
mod types;
mod urls;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::checker::Checker;
use crate::config::Policy;
use crate::fstree::DiskTree;
use crate::report::DocumentReport;

#[derive(Parser)]
#[command(name = "hrefcheck", about = "Audit HTML document trees for broken and unsafe links")]
struct Cli {
    /// Root directory of the document tree to audit.
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Tolerate href="#" on anchors.
    #[arg(long)]
    allow_hash_href: bool,

    /// Tolerate anchors without an href attribute.
    #[arg(long)]
    allow_missing_href: bool,

    /// Audit integrity/crossorigin on external stylesheet links.
    #[arg(long)]
    check_sri: bool,

    /// Flag plain http:// references.
    #[arg(long)]
    enforce_https: bool,

    /// Output format: text or json.
    #[arg(long, default_value = "text")]
    format: String,

    /// Tolerate mailto: with an empty address.
    #[arg(long)]
    ignore_empty_mailto: bool,

    /// References matching this regex are skipped (repeatable).
    #[arg(long = "ignore-url", value_name = "REGEX")]
    ignore_urls: Vec<String>,

    /// Worker threads for external link resolution.
    #[arg(long, default_value_t = 8)]
    jobs: usize,

    /// Skip external link resolution.
    #[arg(long)]
    offline: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        },
    }
}

/// Scan, validate, resolve external links, and report.
///
/// # Errors
///
/// Returns errors from config loading, document scanning, or HTTP client
/// setup. Validation findings are never errors.
fn run(cli: &Cli) -> Result<ExitCode, error::Error> {
    if cli.format != "text" && cli.format != "json" {
        return Err(error::Error::UnknownFormat {
            format: cli.format.clone(),
        });
    }

    let policy = load_policy(cli)?;
    let documents = scanner::scan(&cli.root)?;
    let tree = DiskTree::new(&cli.root);
    let checker = Checker::new(&policy, &tree);

    let mut reports: Vec<DocumentReport> = documents
        .iter()
        .map(|document| {
            let result = checker.check_document(document);
            DocumentReport {
                diagnostics: result.diagnostics,
                path: document.path.clone(),
                pending: result.pending,
            }
        })
        .collect();

    if !cli.offline {
        let urls = report::dedup_pending_urls(&reports);
        let results = external::resolve(&urls, cli.jobs)?;
        report::attach_external_failures(&mut reports, &results);
    }

    if cli.format == "json" {
        println!("{}", report::render_json(&reports));
    } else {
        print!("{}", report::render_text(&reports));
    }

    Ok(report::exit_code(&reports))
}

/// Load the config-file policy and apply CLI overrides. Flags only enable;
/// the config file remains the place to express project defaults.
fn load_policy(cli: &Cli) -> Result<Policy, error::Error> {
    let mut policy = Policy::load(&cli.root)?.with_ignore_patterns(&cli.ignore_urls)?;

    policy.allow_hash_href |= cli.allow_hash_href;
    policy.allow_missing_href |= cli.allow_missing_href;
    policy.check_sri |= cli.check_sri;
    policy.enforce_https |= cli.enforce_https;
    policy.ignore_empty_mailto |= cli.ignore_empty_mailto;

    Ok(policy)
}
