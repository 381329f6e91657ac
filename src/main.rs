use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use vdom_hunter::config;
use vdom_hunter::hunter::result::ingest;
use vdom_hunter::page::{MockPage, MockUi, OverlayBox};
use vdom_hunter::pipeline::Pipeline;
use vdom_hunter::settings::Settings;

/// VDOM Hunter - external page-analyzer pipeline harness
#[derive(Parser, Debug)]
#[command(
    name = "vdom-hunter",
    about = "Export a page structure, run an external analyzer on it, ingest and apply its findings",
    after_help = "ENVIRONMENT VARIABLES:\n\
        VDOM_HUNTER_SETTINGS       Persisted settings file path\n\
        VDOM_HUNTER_ANALYZER       Default analyzer executable path\n\
        VDOM_HUNTER_DUMP           Default VDOM dump file path\n\
        VDOM_HUNTER_URL_FILE       Default URL list file path\n\
        VDOM_HUNTER_WAIT_TIMEOUT   Analyzer wait timeout (seconds)"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline on a page-structure file
    Run {
        /// File holding the serialized page structure to analyze
        #[arg(short, long)]
        page: PathBuf,

        /// Analyzer executable (invoked with the dump path as its argument)
        #[arg(short, long, env = "VDOM_HUNTER_ANALYZER")]
        analyzer: String,

        /// Dump file path (result file is expected at <dump>.res)
        #[arg(short, long, env = "VDOM_HUNTER_DUMP", default_value = config::DEFAULT_DUMP_PATH)]
        dump: String,

        /// Seconds to wait for the analyzer to exit
        #[arg(short, long, env = "VDOM_HUNTER_WAIT_TIMEOUT", default_value_t = config::DEFAULT_WAIT_TIMEOUT)]
        timeout: u64,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Iterate a URL list through the pipeline entry point (robot mode)
    Robot {
        /// URL list file, one URL per line
        #[arg(short, long, env = "VDOM_HUNTER_URL_FILE")]
        file: PathBuf,

        /// Persisted settings file (cursor survives between invocations)
        #[arg(short, long, env = "VDOM_HUNTER_SETTINGS", default_value = config::DEFAULT_SETTINGS_PATH)]
        settings: PathBuf,

        /// Number of URLs to visit (default: one full pass over the list)
        #[arg(short, long)]
        count: Option<usize>,

        /// Analyzer executable; when given, each visit runs the pipeline
        #[arg(short, long, env = "VDOM_HUNTER_ANALYZER")]
        analyzer: Option<String>,

        /// Dump file path used when the analyzer runs
        #[arg(short, long, env = "VDOM_HUNTER_DUMP", default_value = config::DEFAULT_DUMP_PATH)]
        dump: String,

        /// Seconds to wait for each analyzer run
        #[arg(short, long, env = "VDOM_HUNTER_WAIT_TIMEOUT", default_value_t = config::DEFAULT_WAIT_TIMEOUT)]
        timeout: u64,
    },

    /// Parse and validate an analyzer result file
    Ingest {
        /// Result file to read
        #[arg(short, long)]
        result: PathBuf,

        /// Output the typed projection as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or edit persisted settings
    Config {
        /// Persisted settings file
        #[arg(short, long, env = "VDOM_HUNTER_SETTINGS", default_value = config::DEFAULT_SETTINGS_PATH)]
        settings: PathBuf,

        #[arg(long)]
        analyzer_enabled: Option<bool>,

        #[arg(long)]
        analyzer_path: Option<String>,

        #[arg(long)]
        dump_path: Option<String>,

        #[arg(long)]
        iterator_enabled: Option<bool>,

        #[arg(long)]
        iterator_file: Option<String>,
    },
}

/// Machine-readable summary of one pipeline run
#[derive(Serialize)]
struct RunReport<'a> {
    success: bool,
    started_at: Option<DateTime<Utc>>,
    program: Option<&'a str>,
    overlays: &'a [OverlayBox],
    summary: &'a str,
    scroll: Option<(i64, i64)>,
    status: Option<&'a str>,
    stdout: &'a str,
    stderr: &'a str,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command {
        Some(Commands::Run {
            page,
            analyzer,
            dump,
            timeout,
            json,
        }) => {
            let structure = std::fs::read(&page)?;
            let mut page = MockPage::with_structure(structure);
            let mut ui = MockUi::new();

            let mut pipeline = Pipeline::new(Settings {
                analyzer_enabled: true,
                analyzer_path: analyzer,
                dump_path: dump,
                ..Settings::default()
            });

            pipeline.run_now(&page, &mut ui)?;
            let annotation =
                pipeline.wait_and_annotate(&mut page, &mut ui, Duration::from_secs(timeout))?;

            let report = RunReport {
                success: annotation.is_some(),
                started_at: pipeline.analyzer().started_at(),
                program: ui.program_label.as_deref(),
                overlays: page.overlays(),
                summary: &ui.page_info,
                scroll: page.scroll_pos(),
                status: ui.last_status(),
                stdout: pipeline.analyzer().stdout(),
                stderr: pipeline.analyzer().stderr(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if let Some(annotation) = annotation {
                println!(
                    "Annotated: {} overlay(s), {} hover binding(s)",
                    annotation.overlay_count(),
                    annotation.bindings().len()
                );
                if let Some(program) = &report.program {
                    println!("  Analyzer: {}", program);
                }
                if !report.summary.is_empty() {
                    println!("  Summary: {}", report.summary);
                }
                if let Some((x, y)) = report.scroll {
                    println!("  Scrolled to: ({}, {})", x, y);
                }
            } else {
                println!("Run finished without annotation");
                if let Some(status) = report.status {
                    println!("  {}", status);
                }
            }
        }

        Some(Commands::Robot {
            file,
            settings,
            count,
            analyzer,
            dump,
            timeout,
        }) => {
            let mut stored = Settings::load(&settings)?;
            stored.iterator_enabled = true;
            stored.iterator_file = file.to_string_lossy().into_owned();
            if let Some(analyzer) = analyzer {
                stored.analyzer_enabled = true;
                stored.analyzer_path = analyzer;
                stored.dump_path = dump;
            }

            let mut pipeline = Pipeline::new(stored);
            let total = pipeline.reload_urls()?;
            let visits = count.unwrap_or(total);
            println!("URL list: {} entries, cursor at {}", total, pipeline.urls().cur());

            let mut ui = MockUi::new();
            for _ in 0..visits {
                let Some(url) = pipeline.next_url() else {
                    break;
                };
                println!("Visiting {}", url);

                // Stand-in for the real page load; the analyzer sees the
                // URL line as the page structure.
                let mut page = MockPage::with_structure(url.into_bytes());
                if pipeline.settings().analyzer_enabled {
                    match pipeline.page_load_finished(&page, &mut ui) {
                        Ok(true) => {
                            let annotation = pipeline.wait_and_annotate(
                                &mut page,
                                &mut ui,
                                Duration::from_secs(timeout),
                            )?;
                            match annotation {
                                Some(a) => println!("  {} overlay(s)", a.overlay_count()),
                                None => {
                                    if let Some(status) = ui.last_status() {
                                        println!("  {}", status);
                                    }
                                }
                            }
                        }
                        Ok(false) => {}
                        Err(err) => eprintln!("Warning: {}", err),
                    }
                }
            }

            pipeline.save_settings(&settings)?;
            println!("Cursor saved at {}", pipeline.urls().cur());
        }

        Some(Commands::Ingest { result, json }) => {
            let parsed = ingest(&result)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&parsed)?);
            } else {
                println!(
                    "Parsed result: program={}, {} group(s), {} item(s)",
                    parsed.program.as_deref().unwrap_or("(none)"),
                    parsed.groups.len(),
                    parsed.item_count()
                );
                if let Some(jump) = parsed.jump_to {
                    println!("  Jump to: ({}, {})", jump.x, jump.y);
                }
                if let Some(summary) = &parsed.summary {
                    println!("  Summary: {}", summary);
                }
            }
        }

        Some(Commands::Config {
            settings,
            analyzer_enabled,
            analyzer_path,
            dump_path,
            iterator_enabled,
            iterator_file,
        }) => {
            let mut stored = Settings::load(&settings)?;
            let editing = analyzer_enabled.is_some()
                || analyzer_path.is_some()
                || dump_path.is_some()
                || iterator_enabled.is_some()
                || iterator_file.is_some();

            if let Some(enabled) = analyzer_enabled {
                stored.analyzer_enabled = enabled;
            }
            if let Some(path) = analyzer_path {
                stored.analyzer_path = path;
            }
            if let Some(path) = dump_path {
                stored.dump_path = path;
            }
            if let Some(enabled) = iterator_enabled {
                stored.iterator_enabled = enabled;
            }
            if let Some(path) = iterator_file {
                stored.iterator_file = path;
            }

            if editing {
                stored.save(&settings)?;
            }
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }

        None => {
            println!("VDOM Hunter - external page-analyzer pipeline harness");
            println!();
            println!("Usage: vdom-hunter <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run     Run the full pipeline on a page-structure file");
            println!("  robot   Iterate a URL list through the pipeline");
            println!("  ingest  Parse and validate an analyzer result file");
            println!("  config  Show or edit persisted settings");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}
