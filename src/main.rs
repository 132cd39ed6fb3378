//! Practice · terminal client for the coding-practice server
//!
//! - Lists questions with local success counts
//! - Executes code and runs test cases against the server
//! - Fetches hints and solutions
//!
//! Important env variables:
//!   PRACTICE_BASE_URL     : server origin (default "http://127.0.0.1:5000")
//!   PRACTICE_STATE_PATH   : JSON file with success counters and layout
//!   PRACTICE_CONFIG_PATH  : path to TOML config (see `config`)
//!   LOG_LEVEL             : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT            : "pretty" (default) or "json"

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, instrument, warn};

use practice_client::{
  domain::HintType,
  listing::Filter,
  telemetry,
  view::Node,
  ClientConfig, Workbench,
};

#[derive(Parser)]
#[command(name = "practice")]
#[command(about = "Practice coding questions against a practice server", long_about = None)]
struct Cli {
  /// Print HTML instead of plain text
  #[arg(long, global = true)]
  html: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// List questions with their success counts
  List {
    /// all, easy, medium or hard
    #[arg(short, long, default_value = "all")]
    filter: Filter,
  },

  /// Show one question
  Show { id: String },

  /// Syntax-check and execute a solution file
  Execute { id: String, file: PathBuf },

  /// Run the question's test cases against a solution file
  Run { id: String, file: PathBuf },

  /// Ask for a hint
  Hint {
    id: String,

    /// Code to send along with the request
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// general, specific or next_step
    #[arg(short, long, default_value = "general")]
    kind: HintType,
  },

  /// Reveal the reference solution
  Solution { id: String },

  /// Print the local success counters
  Progress,

  /// Inspect or change saved panel geometry
  Layout {
    #[command(subcommand)]
    action: LayoutAction,
  },
}

#[derive(Subcommand)]
enum LayoutAction {
  /// Print saved sizes
  Show,
  /// Save a panel height in pixels (minimum 100)
  Panel { panel: String, px: u32 },
  /// Save the sidebar width in pixels (clamped to 200-600)
  Sidebar { px: u32 },
}

fn emit(node: &Node, html: bool) {
  if html {
    println!("{}", node.to_html());
  } else {
    println!("{}", node.to_text());
  }
}

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();
  let cli = Cli::parse();

  let config = ClientConfig::from_env()?;
  let bench = Workbench::with_file_store(config)?;
  info!(target: "practice_client", state = %bench.config().state_path.display(), "Using local state");

  match cli.command {
    Commands::List { filter } => {
      let loaded = bench.load_questions().await;
      let view = bench.set_filter(filter).await;
      emit(&view.render(), cli.html);
      loaded?;
    }
    Commands::Show { id } => {
      bench.select_question(&id).await?;
      if let Some(view) = bench.question_view().await {
        emit(&view, cli.html);
      }
    }
    Commands::Execute { id, file } => {
      bench.select_question(&id).await?;
      bench.set_code(std::fs::read_to_string(&file)?).await;
      let submission = bench.submissions().compile_and_execute().await;
      emit(&submission.panel.render(), cli.html);
    }
    Commands::Run { id, file } => {
      if let Err(e) = bench.load_questions().await {
        warn!(target: "practice_client", error = %e, "Continuing without the question list");
      }
      bench.select_question(&id).await?;
      bench.set_code(std::fs::read_to_string(&file)?).await;
      let submission = bench.submissions().run_tests().await;
      emit(&submission.panel.render(), cli.html);
    }
    Commands::Hint { id, file, kind } => {
      bench.select_question(&id).await?;
      if let Some(file) = file {
        bench.set_code(std::fs::read_to_string(&file)?).await;
      }
      let panel = bench.hints().get_hint(kind).await?;
      emit(&panel.render(), cli.html);
    }
    Commands::Solution { id } => {
      bench.select_question(&id).await?;
      let panel = bench.hints().show_solution().await?;
      emit(&panel.render(), cli.html);
    }
    Commands::Progress => {
      let counts = bench.progress().all_counts_checked();
      if counts.is_corrupt() {
        eprintln!("warning: stored success counters are unreadable; showing none");
      }
      let mut counts: Vec<(String, u64)> = counts.into_inner().into_iter().collect();
      counts.sort();
      if counts.is_empty() {
        println!("No solved questions yet.");
      }
      for (id, count) in counts {
        println!("{id}\t{count}");
      }
    }
    Commands::Layout { action } => match action {
      LayoutAction::Show => {
        let layout = bench.layout();
        println!("sidebar\t{}", layout.sidebar_width.as_deref().unwrap_or("-"));
        for (panel, size) in layout.panels {
          println!("{panel}\t{size}");
        }
      }
      LayoutAction::Panel { panel, px } => {
        println!("{panel}\t{}", bench.progress().save_panel_height_px(&panel, px));
      }
      LayoutAction::Sidebar { px } => {
        println!("sidebar\t{}", bench.progress().save_sidebar_width_px(px));
      }
    },
  }

  Ok(())
}
