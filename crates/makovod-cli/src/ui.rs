//! Interactive selection and result printing

use dialoguer::Select;
use makovod_core::{CatalogItem, Chooser, NameRefreshReport, Navigation, Stage};

/// Terminal menu backed by `dialoguer`
pub struct MenuChooser;

impl Chooser for MenuChooser {
    fn choose(&mut self, stage: Stage, items: &[CatalogItem]) -> Option<usize> {
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        // Esc, q, Ctrl-C in raw mode or a broken terminal all mean "stop here"
        blocking(|| {
            Select::new()
                .with_prompt(format!("Select a {}", stage))
                .items(&names)
                .default(0)
                .interact_opt()
                .ok()
                .flatten()
        })
    }
}

/// Runs a blocking terminal call without stalling the runtime's other tasks
///
/// Needs the multi-threaded runtime.
pub fn blocking<T>(f: impl FnOnce() -> T) -> T {
    tokio::task::block_in_place(f)
}

pub fn print_report(report: &NameRefreshReport) {
    println!(
        "Show names: {} from cache, {} fetched, {} failed, {} deferred",
        report.from_cache, report.fetched, report.failed, report.skipped
    );
    if report.interrupted {
        println!("Interrupted - progress saved");
    }
}

pub fn print_outcome(outcome: &Navigation) {
    match outcome {
        Navigation::Resolved { episode, playback } => {
            println!("\nFetching video for: {}", episode.name);
            println!("\n--- PLAYABLE URL ---");
            println!("{}", playback.url);
            if !playback.ticketed {
                println!("(no entitlement ticket; playback may be refused)");
            }
        }
        Navigation::NothingFound(Stage::Show) => println!("No shows found."),
        Navigation::NothingFound(stage) => println!("No {}s found.", stage),
        Navigation::Cancelled(_) => println!("Cancelled."),
        Navigation::Failed { episode, reason } => {
            println!("\nFailed to get video URL for {}: {}", episode.name, reason);
        }
    }
}
