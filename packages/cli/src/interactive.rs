#![allow(clippy::module_name_repetitions)]

//! Interactive menu for the `statline` binary.
//!
//! Provides a menu-driven interface using `dialoguer` for looking up
//! regions and browsing statistics without memorizing CLI flags.

use std::path::Path;

use dialoguer::{Confirm, Input, Select};
use statline_cli_utils::MultiProgress;
use statline_query::QueryFacade;
use statline_query_models::YearSelection;
use statline_region_models::{Region, RegionCode, RegionSummary};

use crate::output;

/// Top-level actions available in the interactive menu.
enum Action {
    ShowStatistics,
    BrowseHierarchy,
    SearchRegions,
    Validate,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::ShowStatistics,
        Self::BrowseHierarchy,
        Self::SearchRegions,
        Self::Validate,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::ShowStatistics => "Show statistics for a region",
            Self::BrowseHierarchy => "Browse the region hierarchy",
            Self::SearchRegions => "Search region names",
            Self::Validate => "Show loaded datasets",
            Self::Quit => "Quit",
        }
    }
}

/// Loads the configured datasets, then runs the menu loop until the user
/// quits.
///
/// # Errors
///
/// Returns an error if loading fails or a prompt cannot be shown.
pub fn run(multi: &MultiProgress, config: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Statline Explorer");
    println!();

    let facade = crate::load_facade(multi, config)?;
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    loop {
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::ShowStatistics => {
                if let Some(region) = pick_region(&facade)? {
                    show_statistics(&facade, &region)?;
                }
            }
            Action::BrowseHierarchy => browse(&facade)?,
            Action::SearchRegions => {
                let text: String = Input::new().with_prompt("Search text").interact_text()?;
                output::print_regions(facade.search(&text, 20).iter().map(RegionSummary::from));
            }
            Action::Validate => output::print_validation(&facade),
            Action::Quit => break,
        }
        println!();
    }

    Ok(())
}

/// Asks for a code or a name; names go through the search index.
fn pick_region(facade: &QueryFacade) -> Result<Option<Region>, Box<dyn std::error::Error>> {
    let text: String = Input::new()
        .with_prompt("Region code or name")
        .interact_text()?;

    if RegionCode::parse(&text).is_ok()
        && let Ok(region) = facade.hierarchy().resolve(&text)
    {
        return Ok(Some(region.clone()));
    }

    let matches = facade.search(&text, 15);
    if matches.is_empty() {
        println!("No regions match '{text}'.");
        return Ok(None);
    }

    let labels: Vec<String> = matches
        .iter()
        .map(|r| format!("{} ({}, {})", r.name, r.level, r.code))
        .collect();
    let idx = Select::new()
        .with_prompt("Select a region")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(matches.into_iter().nth(idx))
}

/// Walks the hierarchy from the National root via child/parent hops.
fn browse(facade: &QueryFacade) -> Result<(), Box<dyn std::error::Error>> {
    let hierarchy = facade.hierarchy();
    let mut current = hierarchy.root().clone();

    loop {
        let children = hierarchy.children(current.code.as_str())?;
        let parent = current.parent.as_ref().and_then(|p| hierarchy.get(p));

        let mut labels = vec![format!("Show statistics for {}", current.name)];
        labels.extend(
            children
                .iter()
                .map(|c| format!("  {} ({})", c.name, c.code)),
        );
        if let Some(parent) = parent {
            labels.push(format!("Up to {}", parent.name));
        }
        labels.push("Back to menu".to_string());

        let idx = Select::new()
            .with_prompt(format!("{} ({})", current.name, current.level))
            .items(&labels)
            .default(0)
            .max_length(20)
            .interact()?;

        if idx == 0 {
            show_statistics(facade, &current)?;
        } else if let Some(child) = children.get(idx - 1) {
            current = (*child).clone();
        } else if let Some(parent) = parent
            && idx == children.len() + 1
        {
            current = parent.clone();
        } else {
            return Ok(());
        }
    }
}

/// Prompts for a year or range and prints the bundle summary.
fn show_statistics(
    facade: &QueryFacade,
    region: &Region,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(coverage) = facade.coverage() else {
        println!("No datasets are loaded.");
        return Ok(());
    };

    let range = Select::new()
        .with_prompt("Period")
        .items(&["Single year", "Year range"])
        .default(0)
        .interact()?
        == 1;

    let selection = if range {
        let start: i32 = Input::new()
            .with_prompt(format!("From year ({coverage})"))
            .default(coverage.first_year)
            .interact_text()?;
        let end: i32 = Input::new()
            .with_prompt(format!("To year ({coverage})"))
            .default(coverage.last_year)
            .interact_text()?;
        YearSelection::Range { start, end }
    } else {
        let year: i32 = Input::new()
            .with_prompt(format!("Year ({coverage})"))
            .default(coverage.last_year)
            .interact_text()?;
        YearSelection::Single { year }
    };

    match facade.query(region.code.as_str(), selection) {
        Ok(bundle) => {
            output::print_bundle_summary(&bundle);
            let json = Confirm::new()
                .with_prompt("Print the full JSON bundle?")
                .default(false)
                .interact()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&bundle)?);
            }
        }
        Err(e) => println!("{e}"),
    }

    Ok(())
}
