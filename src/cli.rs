// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running a discovery pass against the host
//! - Parsing saved capability listings

use camera_inspector::backends::V4l2MediaDevices;
use camera_inspector::command::HostCommandRunner;
use camera_inspector::presentation::DeviceView;
use camera_inspector::{CapabilityTable, Config, DiscoveryEngine, ViewBoard, parse_capabilities};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Run a full discovery pass and print every device card
pub async fn scan(
    config: &Config,
    json: bool,
    details: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let board = Arc::new(ViewBoard::new());
    let engine = DiscoveryEngine::new(
        Arc::new(V4l2MediaDevices::new()),
        Arc::new(HostCommandRunner::new(config.elevation_command.clone())),
        board.clone(),
        config,
    );

    let mut discovery = engine.discover().await?;
    discovery.settle().await;

    if details {
        for card in discovery.cards() {
            card.toggle_details().await;
        }
    }

    let cards = board.cards();
    discovery.teardown();

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }

    if cards.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for card in &cards {
        print_card(card);
    }
    Ok(())
}

fn print_card(card: &DeviceView) {
    match &card.system_path {
        Some(path) => println!("  [{}] {} ({})", card.index, card.label, path),
        None => println!("  [{}] {} (no system device)", card.index, card.label),
    }

    if let Some(live) = &card.live_settings {
        let fps = live
            .frame_rate
            .map(|f| format!(" @ {:.2} fps", f))
            .unwrap_or_default();
        let fourcc = live
            .pixel_format
            .as_deref()
            .map(|p| format!(" ({})", p))
            .unwrap_or_default();
        println!(
            "      Live: {}x{}{}{}",
            live.width.unwrap_or_default(),
            live.height.unwrap_or_default(),
            fps,
            fourcc
        );
    }

    if let Some(table) = &card.capabilities {
        print_table(table, "      ");
    }

    for error in &card.errors {
        println!("      Error: {}", error);
    }

    if let Some(details) = &card.details {
        println!("      Details:");
        for line in details.lines() {
            println!("        {}", line);
        }
    }
    println!();
}

fn print_table(table: &CapabilityTable, indent: &str) {
    if table.is_empty() {
        println!("{}Formats: no data", indent);
        return;
    }

    println!("{}Formats:", indent);
    for (format, _) in table.formats() {
        let sizes: Vec<String> = table
            .resolutions_by_area(format)
            .into_iter()
            .map(|size| {
                let rates: Vec<String> = table
                    .frame_rates(format, size)
                    .unwrap_or_default()
                    .iter()
                    .map(|r| format!("{}", r))
                    .collect();
                format!("{} ({})", size, rates.join(", "))
            })
            .collect();
        println!("{}  {}: {}", indent, format, sizes.join(", "));
    }
}

/// Parse a saved capability listing and print the table
pub fn parse_listing(file: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let text = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };

    let table = parse_capabilities(&text);
    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        print_table(&table, "");
    }
    Ok(())
}
