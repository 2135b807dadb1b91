//! Console output: status lines, the package info table and download
//! progress.

use std::io::Write;

use crossterm::style::Stylize;

use crate::ops::reconcile::UpdatePlan;
use crate::types::DownloadTicket;

const NAME_WIDTH: usize = 50;
const CODE_WIDTH: usize = 20;
const VERSION_WIDTH: usize = 20;
const PROGRESS_BAR_WIDTH: usize = 24;

pub fn info(msg: &str) {
    println!("{msg}");
}

pub fn success(msg: &str) {
    println!("{}", msg.green());
}

pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Announce one pending update.
pub fn update_notice(ticket: &DownloadTicket) {
    warning(&format!(
        "Apk file {} should be updated to version {}",
        ticket.name, ticket.version
    ));
}

/// Render the reconciliation result: pending updates first, then the
/// records that are already current.
pub fn show_plan(plan: &UpdatePlan) {
    println!(
        "{}",
        format!(
            "{:<NAME_WIDTH$}{:<CODE_WIDTH$}{:<VERSION_WIDTH$}{}",
            "name", "code", "version", "size"
        )
        .red()
    );
    if !plan.tickets.is_empty() {
        success("Updated packages:");
        for ticket in &plan.tickets {
            println!(
                "{}",
                format!(
                    "{:<NAME_WIDTH$}{:<CODE_WIDTH$}{:<VERSION_WIDTH$}{}",
                    ticket.name,
                    ticket.code,
                    ticket.version,
                    format_size(ticket.size)
                )
                .green()
            );
        }
    }
    if !plan.unchanged.is_empty() {
        println!("{}", "Current packages:".red());
        for record in &plan.unchanged {
            println!(
                "{}",
                format!(
                    "{:<NAME_WIDTH$}{:<CODE_WIDTH$}{:<VERSION_WIDTH$}{}",
                    record.name,
                    record.code,
                    record.version,
                    format_size(record.size)
                )
                .yellow()
            );
        }
    }
}

/// Single-line download progress, redrawn in place.
#[derive(Debug)]
pub struct DownloadProgress {
    name: String,
    total: u64,
}

impl DownloadProgress {
    pub fn start(name: &str, total: u64) -> Self {
        Self {
            name: name.to_string(),
            total,
        }
    }

    pub fn update(&self, current: u64) {
        print!(
            "\r  {} {}",
            self.name,
            format_download_progress(current, self.total)
        );
        let _ = std::io::stdout().flush();
    }

    pub fn finish(&self) {
        println!();
    }
}

/// Format download progress: bar, percentage and declared size.
pub fn format_download_progress(current: u64, total: u64) -> String {
    let pct = if total > 0 {
        (current * 100 / total).min(100)
    } else {
        0
    };
    let bar = format_progress_bar(current, total, PROGRESS_BAR_WIDTH);
    format!("{bar}  {pct:>3}%  {}", format_size(total))
}

/// Format a progress bar using ▓ (filled) and ░ (empty).
pub fn format_progress_bar(current: u64, total: u64, width: usize) -> String {
    let filled = if total > 0 {
        (((current as f64 / total as f64) * width as f64).round() as usize).min(width)
    } else {
        0
    };
    let empty = width.saturating_sub(filled);
    format!("{}{}", "▓".repeat(filled), "░".repeat(empty))
}

/// Format bytes as human readable.
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.1} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
