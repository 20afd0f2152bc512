//! Terminal rendering for the three workflow stages.
//!
//! Each stage prints as a vertical card: a `=== title ===` banner followed by
//! labelled sections. Pure line builders are kept separate from printing so
//! they can be tested.

use autoalign_core::{
    AlignedReport, Arena, Category, Message, Panel, Role, UploadRegistry,
};

const MAX_LIST_ITEMS: usize = 10;
const MAX_TITLE_CHARS: usize = 60;
const BAR_WIDTH: usize = 30;

// ── Ingestion ──

pub fn print_uploads(uploads: &UploadRegistry) {
    println!("=== Document Ingestion ===");
    println!();
    for category in Category::ALL {
        let files = uploads.files(category);
        println!("{} ({})", category.label(), files.len());
        for file in files.iter().take(MAX_LIST_ITEMS) {
            println!("  {:<40} {:>10}", truncate(file.name(), 40), file.size_label());
        }
        if files.len() > MAX_LIST_ITEMS {
            println!("  ... and {} more", files.len() - MAX_LIST_ITEMS);
        }
        println!();
    }
    if !uploads.is_empty() {
        println!("Ready for Analysis");
        println!("  {:<26} {}", "knowledge base files", uploads.count(Category::Knowledge));
        println!("  {:<26} {}", "new requirements", uploads.count(Category::Requirement));
        println!();
    }
}

// ── Debate ──

/// Overwrite the current stderr line with the turn-alternation state.
pub fn print_turn(arena: &Arena<'_>) {
    eprint!("\r  {}", turn_line(arena));
}

pub fn print_arena(arena: &Arena<'_>) {
    println!("=== Agentic Debate Arena ===");
    println!();

    println!("Defender Agent - identifies violations and compliance issues");
    for line in panel_lines(&arena.defender, Role::Defender) {
        println!("{line}");
    }
    println!();

    println!("Drafter Agent - proposes compliant solutions");
    for line in panel_lines(&arena.drafter, Role::Drafter) {
        println!("{line}");
    }
    println!();

    let p = &arena.progress;
    println!("Debate Progress");
    println!(
        "  {:<26} {} of {}",
        "round", p.current_round, p.total_rounds
    );
    println!(
        "  {:<26} {} {:.0}%",
        "progress",
        progress_bar(p.percent_complete, BAR_WIDTH),
        p.percent_complete
    );
    println!("  {:<26} {}", "violations found", p.violations);
    println!("  {:<26} {}", "resolutions", p.resolutions);
    let (headline, detail) = p.status();
    println!("  {:<26} {} ({})", "status", headline, detail);
    println!();

    println!("Debate Summary");
    println!("  {}", arena.summary);
    println!();
}

pub fn turn_line(arena: &Arena<'_>) -> String {
    let turn = &arena.turn;
    let (left, right) = match turn.focus {
        Role::Defender => ("[Defender]", " Drafter "),
        Role::Drafter => (" Defender ", "[Drafter]"),
    };
    let arrow = match turn.focus {
        Role::Defender => "<====",
        Role::Drafter => "====>",
    };
    let status = if turn.debating {
        "Agents Debating..."
    } else {
        "Debate settled"
    };
    format!("Round {}  {left} {arrow} {right}  {status}", turn.round)
}

pub fn panel_lines(panel: &Panel<'_>, role: Role) -> Vec<String> {
    match panel {
        Panel::Loading => vec![format!("  {}", loading_text(role))],
        Panel::NoViolations => vec!["  No violations found.".to_string()],
        Panel::Failed(err) => vec![format!("  Alignment failed: {err}")],
        Panel::Messages(messages) if messages.is_empty() => vec!["  (no messages)".to_string()],
        Panel::Messages(messages) => {
            let mut lines = Vec::new();
            for m in messages.iter().take(MAX_LIST_ITEMS) {
                lines.extend(message_card(m));
            }
            if messages.len() > MAX_LIST_ITEMS {
                lines.push(format!("  ... and {} more", messages.len() - MAX_LIST_ITEMS));
            }
            lines
        }
    }
}

fn loading_text(role: Role) -> &'static str {
    match role {
        Role::Defender => "Analyzing policies...",
        Role::Drafter => "Generating solutions...",
    }
}

fn message_card(m: &Message) -> Vec<String> {
    vec![
        format!(
            "  {:<44} [{}] {}",
            truncate(&m.title, MAX_TITLE_CHARS),
            m.severity,
            m.created_at.format("%H:%M")
        ),
        format!("    {}", m.body),
        format!("    * {}", m.status_label()),
    ]
}

// ── Output ──

pub fn print_report(report: &AlignedReport) {
    println!("=== Aligned Output ===");
    println!();
    println!("Compliance Score");
    println!(
        "  {:<26} {}% ({} Compliance)",
        "score",
        report.compliance_percent,
        report.band.label()
    );
    println!("  {:<26} {}", "status", report.status);
    println!("  {:<26} {}", "summary", report.summary);
    println!("  {:<26} {}", "rounds used", report.rounds_used);
    println!();

    println!("Resolution Summary ({})", report.resolutions.len());
    for f in report.resolutions.iter().take(MAX_LIST_ITEMS) {
        println!("  {:<44} [{}]", truncate(&f.title, MAX_TITLE_CHARS), f.severity);
        println!("    {}", f.body);
    }
    if report.resolutions.len() > MAX_LIST_ITEMS {
        println!("  ... and {} more", report.resolutions.len() - MAX_LIST_ITEMS);
    }
    println!();
}

// ── Helpers ──

/// Fixed-width bar, e.g. `[######----]`.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Shorten to `max` characters, ending in `...` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
