#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use chrono::Datelike;
    use portfolio_enhance::{logging::LogLevel, report};

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: portfolio-enhance <page.html> (build for wasm32 to run in a browser)")?;
    let html = std::fs::read_to_string(&path)
        .map_err(|error| format!("failed to read {path}: {error}"))?;

    let report = report::hook_report(&html, chrono::Local::now().year(), Some(LogLevel::Debug));
    for (feature, attached) in &report.features {
        let status = if *attached { "attached" } else { "missing" };
        println!("{feature:<18} {status}");
    }
    println!(
        "{} of {} observed elements revealed, {} timers pending",
        report.revealed, report.observed, report.pending_timers
    );
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    portfolio_enhance::browser::run();
}
