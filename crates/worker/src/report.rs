use aitrader_core::domain::recommendation::Evaluation;
use aitrader_core::watchlist::{WatchlistEntry, WatchlistSnapshot};

/// One log line per ticker plus a summary line.
pub fn log_table(snapshot: &WatchlistSnapshot) {
    for entry in &snapshot.entries {
        tracing::info!("{}", format_row(entry));
    }

    let summary = snapshot.summary();
    tracing::info!(
        buy = summary.buy,
        hold = summary.hold,
        avoid = summary.avoid,
        unavailable = summary.unavailable,
        "watchlist summary"
    );
}

pub fn format_row(entry: &WatchlistEntry) -> String {
    match &entry.evaluation {
        Evaluation::Ready(rec) => format!(
            "{:<8} {:<6} price={:.2} ens={} mom={} sent={} swing={} sl={:.2} ({:.2}%) tp={:.2} ({:.2}%) earnings={} | {}",
            entry.ticker,
            rec.decision,
            rec.analytics.current_price,
            rec.scores.ensemble_score,
            rec.scores.momentum_score,
            rec.scores.sentiment_score,
            swing_text(rec.scores.swing_score),
            rec.risk.stop_loss_price,
            rec.risk.stop_loss_percent,
            rec.risk.take_profit_price,
            rec.risk.take_profit_percent,
            rec.signals.earnings_date_display(),
            rec.rationale,
        ),
        Evaluation::Unavailable(reason) => {
            format!("{:<8} {:<6} {}", entry.ticker, "N/A", reason)
        }
    }
}

fn swing_text(swing: Option<f64>) -> String {
    match swing {
        Some(v) => format!("{v:.1}"),
        None => "n/a".to_string(),
    }
}
